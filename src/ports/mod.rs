use crate::domain::setting::SettingRecord;
use crate::domain::uast::Node;
use crate::error::TreeSourceError;
use std::io::Write;
use std::path::Path;

/// Produces the syntax tree of a source file. One call per file; a failure
/// only concerns that file.
pub trait TreeSource: Send + Sync {
    fn acquire(&self, path: &Path) -> Result<Node, TreeSourceError>;
}

impl<T: TreeSource + ?Sized> TreeSource for Box<T> {
    fn acquire(&self, path: &Path) -> Result<Node, TreeSourceError> {
        (**self).acquire(path)
    }
}

pub trait RecordExporter {
    fn write(&self, records: &[SettingRecord], out: &mut dyn Write) -> std::io::Result<()>;

    /// Write to `path`, or to stdout when `path` is `-`.
    fn export(&self, records: &[SettingRecord], path: &str) -> std::io::Result<()> {
        if path == "-" {
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            self.write(records, &mut lock)?;
            return lock.flush();
        }
        let mut file = std::io::BufWriter::new(std::fs::File::create(path)?);
        self.write(records, &mut file)?;
        file.flush()
    }
}
