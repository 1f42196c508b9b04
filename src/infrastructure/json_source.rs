/// JSON Tree Source
///
/// Reads trees that the parsing service exported ahead of time as JSON.
/// Layouts:
/// - sidecar: `Foo.java` -> `Foo.java.json` next to the source
/// - mirrored: `<root>/a/Foo.java` -> `<tree_dir>/a/Foo.java.json`

use memmap2::Mmap;
use std::ffi::OsString;
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::domain::uast::Node;
use crate::error::TreeSourceError;
use crate::ports::TreeSource;

const TREE_SUFFIX: &str = ".json";

pub struct JsonTreeSource {
    layout: Layout,
}

enum Layout {
    Sidecar,
    Mirrored { root: PathBuf, tree_dir: PathBuf },
}

impl JsonTreeSource {
    pub fn sidecar() -> Self {
        Self {
            layout: Layout::Sidecar,
        }
    }

    pub fn mirrored(root: &Path, tree_dir: &Path) -> Self {
        Self {
            layout: Layout::Mirrored {
                root: root.to_path_buf(),
                tree_dir: tree_dir.to_path_buf(),
            },
        }
    }

    /// Location of the exported tree for `source`.
    pub fn tree_path(&self, source: &Path) -> PathBuf {
        let base = match &self.layout {
            Layout::Sidecar => source.to_path_buf(),
            Layout::Mirrored { root, tree_dir } => {
                let relative = source.strip_prefix(root).unwrap_or(source);
                if relative.is_absolute() {
                    // Outside the root: keep the tree next to the source.
                    source.to_path_buf()
                } else {
                    tree_dir.join(relative)
                }
            }
        };
        let mut name: OsString = base.into_os_string();
        name.push(TREE_SUFFIX);
        PathBuf::from(name)
    }
}

/// Decode a tree file. Files are memory-mapped since exported trees of large
/// sources run into megabytes.
pub fn read_tree_file(path: &Path) -> Result<Node, TreeSourceError> {
    let io_error = |source| TreeSourceError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(io_error)?;
    let len = file.metadata().map_err(io_error)?.len();

    let decoded = if len == 0 {
        Node::from_json_slice(&[])
    } else {
        // SAFETY: the map is read-only and dropped before returning; exported
        // trees are not rewritten while a run is in progress.
        let mmap = unsafe { Mmap::map(&file) }.map_err(io_error)?;
        Node::from_json_slice(&mmap)
    };

    decoded.map_err(|source| TreeSourceError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

impl TreeSource for JsonTreeSource {
    fn acquire(&self, path: &Path) -> Result<Node, TreeSourceError> {
        read_tree_file(&self.tree_path(path))
    }
}
