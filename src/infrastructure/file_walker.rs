use anyhow::{Context, Result};
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Collects the source files of a directory tree in a stable depth-first order.
pub struct SourceWalker {
    extension: String,
}

impl SourceWalker {
    /// `extension` may be given with or without the leading dot (`.java` or `java`).
    pub fn new(extension: &str) -> Self {
        Self {
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    /// All matching files below `root`, directories visited in lexical order.
    /// `root` may also be a single file.
    pub fn collect(&self, root: &Path) -> Result<Vec<PathBuf>> {
        if !root.exists() {
            anyhow::bail!("Source path not found: {}", root.display());
        }
        let mut files = Vec::new();
        self.collect_recursive(root, &mut files)?;
        Ok(files)
    }

    fn collect_recursive(&self, path: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
        if path.is_file() {
            if self.matches(path) {
                out.push(path.to_path_buf());
            }
            return Ok(());
        }

        let mut entries = fs::read_dir(path)
            .with_context(|| format!("Failed to read directory {}", path.display()))?
            .collect::<std::io::Result<Vec<_>>>()
            .with_context(|| format!("Failed to list directory {}", path.display()))?;
        entries.sort_by_key(|entry| entry.file_name());

        for entry in entries {
            let child = entry.path();
            if child.is_dir() {
                // .git, .gradle, .idea ...
                if entry.file_name().to_string_lossy().starts_with('.') {
                    continue;
                }
                self.collect_recursive(&child, out)?;
            } else if self.matches(&child) {
                out.push(child);
            }
        }
        Ok(())
    }

    fn matches(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext == self.extension)
    }
}

/// `file` relative to `root`, `/`-separated. Files outside `root` keep their full path.
pub fn relative_source_path(root: &Path, file: &Path) -> String {
    let relative = file.strip_prefix(root).unwrap_or(file);
    relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            Component::RootDir => Some(String::new()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
