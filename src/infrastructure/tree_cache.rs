/// Tree Cache
///
/// Persists trees returned by another [`TreeSource`] in a sled database so
/// re-runs over an unchanged checkout skip the parsing service.
///
/// Entries are keyed by source path and validated against the source file's
/// modification time and size; any mismatch is a miss and the entry is replaced.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::SystemTime;
use tracing::{debug, warn};

use crate::domain::uast::Node;
use crate::error::TreeSourceError;
use crate::ports::TreeSource;

/// Entry layout version; bump when `CacheEntry` or the tree encoding changes.
const CACHE_VERSION: u32 = 1;
const TREES: &str = "trees";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct Fingerprint {
    modified_nanos: u64,
    size: u64,
}

impl Fingerprint {
    fn of(path: &Path) -> Option<Self> {
        let metadata = std::fs::metadata(path).ok()?;
        let modified = metadata
            .modified()
            .ok()?
            .duration_since(SystemTime::UNIX_EPOCH)
            .ok()?;
        Some(Self {
            modified_nanos: modified.as_nanos() as u64,
            size: metadata.len(),
        })
    }
}

// The tree itself stays JSON: its serde attributes accept several field
// spellings, which bincode's positional format cannot represent.
#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    version: u32,
    fingerprint: Fingerprint,
    tree_json: Vec<u8>,
}

pub struct CachingTreeSource<S> {
    inner: S,
    db: sled::Db,
    trees: sled::Tree,
}

fn cache_error(error: impl std::fmt::Display) -> TreeSourceError {
    TreeSourceError::Cache(error.to_string())
}

impl<S: TreeSource> CachingTreeSource<S> {
    pub fn open(inner: S, cache_dir: &Path) -> Result<Self, TreeSourceError> {
        let db = sled::open(cache_dir).map_err(cache_error)?;
        let trees = db.open_tree(TREES).map_err(cache_error)?;
        Ok(Self { inner, db, trees })
    }

    /// Number of cached trees.
    pub fn len(&self) -> usize {
        self.trees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    pub fn flush(&self) -> Result<(), TreeSourceError> {
        self.db.flush().map(|_| ()).map_err(cache_error)
    }

    fn lookup(&self, key: &[u8], fingerprint: Fingerprint) -> Option<Node> {
        let bytes = self.trees.get(key).ok().flatten()?;
        let entry: CacheEntry = bincode::deserialize(&bytes).ok()?;
        if entry.version != CACHE_VERSION || entry.fingerprint != fingerprint {
            return None;
        }
        Node::from_json_slice(&entry.tree_json).ok()
    }

    fn store(&self, key: &[u8], fingerprint: Fingerprint, tree: &Node) -> Result<(), TreeSourceError> {
        let entry = CacheEntry {
            version: CACHE_VERSION,
            fingerprint,
            tree_json: serde_json::to_vec(tree).map_err(cache_error)?,
        };
        let bytes = bincode::serialize(&entry).map_err(cache_error)?;
        self.trees.insert(key, bytes).map_err(cache_error)?;
        Ok(())
    }
}

impl<S: TreeSource> TreeSource for CachingTreeSource<S> {
    fn acquire(&self, path: &Path) -> Result<Node, TreeSourceError> {
        let key = path.to_string_lossy();
        let fingerprint = Fingerprint::of(path);

        if let Some(fingerprint) = fingerprint {
            if let Some(tree) = self.lookup(key.as_bytes(), fingerprint) {
                debug!(path = %path.display(), "tree cache hit");
                return Ok(tree);
            }
        }

        let tree = self.inner.acquire(path)?;
        if let Some(fingerprint) = fingerprint {
            if let Err(error) = self.store(key.as_bytes(), fingerprint, &tree) {
                warn!(path = %path.display(), %error, "failed to cache tree");
            }
        }
        Ok(tree)
    }
}
