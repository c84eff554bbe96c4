//! Persistence contract for the path cache tree.
//!
//! Kept separate from `PathCacheNode` itself (which is pure domain
//! data) the same way the teacher splits `RecoveredFileWriter` (the
//! trait) from `LocalFileWriter` (the concrete implementation): the
//! tree's shape is domain, the on-disk framing is infrastructure.

use crate::domain::entities::PathCacheNode;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PathCacheStoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt cache file: {0}")]
    Corrupt(String),
}

pub trait PathCacheStore: Send + Sync {
    /// Loads the saved tree for `drive` from `path`. Absence of the file
    /// (or of an entry for this drive within it) yields a fresh empty
    /// root rather than an error.
    fn load(&self, path: &Path, drive: &str) -> Result<PathCacheNode, PathCacheStoreError>;

    /// Persists `tree` for `drive` into `path`, replacing any prior
    /// entry for the same drive.
    fn save(
        &self,
        path: &Path,
        drive: &str,
        tree: &PathCacheNode,
    ) -> Result<(), PathCacheStoreError>;
}
