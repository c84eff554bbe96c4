//! A single child yielded while enumerating a directory's index.

use crate::domain::entities::MftReference;

/// One name/reference pair surfaced by the directory resolver while
/// walking `$INDEX_ROOT`/`$INDEX_ALLOCATION`. Multiple entries may refer
/// to the same record (an 8.3 short name and a long name); callers apply
/// [`crate::domain::services::naming::prefer`] to pick one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub name: String,
    pub reference: MftReference,
    pub is_directory: bool,
}

impl DirectoryEntry {
    pub fn new(name: String, reference: MftReference, is_directory: bool) -> Self {
        Self {
            name,
            reference,
            is_directory,
        }
    }
}
