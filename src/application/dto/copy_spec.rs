//! Copy specification DTO

/// A single copy request handed to [`crate::application::CopyFilesUseCase`].
#[derive(Debug, Clone)]
pub struct CopySpec {
    /// Source pattern, e.g. `C:\Users\*\ntuser.dat`. May name a drive
    /// with `*` to expand across every enumerated volume.
    pub source_pattern: String,
    /// Destination root; the source path is mirrored underneath it.
    pub destination_root: std::path::PathBuf,
    /// When the resolved source is a directory, copy its children too.
    pub recursive: bool,
    /// Skip the persistent path cache for this request (no lookup,
    /// no save).
    pub ignore_cache: bool,
}

impl CopySpec {
    pub fn new(source_pattern: impl Into<String>, destination_root: impl Into<std::path::PathBuf>) -> Self {
        Self {
            source_pattern: source_pattern.into(),
            destination_root: destination_root.into(),
            recursive: false,
            ignore_cache: false,
        }
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn ignore_cache(mut self, ignore_cache: bool) -> Self {
        self.ignore_cache = ignore_cache;
        self
    }
}
