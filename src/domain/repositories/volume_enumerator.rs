//! Local fixed-volume enumeration.
//!
//! External collaborator behind the `*` drive-spec expansion (see
//! `application::copy_files`): platform-specific, so it is injected
//! the same way `BlockDeviceReader` is. Grounded on
//! `__get_local_drives` in the original tool this system is modeled
//! on, which walked Win32 fixed drives; the Linux implementation in
//! `infrastructure::volumes` adapts the same contract to `/sys/block`.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VolumeEnumeratorError {
    #[error("failed to enumerate local volumes: {0}")]
    Other(String),
}

/// Expands a `*` drive specification into the concrete set of fixed
/// local volumes a copy operation should run against.
pub trait VolumeEnumerator: Send + Sync {
    fn local_fixed_volumes(&self) -> Result<Vec<String>, VolumeEnumeratorError>;
}
