//! ntfs-resolver - raw-volume NTFS path resolver and file extractor
//!
//! Reads an NTFS volume directly from its block device and walks the
//! Master File Table to resolve paths and extract file contents,
//! bypassing ordinary OS file locks.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
pub mod utils;

pub use application::*;
pub use domain::entities::*;
pub use domain::repositories::*;
