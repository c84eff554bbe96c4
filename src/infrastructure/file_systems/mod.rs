//! File system structure decoding.

pub mod ntfs;

pub use ntfs::{MftRecord, NtfsVolume};
