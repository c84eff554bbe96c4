//! Crate-wide NTFS error currency
//!
//! Every fallible operation below the CLI boundary returns `NtfsResult<T>`.
//! Only `presentation::cli` collapses this into `anyhow::Result` for
//! reporting to the user.

use crate::domain::repositories::BlockDeviceError;
use thiserror::Error;

/// Errors produced while resolving or extracting data from an NTFS volume.
#[derive(Error, Debug)]
pub enum NtfsError {
    #[error("device I/O error: {0}")]
    Io(#[from] BlockDeviceError),

    #[error("fixup mismatch in block at offset {offset}: stride {stride} does not match USA sentinel")]
    CorruptFixup { offset: u64, stride: usize },

    #[error("corrupt run list in attribute at record {record}: {reason}")]
    CorruptRunlist { record: u64, reason: String },

    #[error("corrupt attribute in record {record}: {reason}")]
    CorruptAttribute { record: u64, reason: String },

    #[error("bad magic in {what} at offset {offset}: expected {expected:?}, found {found:?}")]
    BadMagic {
        what: &'static str,
        offset: u64,
        expected: [u8; 4],
        found: [u8; 4],
    },

    #[error("record number {0} is out of range for this volume")]
    RecordOutOfRange(u64),

    #[error("record {0} is not a directory")]
    NotADirectory(u64),

    #[error("path not found: {0}")]
    PathNotFound(String),

    #[error("attribute type {attr_type:#06x} not found in record {record}")]
    AttributeNotFound { record: u64, attr_type: u32 },

    #[error("failed to write extracted data to {path}: {source}")]
    ExtractIoError {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type NtfsResult<T> = Result<T, NtfsError>;
