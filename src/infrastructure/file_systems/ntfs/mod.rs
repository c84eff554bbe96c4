//! NTFS on-disk structure decoding and the resolver/extractor built on
//! top of it.
//!
//! Leaf modules (`cursor`, `fixup`, `boot_sector`, `runlist`,
//! `attribute`, `mft_record`, `mft_locator`, `index`) each decode one
//! layer of the format; `volume::NtfsVolume` composes them into the
//! session-level API the application layer drives.

mod attribute;
mod boot_sector;
mod cursor;
mod fixup;
mod index;
mod mft_locator;
mod mft_record;
mod runlist;
mod volume;

pub use mft_record::MftRecord;
pub use volume::NtfsVolume;
