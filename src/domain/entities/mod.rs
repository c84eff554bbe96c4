//! Domain entities
//!
//! Core data shapes for NTFS path resolution and extraction, decoupled
//! from how they were read off disk.

mod directory_entry;
mod mft_reference;
mod path_cache_node;
mod volume_geometry;

pub use directory_entry::DirectoryEntry;
pub use mft_reference::MftReference;
pub use path_cache_node::PathCacheNode;
pub use volume_geometry::VolumeGeometry;
