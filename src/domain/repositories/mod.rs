//! Repository traits (interfaces)
//!
//! These traits define the contracts for external dependencies.
//! They follow the Dependency Inversion Principle (DIP) from SOLID.

mod block_device;
mod path_cache_store;
mod volume_enumerator;

pub use block_device::{BlockDeviceError, BlockDeviceReader, DeviceInfo};
pub use path_cache_store::{PathCacheStore, PathCacheStoreError};
pub use volume_enumerator::{VolumeEnumerator, VolumeEnumeratorError};
