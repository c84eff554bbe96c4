//! Infrastructure layer
//!
//! Concrete implementations of the domain repositories and services.
//! This layer contains all external dependencies and platform-specific code.

pub mod block_device;
pub mod file_systems;
pub mod persistence;
pub mod volumes;
