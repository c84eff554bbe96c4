//! Linux fixed-volume enumeration.
//!
//! Walks `/sys/block` for whole disks and their partitions, filtering
//! out obviously removable media (loop devices, CD-ROMs) the same way
//! the original tool this system is modeled on skipped removable
//! drives when expanding a `*` drive spec. Returns device-node paths
//! such as `/dev/sda1` rather than drive letters, since that is the
//! addressable unit on this platform.

use crate::domain::repositories::{VolumeEnumerator, VolumeEnumeratorError};
use std::fs;
use std::path::Path;

pub struct LinuxVolumeEnumerator {
    sys_block_dir: String,
}

impl LinuxVolumeEnumerator {
    pub fn new() -> Self {
        Self {
            sys_block_dir: "/sys/block".to_string(),
        }
    }

    #[cfg(test)]
    pub fn with_sys_block_dir(dir: &str) -> Self {
        Self {
            sys_block_dir: dir.to_string(),
        }
    }

    fn is_removable(disk_dir: &Path) -> bool {
        fs::read_to_string(disk_dir.join("removable"))
            .map(|content| content.trim() == "1")
            .unwrap_or(false)
    }

    fn is_loop_or_optical(name: &str) -> bool {
        name.starts_with("loop") || name.starts_with("sr")
    }
}

impl Default for LinuxVolumeEnumerator {
    fn default() -> Self {
        Self::new()
    }
}

impl VolumeEnumerator for LinuxVolumeEnumerator {
    fn local_fixed_volumes(&self) -> Result<Vec<String>, VolumeEnumeratorError> {
        let entries = fs::read_dir(&self.sys_block_dir)
            .map_err(|e| VolumeEnumeratorError::Other(e.to_string()))?;

        let mut volumes = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| VolumeEnumeratorError::Other(e.to_string()))?;
            let name = entry.file_name().to_string_lossy().to_string();

            if Self::is_loop_or_optical(&name) || Self::is_removable(&entry.path()) {
                continue;
            }

            // List partitions under this disk; a disk with no
            // partition subdirectories contributes its own device node.
            let mut had_partition = false;
            if let Ok(children) = fs::read_dir(entry.path()) {
                for child in children.flatten() {
                    let child_name = child.file_name().to_string_lossy().to_string();
                    if child_name.starts_with(&name) && child.path().join("partition").exists() {
                        volumes.push(format!("/dev/{child_name}"));
                        had_partition = true;
                    }
                }
            }

            if !had_partition {
                volumes.push(format!("/dev/{name}"));
            }
        }

        volumes.sort();
        Ok(volumes)
    }
}
