//! Volume enumeration implementations

mod linux_volume_enumerator;

pub use linux_volume_enumerator::LinuxVolumeEnumerator;
