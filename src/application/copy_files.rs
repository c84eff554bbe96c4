//! Copy files use case (the "Resolver Driver").
//!
//! Orchestrates wildcard expansion, drive-spec expansion, path-cache
//! lookups, and recursive directory copy on top of a raw `NtfsVolume`
//! session per drive.

use crate::application::dto::{CopyOutcome, CopySpec};
use crate::domain::entities::PathCacheNode;
use crate::domain::error::NtfsError;
use crate::domain::repositories::{BlockDeviceError, BlockDeviceReader, PathCacheStore, VolumeEnumerator};
use crate::domain::services::wildcard::{self, PatternSegment};
use crate::infrastructure::file_systems::ntfs::NtfsVolume;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Opens a block device for a drive token taken from a source pattern
/// (e.g. `"C"`, or a device path such as `"/dev/sda1"`).
pub type DeviceOpener = Box<dyn Fn(&str) -> Result<Box<dyn BlockDeviceReader>, BlockDeviceError>>;

pub struct CopyFilesUseCase<E: VolumeEnumerator, S: PathCacheStore> {
    device_opener: DeviceOpener,
    volume_enumerator: E,
    cache_store: S,
    cache_path: PathBuf,
}

impl<E: VolumeEnumerator, S: PathCacheStore> CopyFilesUseCase<E, S> {
    pub fn new(
        device_opener: DeviceOpener,
        volume_enumerator: E,
        cache_store: S,
        cache_path: PathBuf,
    ) -> Self {
        Self {
            device_opener,
            volume_enumerator,
            cache_store,
            cache_path,
        }
    }

    pub fn execute(&self, spec: &CopySpec) -> Result<CopyOutcome> {
        let start_time = Instant::now();
        let mut outcome = CopyOutcome::new();

        let (drive_spec, components) = split_pattern(&spec.source_pattern)
            .with_context(|| format!("malformed source pattern {:?}", spec.source_pattern))?;

        let drives = if drive_spec == "*" {
            self.volume_enumerator
                .local_fixed_volumes()
                .context("enumerating local fixed volumes")?
        } else {
            vec![drive_spec.to_string()]
        };

        for drive in drives {
            tracing::info!(drive = %drive, pattern = %spec.source_pattern, "starting copy session");
            if let Err(e) = self.copy_from_drive(&drive, &components, spec, &mut outcome) {
                tracing::error!(drive = %drive, error = %e, "copy session failed");
                outcome.add_error(format!("{drive}: {e}"));
            }
        }

        outcome.duration = start_time.elapsed();
        tracing::info!(
            files_copied = outcome.files_copied,
            bytes_copied = outcome.bytes_copied,
            duration_secs = outcome.duration.as_secs_f64(),
            "copy complete"
        );

        Ok(outcome)
    }

    fn copy_from_drive(
        &self,
        drive: &str,
        components: &[String],
        spec: &CopySpec,
        outcome: &mut CopyOutcome,
    ) -> Result<()> {
        let device = (self.device_opener)(drive).with_context(|| format!("opening device for drive {drive}"))?;
        let volume = NtfsVolume::open(device).context("opening NTFS volume")?;

        let mut cache = if spec.ignore_cache {
            PathCacheNode::new_root()
        } else {
            self.cache_store
                .load(&self.cache_path, drive)
                .unwrap_or_else(|_| PathCacheNode::new_root())
        };

        let segments = wildcard::split_components(components);
        self.expand_and_copy(&volume, &segments, &mut cache, &[], drive, spec, outcome)?;

        if !spec.ignore_cache {
            if let Err(e) = self.cache_store.save(&self.cache_path, drive, &cache) {
                tracing::warn!(drive = %drive, error = %e, "failed to persist path cache");
            }
        }

        Ok(())
    }

    /// Resolves `segments` against `volume`, expanding any `*`
    /// wildcard component against the real children at that depth,
    /// then copies every concrete match found. `path_prefix` is the
    /// sequence of components already resolved by enclosing wildcard
    /// expansions, so each match mirrors to its own destination
    /// instead of collapsing onto a single shared one.
    fn expand_and_copy(
        &self,
        volume: &NtfsVolume,
        segments: &[PatternSegment],
        cache: &mut PathCacheNode,
        path_prefix: &[String],
        drive: &str,
        spec: &CopySpec,
        outcome: &mut CopyOutcome,
    ) -> Result<()> {
        // Split into a literal prefix (resolved directly, using the
        // cache) and the remaining suffix starting at the first
        // wildcard component, if any.
        let wildcard_at = segments.iter().position(|s| matches!(s, PatternSegment::Wildcard(_)));

        let literal_prefix: Vec<String> = segments[..wildcard_at.unwrap_or(segments.len())]
            .iter()
            .map(|s| match s {
                PatternSegment::Literal(name) => name.clone(),
                PatternSegment::Wildcard(_) => unreachable!(),
            })
            .collect();

        let start_record = self.resolve_with_cache(volume, cache, &literal_prefix)?;

        let mut full_prefix = path_prefix.to_vec();
        full_prefix.extend(literal_prefix.iter().cloned());

        match wildcard_at {
            None => self.copy_record(volume, start_record, drive, &full_prefix, spec, outcome),
            Some(index) => {
                let pattern = match &segments[index] {
                    PatternSegment::Wildcard(p) => p.clone(),
                    PatternSegment::Literal(_) => unreachable!(),
                };
                let rest = &segments[index + 1..];

                let children = volume.list_directory(start_record).with_context(|| {
                    format!("listing directory at {}", full_prefix.join("\\"))
                })?;

                for child in children {
                    if !wildcard::matches(&pattern, &child.name) {
                        continue;
                    }
                    let mut child_path = full_prefix.clone();
                    child_path.push(child.name.clone());

                    if rest.is_empty() {
                        cache.insert(&child.name, child.reference.record_number());
                        if let Err(e) =
                            self.copy_record(volume, child.reference.record_number(), drive, &child_path, spec, outcome)
                        {
                            outcome.add_error(format!("{}: {e}", child_path.join("\\")));
                        }
                    } else {
                        let next_cache = cache.insert(&child.name, child.reference.record_number());
                        if let Err(e) =
                            self.expand_and_copy(volume, rest, next_cache, &child_path, drive, spec, outcome)
                        {
                            outcome.add_error(format!("{}: {e}", child_path.join("\\")));
                        }
                    }
                }
                Ok(())
            }
        }
    }

    fn resolve_with_cache(
        &self,
        volume: &NtfsVolume,
        cache: &mut PathCacheNode,
        components: &[String],
    ) -> Result<u64> {
        let remaining_len = cache.longest_prefix(components).1.len();
        let consumed = components.len() - remaining_len;

        let mut node = cache;
        for component in &components[..consumed] {
            node = node.child_mut(component).expect("longest_prefix already confirmed this child exists");
        }
        let mut current_record = node.record_number();

        for component in &components[consumed..] {
            let entry = volume
                .resolve_child(current_record, component)
                .with_context(|| format!("resolving path component {component:?}"))?;
            node = node.insert(component, entry.reference.record_number());
            current_record = entry.reference.record_number();
        }

        Ok(current_record)
    }

    fn copy_record(
        &self,
        volume: &NtfsVolume,
        record_number: u64,
        drive: &str,
        components: &[String],
        spec: &CopySpec,
        outcome: &mut CopyOutcome,
    ) -> Result<()> {
        let record = volume.read_record(record_number).context("reading MFT record")?;
        let destination = mirrored_path(&spec.destination_root, drive, components);

        if record.is_directory() {
            if !spec.recursive {
                return self.copy_directory_children_only(volume, record_number, drive, components, spec, outcome);
            }
            let children = volume
                .list_directory(record_number)
                .context("listing directory for recursive copy")?;
            for child in children {
                let mut child_components = components.to_vec();
                child_components.push(child.name.clone());
                if let Err(e) = self.copy_record(volume, child.reference.record_number(), drive, &child_components, spec, outcome) {
                    outcome.add_error(format!("{}: {e}", child_components.join("\\")));
                }
            }
            Ok(())
        } else {
            self.extract_one_file(volume, record_number, &destination, outcome)
        }
    }

    fn copy_directory_children_only(
        &self,
        volume: &NtfsVolume,
        record_number: u64,
        drive: &str,
        components: &[String],
        spec: &CopySpec,
        outcome: &mut CopyOutcome,
    ) -> Result<()> {
        let children = volume.list_directory(record_number).context("listing directory")?;
        for child in children {
            if child.is_directory {
                continue;
            }
            let mut child_components = components.to_vec();
            child_components.push(child.name.clone());
            let destination = mirrored_path(&spec.destination_root, drive, &child_components);
            if let Err(e) = self.extract_one_file(volume, child.reference.record_number(), &destination, outcome) {
                outcome.add_error(format!("{}: {e}", child_components.join("\\")));
            }
        }
        Ok(())
    }

    fn extract_one_file(
        &self,
        volume: &NtfsVolume,
        record_number: u64,
        destination: &Path,
        outcome: &mut CopyOutcome,
    ) -> Result<()> {
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent).with_context(|| format!("creating directory {}", parent.display()))?;
        }

        let bytes = {
            let mut file = fs::File::create(destination)
                .with_context(|| format!("creating destination file {}", destination.display()))?;
            volume
                .extract_stream(record_number, None, &mut file)
                .map_err(anyhow::Error::from)
                .with_context(|| format!("extracting primary stream for record {record_number}"))?
        };
        outcome.add_copied(bytes);
        tracing::debug!(record_number, bytes, path = %destination.display(), "extracted file");

        for stream_name in volume.named_data_streams(record_number).unwrap_or_default() {
            let ads_destination = ads_sibling_path(destination, &stream_name);
            let bytes = {
                let mut file = fs::File::create(&ads_destination)
                    .with_context(|| format!("creating ADS sibling {}", ads_destination.display()))?;
                match volume.extract_stream(record_number, Some(&stream_name), &mut file) {
                    Ok(bytes) => bytes,
                    Err(NtfsError::AttributeNotFound { .. }) => continue,
                    Err(e) => return Err(e.into()),
                }
            };
            outcome.add_copied(bytes);
        }

        Ok(())
    }
}

fn split_pattern(pattern: &str) -> Result<(&str, Vec<String>)> {
    let mut parts = pattern.split('\\');
    let drive = parts.next().filter(|s| !s.is_empty()).context("pattern has no drive component")?;
    let components: Vec<String> = parts.filter(|s| !s.is_empty()).map(|s| s.to_string()).collect();
    Ok((drive, components))
}

fn mirrored_path(destination_root: &Path, drive: &str, components: &[String]) -> PathBuf {
    let mut path = destination_root.to_path_buf();
    path.push(sanitize_component(drive));
    for component in components {
        path.push(sanitize_component(component));
    }
    path
}

fn sanitize_component(component: &str) -> String {
    component.replace(':', "_")
}

fn ads_sibling_path(primary: &Path, stream_name: &str) -> PathBuf {
    let file_name = primary
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    primary.with_file_name(format!("{file_name}_ADS_{stream_name}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_a_windows_style_pattern() {
        let (drive, components) = split_pattern(r"C:\Windows\System32\config\SYSTEM").unwrap();
        assert_eq!(drive, "C:");
        assert_eq!(
            components,
            vec!["Windows".to_string(), "System32".to_string(), "config".to_string(), "SYSTEM".to_string()]
        );
    }

    #[test]
    fn wildcard_drive_spec_is_preserved() {
        let (drive, components) = split_pattern(r"*\Users\*\ntuser.dat").unwrap();
        assert_eq!(drive, "*");
        assert_eq!(components, vec!["Users".to_string(), "*".to_string(), "ntuser.dat".to_string()]);
    }

    #[test]
    fn ads_sibling_naming_matches_convention() {
        let primary = PathBuf::from("/out/C_/foo.txt");
        let sibling = ads_sibling_path(&primary, "secret");
        assert_eq!(sibling, PathBuf::from("/out/C_/foo.txt_ADS_secret"));
    }
}
