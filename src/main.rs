//! ntfs-resolver
//!
//! Reads an NTFS volume directly from its block device, walks the
//! Master File Table to resolve paths, and extracts file content,
//! bypassing ordinary OS sharing locks.

use anyhow::{Context, Result};
use clap::Parser;
use ntfs_resolver::application::dto::CopySpec;
use ntfs_resolver::application::CopyFilesUseCase;
use ntfs_resolver::domain::repositories::BlockDeviceReader;
#[cfg(windows)]
use ntfs_resolver::infrastructure::block_device::WindowsBlockDevice;
#[cfg(not(windows))]
use ntfs_resolver::infrastructure::block_device::LinuxBlockDevice;
use ntfs_resolver::infrastructure::persistence::LocalPathCacheStore;
use ntfs_resolver::infrastructure::volumes::LinuxVolumeEnumerator;
use ntfs_resolver::presentation::cli::{Cli, ProgressReporter};
use ntfs_resolver::utils::format_bytes;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    let cache_path = cache_file_path()?;
    let use_case = CopyFilesUseCase::new(
        Box::new(open_device),
        LinuxVolumeEnumerator::new(),
        LocalPathCacheStore::new(),
        cache_path,
    );

    let mut any_failed = false;

    for pattern in &cli.patterns {
        let spec = CopySpec::new(pattern.clone(), cli.output.clone())
            .recursive(cli.recursive)
            .ignore_cache(cli.ignore_cache);

        let progress = ProgressReporter::for_copy(pattern);
        let outcome = use_case
            .execute(&spec)
            .with_context(|| format!("resolving pattern {pattern:?}"))?;
        progress.finish(&format!(
            "{} files copied ({})",
            outcome.files_copied,
            format_bytes(outcome.bytes_copied)
        ));

        println!("{}", outcome.summary());
        if outcome.files_failed > 0 {
            any_failed = true;
            for error in &outcome.errors {
                eprintln!("  error: {error}");
            }
        }
    }

    if any_failed {
        std::process::exit(1);
    }

    Ok(())
}

/// Opens the block device backing a drive token from a source pattern.
/// On Windows this is a drive letter or physical drive path; on Linux
/// it is a device node such as `/dev/sda1`, as returned by
/// [`LinuxVolumeEnumerator`].
fn open_device(drive: &str) -> Result<Box<dyn BlockDeviceReader>, ntfs_resolver::domain::repositories::BlockDeviceError> {
    #[cfg(windows)]
    {
        let path = if drive.contains('\\') {
            drive.to_string()
        } else {
            format!(r"\\.\{drive}")
        };
        return Ok(Box::new(WindowsBlockDevice::open(&path)?));
    }

    #[cfg(not(windows))]
    {
        Ok(Box::new(LinuxBlockDevice::open(drive)?))
    }
}

fn cache_file_path() -> Result<PathBuf> {
    let dir = cache_dir();
    std::fs::create_dir_all(&dir).with_context(|| format!("creating cache directory {}", dir.display()))?;
    Ok(dir.join("path_cache.bin"))
}

fn cache_dir() -> PathBuf {
    std::env::var_os("XDG_CACHE_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".cache")))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ntfs-resolver")
}
