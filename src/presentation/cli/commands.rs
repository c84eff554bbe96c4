//! CLI arguments using clap

use clap::Parser;
use std::path::PathBuf;

/// ntfs-resolver - raw-volume NTFS path resolver and file extractor
///
/// Reads an NTFS volume directly from its block device and extracts
/// files by walking the Master File Table, bypassing ordinary OS file
/// locks.
#[derive(Parser)]
#[command(name = "ntfs-resolver")]
#[command(version = "0.1.0")]
#[command(about = "Extract files from a live NTFS volume by raw MFT resolution", long_about = None)]
pub struct Cli {
    /// Source pattern(s), comma-separated. May contain a single `*`
    /// per path component, and a `*` drive spec to expand across all
    /// enumerated local volumes (e.g. `C:\Users\*\ntuser.dat`).
    #[arg(short = 'f', long = "file", value_delimiter = ',')]
    pub patterns: Vec<String>,

    /// Destination root directory.
    #[arg(short = 'o', long = "output")]
    pub output: PathBuf,

    /// Recursively copy directories.
    #[arg(short = 'r', long)]
    pub recursive: bool,

    /// Ignore the persistent path cache for this run.
    #[arg(short = 'i', long = "ignore-cache")]
    pub ignore_cache: bool,

    /// Raise the logging verbosity to debug.
    #[arg(short = 'v', long)]
    pub verbose: bool,
}
