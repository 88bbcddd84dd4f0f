//! Command-line interface definitions for CloneSweep.
//!
//! This module defines all CLI arguments, subcommands, and options using the clap derive API.
//! Global options (verbosity, color, file locations) apply to every subcommand.
//!
//! # Example
//!
//! ```bash
//! # Scan the current directory (top level only)
//! clonesweep scan
//!
//! # Scan two trees recursively
//! clonesweep scan -r ~/Downloads ~/Pictures
//!
//! # Never look at lock files or anything under ~/build
//! clonesweep exclude exts .lock
//! clonesweep exclude paths ~/build
//!
//! # Verbose mode for debugging
//! clonesweep -v scan -r ~/Downloads
//! ```

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::ExclusionKind;

/// Default cache file, relative to the working directory.
pub const DEFAULT_CACHE_FILE: &str = "cache.json";

/// Default duplicate report file, relative to the working directory.
pub const DEFAULT_REPORT_FILE: &str = "duplicates.json";

/// Duplicate file finder with a persistent hash cache.
///
/// CloneSweep hashes every file it walks, remembers each hash together with
/// the file's modification time, and reports groups of files with identical
/// content. Unchanged files are never hashed twice.
#[derive(Debug, Parser)]
#[command(name = "clonesweep")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Settings file to use instead of the platform default
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Hash cache file
    #[arg(long, value_name = "FILE", global = true, default_value = DEFAULT_CACHE_FILE)]
    pub cache: PathBuf,

    /// Duplicate report file
    #[arg(long, value_name = "FILE", global = true, default_value = DEFAULT_REPORT_FILE)]
    pub report: PathBuf,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands for CloneSweep.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan directories for duplicate files
    Scan(ScanArgs),
    /// Reset the hash cache to an empty one
    ClearCache,
    /// Empty the duplicate report
    ClearDuplicates,
    /// Add user exclusions to the settings file
    Exclude(ExcludeArgs),
    /// Remove all user exclusions from the settings file
    ClearExclusions,
    /// Print the effective settings
    Settings,
}

/// Arguments for the scan subcommand.
#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Directories to scan (defaults to the current directory)
    #[arg(value_name = "PATH")]
    pub paths: Vec<PathBuf>,

    /// Descend into subdirectories
    #[arg(short, long)]
    pub recursive: bool,
}

/// Arguments for the exclude subcommand.
#[derive(Debug, Args)]
pub struct ExcludeArgs {
    /// Which exclusion list to extend
    #[arg(value_enum)]
    pub kind: ExclusionKind,

    /// Items to exclude (space or comma separated)
    ///
    /// Paths must be existing directories, extensions start with a dot.
    #[arg(value_name = "ITEM", required = true, value_delimiter = ',')]
    pub items: Vec<String>,
}
