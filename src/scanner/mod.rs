//! Scanner module for directory traversal, skip rules and file hashing.
//!
//! This module provides functionality for:
//! - Single-threaded, depth-first directory walking with cache reuse
//! - Path, size, filename and extension skip rules
//! - Chunked content hashing with a configurable digest
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Directory traversal, cache-hit decisions and record collection
//! - [`skip`]: The skip-rule evaluator
//! - [`hasher`]: Streaming file hashing
//! - [`path_utils`]: Environment expansion, absolutizing and root de-duplication
//!
//! # Example
//!
//! ```no_run
//! use clonesweep::cache::CacheData;
//! use clonesweep::config::Settings;
//! use clonesweep::scanner::{Hasher, SkipRules, Walker};
//! use std::path::PathBuf;
//!
//! let settings = Settings::default();
//! let walker = Walker::new(SkipRules::from_settings(&settings), Hasher::default());
//!
//! let mut data = CacheData::default();
//! let outcome = walker.walk(&mut data, &[PathBuf::from("/home/user/Downloads")], true);
//! println!("{} files hashed, {} errors", outcome.files_hashed, outcome.errors.len());
//! ```

pub mod hasher;
pub mod path_utils;
pub mod skip;
pub mod walker;

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

// Re-export main types
pub use hasher::{HashAlgorithm, Hasher, UnsupportedAlgorithm, DEFAULT_CHUNK_SIZE, MAX_CHUNK_SIZE};
pub use skip::{SkipReason, SkipRules};
pub use walker::{ScanOutcome, Walker};

/// Metadata for one directory entry, as seen by the skip rules.
#[derive(Debug, Clone, PartialEq)]
pub struct FileEntry {
    /// Absolute path to the entry
    pub path: PathBuf,
    /// Base name of the entry
    pub name: String,
    /// Whether the entry is a directory
    pub is_dir: bool,
    /// Size in bytes (meaningless for directories)
    pub size: u64,
    /// Modification time in seconds since the Unix epoch
    pub modified: f64,
}

impl FileEntry {
    /// Create a file entry. The name is taken from the last path component.
    #[must_use]
    pub fn new(path: PathBuf, size: u64, modified: f64) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            path,
            name,
            is_dir: false,
            size,
            modified,
        }
    }

    /// Create a directory entry.
    #[must_use]
    pub fn directory(path: PathBuf) -> Self {
        Self {
            is_dir: true,
            ..Self::new(path, 0, 0.0)
        }
    }
}

/// Convert a modification time to floating-point seconds since the epoch.
///
/// Times before the epoch come out negative.
#[must_use]
pub fn mtime_secs(time: SystemTime) -> f64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs_f64(),
        Err(e) => -e.duration().as_secs_f64(),
    }
}

/// Errors recorded for a single entry during a scan.
///
/// None of these stop the scan: they are collected in
/// [`ScanOutcome::errors`] and traversal continues with the next entry.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The entry vanished between listing and access.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// An I/O error occurred while accessing an entry.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The entry could be listed but its contents could not be hashed.
    #[error(transparent)]
    Hash(#[from] HashError),
}

impl ScanError {
    /// Classify an I/O error for `path`.
    #[must_use]
    pub fn from_io(path: &Path, error: std::io::Error) -> Self {
        use std::io::ErrorKind;

        match error.kind() {
            ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }

    /// Convert a walkdir error, falling back to `root` when it carries no path.
    #[must_use]
    pub fn from_walkdir(root: &Path, error: walkdir::Error) -> Self {
        let path = error.path().unwrap_or(root).to_path_buf();
        match error.into_io_error() {
            Some(io) => Self::from_io(&path, io),
            None => Self::Io {
                path,
                source: std::io::Error::other("filesystem loop detected"),
            },
        }
    }

    /// The path the error refers to.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::PermissionDenied(p) | Self::NotFound(p) => p,
            Self::Io { path, .. } => path,
            Self::Hash(e) => e.path(),
        }
    }
}

/// Errors that can occur during file hashing.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The specified file was not found.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl HashError {
    /// Classify an I/O error raised while hashing `path`.
    #[must_use]
    pub fn from_io(path: &Path, error: std::io::Error) -> Self {
        use std::io::ErrorKind;

        match error.kind() {
            ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }

    /// The file the error refers to.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound(p) | Self::PermissionDenied(p) => p,
            Self::Io { path, .. } => path,
        }
    }
}
