//! JSON duplicate report.
//!
//! # Output Schema
//!
//! ```json
//! {
//!     "5d41402abc4b2a76b9719d911017c592": [
//!         "/data/a.txt",
//!         "/data/b.txt"
//!     ]
//! }
//! ```
//!
//! An empty report is written as `{}`.
//!
//! # Example
//!
//! ```no_run
//! use clonesweep::cache::CacheData;
//! use clonesweep::duplicates::find_duplicates;
//! use clonesweep::output::write_report;
//! use std::path::Path;
//!
//! let report = find_duplicates(&CacheData::new());
//! write_report(Path::new("./duplicates.json"), &report)?;
//! # Ok::<(), clonesweep::output::ReportError>(())
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use crate::duplicates::DuplicateReport;

/// Errors that can occur while writing the report.
#[derive(thiserror::Error, Debug)]
pub enum ReportError {
    /// The report could not be serialized.
    #[error("Failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The report file could not be written.
    #[error("Could not write duplicate report to {path}: {source}")]
    Write {
        /// Report file path
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Serialize `value` as JSON indented with four spaces.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_json_pretty<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    value.serialize(&mut ser)?;
    // serde_json only ever emits valid UTF-8.
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), ReportError> {
    let content = to_json_pretty(value)?;
    fs::write(path, content).map_err(|source| ReportError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Overwrite `path` with `report`.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_report(path: &Path, report: &DuplicateReport) -> Result<(), ReportError> {
    write_json(path, report)?;
    log::debug!("Wrote {} duplicate groups to {}", report.len(), path.display());
    Ok(())
}

/// Overwrite `path` with an empty report.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn clear_report(path: &Path) -> Result<(), ReportError> {
    write_json(path, &serde_json::Map::new())?;
    log::info!("Duplicates cleared.");
    Ok(())
}
