//! Output for duplicate scan results.
//!
//! The duplicate report is written as a JSON object mapping each shared hash
//! to the paths that carry it. See [`json`] for the format.

pub mod json;

pub use json::{clear_report, to_json_pretty, write_report, ReportError};
