//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Grouping cached records by content hash
//! - Orchestrating a complete scan against the persistent cache

pub mod finder;
pub mod groups;

pub use finder::{DuplicateFinder, FinderConfig, FinderError, ScanSummary};
pub use groups::{find_duplicates, DuplicateGroup, DuplicateReport};
