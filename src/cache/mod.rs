//! Hash caching module for CloneSweep.
//!
//! This module provides persistent storage for file hashes so unchanged
//! files are not re-hashed on later scans.
//!
//! # Architecture
//!
//! * [`store`]: JSON persistence, load validation and atomic writes.
//! * [`entry`]: The filename-keyed record mapping and its reconciliation.
//! * [`metadata`]: The metadata section and the key set it must match.
//!
//! # Cache Invalidation
//!
//! Records are keyed by base name. A record is trusted only when its stored
//! path and modification time both match the live file. Otherwise the file
//! is re-hashed and a new record is appended. Stale records for the same
//! path are collapsed after the scan (see [`CacheData::reconcile`]).
//!
//! A cache file whose metadata keys differ from [`metadata::KEYS`] is
//! discarded as a whole, and so is one that is not valid JSON.

pub mod entry;
pub mod metadata;
pub mod store;

pub use entry::{CacheData, FileRecord, ReconcileStats};
pub use metadata::CacheMetadata;
pub use store::{CacheError, CacheResult, HashCache, LoadState};
