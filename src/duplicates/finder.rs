//! Scan orchestration: walk, reconcile, persist once, then group.
//!
//! # Overview
//!
//! [`DuplicateFinder::find_duplicates`] runs one complete scan:
//! 1. **Validate** - every root must be an existing directory
//! 2. **Algorithm check** - a cache stamped with a different algorithm is cleared
//! 3. **Walk** - skip rules, cache reuse and hashing (see [`crate::scanner::walker`])
//! 4. **Reconcile** - collapse superseded records and drop excluded or vanished files
//! 5. **Persist** - stamp the algorithm and write the cache exactly once
//! 6. **Group** - rebuild the duplicate report from the whole cache
//!
//! An interrupted walk stops before step 4: nothing is persisted and no
//! report is produced.
//!
//! # Example
//!
//! ```no_run
//! use clonesweep::cache::HashCache;
//! use clonesweep::config::Settings;
//! use clonesweep::duplicates::{DuplicateFinder, FinderConfig};
//! use std::path::PathBuf;
//!
//! let (cache, _) = HashCache::open("./cache.json");
//! let config = FinderConfig::default()
//!     .with_settings(Settings::default())
//!     .with_report_path(PathBuf::from("./duplicates.json"));
//! let mut finder = DuplicateFinder::new(config, cache);
//!
//! let (report, summary) = finder.find_duplicates(&[PathBuf::from(".")], true).unwrap();
//! println!("{} groups, {} files hashed", report.len(), summary.files_hashed);
//! ```

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::groups::{find_duplicates, DuplicateReport};
use crate::cache::HashCache;
use crate::config::Settings;
use crate::output::write_report;
use crate::progress::ProgressCallback;
use crate::scanner::path_utils::absolutize;
use crate::scanner::{HashAlgorithm, Hasher, ScanError, SkipRules, Walker};

/// Configuration for the duplicate finder.
#[derive(Clone, Default)]
pub struct FinderConfig {
    /// Scan settings, fixed for the duration of a scan.
    pub settings: Settings,
    /// Where to write the duplicate report, if anywhere.
    pub report_path: Option<PathBuf>,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback for reporting.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderConfig")
            .field("settings", &self.settings)
            .field("report_path", &self.report_path)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl FinderConfig {
    /// Set the scan settings.
    #[must_use]
    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Set the duplicate report path.
    #[must_use]
    pub fn with_report_path(mut self, path: PathBuf) -> Self {
        self.report_path = Some(path);
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Check if shutdown has been requested.
    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// Summary statistics from a duplicate scan.
#[derive(Debug, Default)]
pub struct ScanSummary {
    /// Directory entries visited
    pub total_entries: usize,
    /// Regular files that passed the skip rules
    pub total_files: usize,
    /// Files whose hash was computed this scan
    pub files_hashed: usize,
    /// Files whose cached hash was reused
    pub cache_hits: usize,
    /// Entries excluded by a skip rule
    pub skipped_entries: usize,
    /// Number of duplicate groups
    pub duplicate_groups: usize,
    /// Total number of duplicate files (excluding the first of each group)
    pub duplicate_files: usize,
    /// Cache records removed during reconciliation
    pub records_pruned: usize,
    /// Whether the cache was cleared because the algorithm changed
    pub cache_cleared: bool,
    /// Set when the cache could not be persisted
    pub persist_error: Option<String>,
    /// Set when the report could not be written
    pub report_error: Option<String>,
    /// Duration of the entire scan
    pub scan_duration: Duration,
    /// Per-entry errors encountered during the scan
    pub scan_errors: Vec<ScanError>,
}

impl ScanSummary {
    /// Whether at least one duplicate group was found.
    #[must_use]
    pub fn duplicates_found(&self) -> bool {
        self.duplicate_groups > 0
    }

    /// Whether anything went wrong that the user should see.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.scan_errors.is_empty() || self.persist_error.is_some() || self.report_error.is_some()
    }

    /// Human-readable error lines, entry errors first.
    #[must_use]
    pub fn error_messages(&self) -> Vec<String> {
        self.scan_errors
            .iter()
            .map(ToString::to_string)
            .chain(self.persist_error.iter().cloned())
            .chain(self.report_error.iter().cloned())
            .collect()
    }
}

/// Errors that abort a scan.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The scan was interrupted by user (Ctrl+C or shutdown signal).
    #[error("Scan interrupted by user")]
    Interrupted,

    /// The provided path does not exist.
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// The provided path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),
}

/// Orchestrates a scan against one owned [`HashCache`].
pub struct DuplicateFinder {
    config: FinderConfig,
    algorithm: HashAlgorithm,
    cache: HashCache,
}

impl DuplicateFinder {
    /// Create a new duplicate finder.
    ///
    /// The configured algorithm is resolved here, once: an unsupported
    /// name is replaced by md5 with a single warning.
    #[must_use]
    pub fn new(config: FinderConfig, cache: HashCache) -> Self {
        let algorithm = config.settings.algorithm();
        Self {
            config,
            algorithm,
            cache,
        }
    }

    /// The algorithm scans will use.
    #[must_use]
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// The cache being scanned into.
    #[must_use]
    pub fn cache(&self) -> &HashCache {
        &self.cache
    }

    /// Give back the cache.
    #[must_use]
    pub fn into_cache(self) -> HashCache {
        self.cache
    }

    /// Scan `roots` and rebuild the duplicate report.
    ///
    /// The cache is persisted once after the walk completes. Persist and
    /// report write failures are recorded in the summary, not returned.
    ///
    /// # Errors
    ///
    /// Returns `FinderError` if:
    /// - A root does not exist or is not a directory
    /// - The scan is interrupted by shutdown signal
    pub fn find_duplicates(
        &mut self,
        roots: &[PathBuf],
        recursive: bool,
    ) -> Result<(DuplicateReport, ScanSummary), FinderError> {
        let start_time = Instant::now();
        let mut summary = ScanSummary::default();

        let roots = roots
            .iter()
            .map(|root| {
                let root = absolutize(root);
                if !root.exists() {
                    Err(FinderError::PathNotFound(root))
                } else if !root.is_dir() {
                    Err(FinderError::NotADirectory(root))
                } else {
                    Ok(root)
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        summary.cache_cleared = self.check_algorithm();

        log::info!(
            "Starting {} scan of {} path(s) with {}",
            if recursive { "recursive" } else { "top-level" },
            roots.len(),
            self.algorithm
        );

        let settings = &self.config.settings;
        let mut walker = Walker::new(
            SkipRules::from_settings(settings),
            Hasher::new(self.algorithm, settings.hash_chunk_size),
        );
        if let Some(ref flag) = self.config.shutdown_flag {
            walker = walker.with_shutdown_flag(flag.clone());
        }
        if let Some(ref callback) = self.config.progress_callback {
            walker = walker.with_progress_callback(callback.clone());
        }

        let outcome = walker.walk(self.cache.data_mut(), &roots, recursive);
        if outcome.interrupted {
            log::info!("Scan interrupted, cache not written");
            return Err(FinderError::Interrupted);
        }

        let stats = self.cache.data_mut().reconcile(
            &outcome.skipped_files,
            &outcome.skipped_dirs,
            settings.prune_missing,
        );
        if stats.records_removed() > 0 {
            log::debug!("Reconciled cache: {:?}", stats);
        }

        self.cache.set_hash_algorithm(self.algorithm.name());
        if let Err(e) = self.cache.write() {
            log::warn!("{e}");
            summary.persist_error = Some(e.to_string());
        }

        let report = find_duplicates(self.cache.data());

        if let Some(ref path) = self.config.report_path {
            if let Err(e) = write_report(path, &report) {
                log::warn!("{e}");
                summary.report_error = Some(e.to_string());
            }
        }

        summary.total_entries = outcome.entries_seen;
        summary.total_files = outcome.files_seen;
        summary.files_hashed = outcome.files_hashed;
        summary.cache_hits = outcome.cache_hits;
        summary.skipped_entries = outcome.skipped;
        summary.records_pruned = stats.records_removed();
        summary.duplicate_groups = report.len();
        summary.duplicate_files = report.duplicate_files();
        summary.scan_errors = outcome.errors;
        summary.scan_duration = start_time.elapsed();

        log::info!(
            "Scan complete: {} files ({} hashed, {} cached), {} duplicate groups in {:?}",
            summary.total_files,
            summary.files_hashed,
            summary.cache_hits,
            summary.duplicate_groups,
            summary.scan_duration
        );

        Ok((report, summary))
    }

    /// Clear the cache if it was built with another algorithm.
    ///
    /// Returns whether the cache was cleared.
    fn check_algorithm(&mut self) -> bool {
        let stamped = self.cache.hash_algorithm();
        if stamped.is_empty() || stamped == self.algorithm.name() {
            return false;
        }

        log::warn!(
            "Hashing algorithm changed from {} to {}, clearing cache.",
            stamped,
            self.algorithm
        );
        if let Err(e) = self.cache.clear() {
            log::warn!("{e}");
        }
        true
    }
}
