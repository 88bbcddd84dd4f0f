//! Directory walker implementation using walkdir.
//!
//! # Overview
//!
//! This module provides the [`Walker`] struct, which traverses one or more
//! roots, applies the [`SkipRules`], reuses cached hashes and hashes the
//! files the cache cannot vouch for. Results go straight into the
//! caller's [`CacheData`]; counters and errors come back as a
//! [`ScanOutcome`].
//!
//! # Features
//!
//! - Depth-first, single-threaded traversal on walkdir's own directory stack
//! - Entries visited in file-name order within each directory
//! - Excluded directories pruned without being read
//! - Symlinks never followed, reported as skipped entries
//! - Graceful shutdown via atomic flag, checked between entries
//! - Per-entry errors collected, never fatal
//!
//! # Example
//!
//! ```no_run
//! use clonesweep::cache::CacheData;
//! use clonesweep::scanner::{Hasher, SkipRules, Walker};
//! use std::path::PathBuf;
//!
//! let walker = Walker::new(SkipRules::default(), Hasher::default());
//! let mut data = CacheData::new();
//! let outcome = walker.walk(&mut data, &[PathBuf::from("/home/user/Downloads")], true);
//! for error in &outcome.errors {
//!     eprintln!("Warning: {}", error);
//! }
//! ```

use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use walkdir::{DirEntry, WalkDir};

use super::{mtime_secs, FileEntry, Hasher, ScanError, SkipRules};
use crate::cache::{CacheData, FileRecord};
use crate::progress::ProgressCallback;

/// Counters and collected state from one [`Walker::walk`] call.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    /// Directory entries visited (files, directories and others)
    pub entries_seen: usize,
    /// Regular files that passed the skip rules
    pub files_seen: usize,
    /// Files whose hash was computed
    pub files_hashed: usize,
    /// Files whose cached hash was reused
    pub cache_hits: usize,
    /// Entries excluded by a skip rule
    pub skipped: usize,
    /// Paths of files excluded by a skip rule
    pub skipped_files: HashSet<String>,
    /// Directories excluded by a skip rule (their subtrees were not read)
    pub skipped_dirs: Vec<PathBuf>,
    /// Per-entry errors, in the order they occurred
    pub errors: Vec<ScanError>,
    /// Whether the walk stopped early on a shutdown request
    pub interrupted: bool,
}

/// What the walk loop should do after visiting an entry.
enum Visit {
    Continue,
    Prune,
}

/// Directory walker that fills a [`CacheData`].
pub struct Walker {
    /// Skip rules, resolved once
    rules: SkipRules,
    /// Hasher used on cache misses
    hasher: Hasher,
    /// Optional shutdown flag for graceful termination
    shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional per-entry progress sink
    progress: Option<Arc<dyn ProgressCallback>>,
}

impl fmt::Debug for Walker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Walker")
            .field("rules", &self.rules)
            .field("hasher", &self.hasher)
            .field("shutdown_flag", &self.shutdown_flag)
            .finish_non_exhaustive()
    }
}

impl Walker {
    /// Create a new walker.
    ///
    /// # Arguments
    ///
    /// * `rules` - Skip rules applied to every entry
    /// * `hasher` - Hasher used for files not validly cached
    #[must_use]
    pub fn new(rules: SkipRules, hasher: Hasher) -> Self {
        Self {
            rules,
            hasher,
            shutdown_flag: None,
            progress: None,
        }
    }

    /// Set the shutdown flag for graceful termination.
    ///
    /// When the flag is set to `true`, the walker stops before the next
    /// entry and marks the outcome as interrupted.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Check if shutdown has been requested.
    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    fn notify(&self, name: &str, skipped: bool) {
        if let Some(ref progress) = self.progress {
            progress.on_entry(name, skipped);
        }
    }

    /// Walk `roots` in order, updating `data` in place.
    ///
    /// Only direct children of each root are visited unless `recursive` is
    /// set. Roots themselves are not checked against the skip rules. Nothing
    /// is persisted here.
    pub fn walk(&self, data: &mut CacheData, roots: &[PathBuf], recursive: bool) -> ScanOutcome {
        let mut outcome = ScanOutcome::default();
        let max_depth = if recursive { usize::MAX } else { 1 };

        if let Some(ref progress) = self.progress {
            progress.on_scan_start(roots);
        }

        'roots: for root in roots {
            log::debug!("Walking {} (recursive: {})", root.display(), recursive);

            let mut it = WalkDir::new(root)
                .min_depth(1)
                .max_depth(max_depth)
                .follow_links(false)
                .sort_by_file_name()
                .into_iter();

            while let Some(result) = it.next() {
                if self.is_shutdown_requested() {
                    log::debug!("Walker: Shutdown requested, stopping iteration");
                    outcome.interrupted = true;
                    break 'roots;
                }

                let entry = match result {
                    Ok(entry) => entry,
                    Err(e) => {
                        let error = ScanError::from_walkdir(root, e);
                        log::warn!("{error}");
                        outcome.errors.push(error);
                        continue;
                    }
                };

                outcome.entries_seen += 1;
                if let Visit::Prune = self.visit(&entry, data, &mut outcome) {
                    it.skip_current_dir();
                }
            }
        }

        if let Some(ref progress) = self.progress {
            progress.on_scan_end(outcome.entries_seen);
        }

        outcome
    }

    fn visit(&self, entry: &DirEntry, data: &mut CacheData, outcome: &mut ScanOutcome) -> Visit {
        let file_type = entry.file_type();
        if file_type.is_symlink() {
            log::trace!("Skipping symlink: {}", entry.path().display());
            outcome.skipped += 1;
            self.notify(&entry.file_name().to_string_lossy(), true);
            return Visit::Continue;
        }

        let file = match self.stat(entry) {
            Ok(file) => file,
            Err(error) => {
                log::warn!("{error}");
                outcome.errors.push(error);
                return Visit::Continue;
            }
        };

        if let Some(reason) = self.rules.should_skip(&file) {
            log::trace!("Skipping {} ({reason})", file.path.display());
            outcome.skipped += 1;
            self.notify(&file.name, true);
            if file.is_dir {
                outcome.skipped_dirs.push(file.path);
                return Visit::Prune;
            }
            outcome
                .skipped_files
                .insert(file.path.to_string_lossy().into_owned());
            return Visit::Continue;
        }

        if file.is_dir || !file_type.is_file() {
            return Visit::Continue;
        }

        outcome.files_seen += 1;
        let path = file.path.to_string_lossy().into_owned();

        if data.is_cached(&file.name, &path, file.modified) {
            log::trace!("Cache hit: {path}");
            outcome.cache_hits += 1;
            self.notify(&file.name, true);
            return Visit::Continue;
        }

        self.notify(&file.name, false);
        match self.hasher.hash_file(&file.path) {
            Ok(hash) => {
                outcome.files_hashed += 1;
                let record = FileRecord::new(self.hasher.algorithm(), hash, path, file.modified);
                data.append(file.name, record);
            }
            Err(e) => {
                log::warn!("{e}");
                outcome.errors.push(e.into());
            }
        }

        Visit::Continue
    }

    /// Build a [`FileEntry`] from the entry's metadata.
    fn stat(&self, entry: &DirEntry) -> Result<FileEntry, ScanError> {
        let path = entry.path();
        if entry.file_type().is_dir() {
            return Ok(FileEntry::directory(path.to_path_buf()));
        }

        let metadata = entry
            .metadata()
            .map_err(|e| ScanError::from_walkdir(path, e))?;
        let modified = metadata
            .modified()
            .map_err(|e| ScanError::from_io(path, e))?;

        Ok(FileEntry::new(
            path.to_path_buf(),
            metadata.len(),
            mtime_secs(modified),
        ))
    }
}
