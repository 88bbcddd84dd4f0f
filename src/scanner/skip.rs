//! Skip-rule evaluation for directory entries.
//!
//! Rules are checked in a fixed order and the first match wins:
//!
//! 1. the entry's absolute path is an excluded path (default + user),
//! 2. the file is larger than the size limit,
//! 3. the file name, or the name without its extension, is excluded,
//! 4. the file extension (with its leading dot) is excluded.
//!
//! Directories are only checked against rule 1. An excluded directory prunes
//! its whole subtree. Each rule is independent of the others, so the order
//! only affects which [`SkipReason`] is reported.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use super::path_utils::{absolutize, resolve_skip_path};
use super::FileEntry;
use crate::config::Settings;

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Why an entry was excluded from the scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Path is in the excluded path set.
    ExcludedPath,
    /// File exceeds the size limit.
    TooLarge {
        /// Size of the file in bytes
        size: u64,
        /// Configured limit in bytes
        limit: u64,
    },
    /// File name (with or without extension) is excluded.
    ExcludedName,
    /// File extension is excluded.
    ExcludedExtension,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExcludedPath => f.write_str("excluded path"),
            Self::TooLarge { size, limit } => {
                write!(f, "size {size} exceeds limit of {limit} bytes")
            }
            Self::ExcludedName => f.write_str("excluded file name"),
            Self::ExcludedExtension => f.write_str("excluded extension"),
        }
    }
}

/// Resolved skip rules, read-only for the duration of a scan.
///
/// Path rules are expanded and absolutized once at construction, not per
/// entry.
#[derive(Debug, Clone, Default)]
pub struct SkipRules {
    paths: HashSet<PathBuf>,
    extensions: HashSet<String>,
    filenames: HashSet<String>,
    max_file_size: Option<u64>,
}

impl SkipRules {
    /// Build the rule set from settings (default and user lists combined).
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self::default()
            .with_paths(
                settings
                    .default_paths_skip
                    .iter()
                    .chain(&settings.user_paths_skip),
            )
            .with_extensions(
                settings
                    .default_exts_skip
                    .iter()
                    .chain(&settings.user_exts_skip),
            )
            .with_filenames(&settings.user_filenames_skip)
            .with_max_file_size_mb(settings.max_file_size_mb)
    }

    /// Add excluded paths. `$VAR`/`%VAR%` references are expanded.
    #[must_use]
    pub fn with_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.paths
            .extend(paths.into_iter().map(|p| resolve_skip_path(p.as_ref())));
        self
    }

    /// Add excluded extensions, written with their leading dot (`.tmp`).
    #[must_use]
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extensions
            .extend(extensions.into_iter().map(|e| e.as_ref().to_string()));
        self
    }

    /// Add excluded file names. A name without an extension also matches
    /// every file with that stem (`report` excludes `report.txt`).
    #[must_use]
    pub fn with_filenames<I, S>(mut self, filenames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.filenames
            .extend(filenames.into_iter().map(|n| n.as_ref().to_string()));
        self
    }

    /// Set the size limit in megabytes (MiB).
    #[must_use]
    pub fn with_max_file_size_mb(mut self, megabytes: u64) -> Self {
        self.max_file_size = Some(megabytes.saturating_mul(BYTES_PER_MB));
        self
    }

    /// Size limit in bytes, if any.
    #[must_use]
    pub fn max_file_size(&self) -> Option<u64> {
        self.max_file_size
    }

    /// Whether `path` is one of the excluded paths.
    #[must_use]
    pub fn is_excluded_path(&self, path: &Path) -> bool {
        if self.paths.is_empty() {
            return false;
        }
        self.paths.contains(path) || self.paths.contains(&absolutize(path))
    }

    /// Decide whether `entry` is excluded, and why.
    #[must_use]
    pub fn should_skip(&self, entry: &FileEntry) -> Option<SkipReason> {
        if self.is_excluded_path(&entry.path) {
            return Some(SkipReason::ExcludedPath);
        }

        if entry.is_dir {
            return None;
        }

        if let Some(limit) = self.max_file_size {
            if entry.size > limit {
                return Some(SkipReason::TooLarge {
                    size: entry.size,
                    limit,
                });
            }
        }

        let path = Path::new(&entry.name);
        let stem = path.file_stem().map(|s| s.to_string_lossy());
        if self.filenames.contains(&entry.name)
            || stem.is_some_and(|s| self.filenames.contains(s.as_ref()))
        {
            return Some(SkipReason::ExcludedName);
        }

        if let Some(ext) = path.extension() {
            let dotted = format!(".{}", ext.to_string_lossy());
            if self.extensions.contains(&dotted) {
                return Some(SkipReason::ExcludedExtension);
            }
        }

        None
    }
}
