//! Progress reporting utilities using indicatif.
//!
//! This module provides the [`ProgressCallback`] trait the walker reports
//! through, and the [`Progress`] spinner that implements it for the terminal.
//! The walk has no known total, so a spinner with a running entry count is
//! used instead of a bar.

use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// Receives per-entry progress during a scan.
pub trait ProgressCallback: Send + Sync {
    /// Called once before the first entry is visited.
    fn on_scan_start(&self, _roots: &[PathBuf]) {}

    /// Called for each processed entry.
    ///
    /// # Arguments
    ///
    /// * `name` - Base name of the entry
    /// * `skipped` - True when no hash was computed (excluded or cache hit)
    fn on_entry(&self, name: &str, skipped: bool);

    /// Called once after the walk finished or stopped.
    fn on_scan_end(&self, _entries: usize) {}
}

/// Terminal spinner showing the entry being processed.
pub struct Progress {
    bar: Mutex<Option<ProgressBar>>,
    quiet: bool,
}

impl Progress {
    /// Create a new progress reporter.
    ///
    /// # Arguments
    ///
    /// * `quiet` - If true, nothing is displayed.
    ///
    /// # Examples
    ///
    /// ```
    /// use clonesweep::progress::Progress;
    ///
    /// let progress = Progress::new(false);
    /// ```
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self {
            bar: Mutex::new(None),
            quiet,
        }
    }

    fn style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {pos} entries {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
    }
}

impl ProgressCallback for Progress {
    fn on_scan_start(&self, _roots: &[PathBuf]) {
        if self.quiet {
            return;
        }

        let pb = ProgressBar::new_spinner();
        pb.set_style(Self::style());
        pb.enable_steady_tick(Duration::from_millis(100));
        *self.bar.lock().unwrap_or_else(PoisonError::into_inner) = Some(pb);
    }

    fn on_entry(&self, name: &str, skipped: bool) {
        if self.quiet {
            return;
        }

        if let Some(ref pb) = *self.bar.lock().unwrap_or_else(PoisonError::into_inner) {
            pb.set_message(entry_message(name, skipped));
            pb.inc(1);
        }
    }

    fn on_scan_end(&self, entries: usize) {
        if let Some(pb) = self
            .bar
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            pb.finish_with_message(format!("Scan complete ({entries} entries)"));
        }
    }
}

/// Format the per-entry status line.
fn entry_message(name: &str, skipped: bool) -> String {
    let status = if skipped {
        "SKIPPING"
    } else {
        "CALCULATING HASH"
    };
    format!("{:<30}: {status}", truncate_name(name, 30))
}

/// Truncate a name to `max_len` characters, keeping its tail.
fn truncate_name(name: &str, max_len: usize) -> String {
    let count = name.chars().count();
    if count <= max_len {
        return name.to_string();
    }
    let tail: String = name.chars().skip(count - (max_len - 3)).collect();
    format!("...{tail}")
}
