//! Signal handling for graceful shutdown.
//!
//! Ctrl+C sets a shared `AtomicBool`. The walker checks it between entries,
//! so an interrupted scan stops promptly, skips the cache write and exits
//! with code 130.
//!
//! # Usage
//!
//! ```rust,no_run
//! use clonesweep::signal::install_handler;
//! use clonesweep::duplicates::FinderConfig;
//!
//! let handler = install_handler();
//! let config = FinderConfig::default().with_shutdown_flag(handler.get_flag());
//! ```

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Shared shutdown flag.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandler {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandler {
    /// Create a handler with no shutdown requested.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if shutdown has been requested.
    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Manually request a shutdown.
    pub fn request_shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Get a clone of the shutdown flag for the finder and walker.
    #[must_use]
    pub fn get_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }

    /// Reset the shutdown flag to `false`.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

static GLOBAL_HANDLER: OnceLock<ShutdownHandler> = OnceLock::new();

/// Install the Ctrl+C handler, or reuse the one already installed.
///
/// The process-wide hook can only be registered once, so later calls (for
/// example from tests running `run_app` repeatedly) get the existing
/// handler back with its flag reset.
///
/// If the hook was already registered elsewhere, an unhooked handler is
/// returned; it still honors [`ShutdownHandler::request_shutdown`].
pub fn install_handler() -> ShutdownHandler {
    if let Some(handler) = GLOBAL_HANDLER.get() {
        handler.reset();
        return handler.clone();
    }

    let handler = ShutdownHandler::new();
    let flag = handler.get_flag();

    let installed = ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
        let _ = writeln!(std::io::stderr(), "\nInterrupted. Stopping scan...");
        let _ = std::io::stderr().flush();
        log::info!("Shutdown signal received");
    });

    if let Err(e) = installed {
        log::debug!("Ctrl+C handler not installed ({e}), using unhooked handler");
        let existing = GLOBAL_HANDLER.get_or_init(ShutdownHandler::new);
        existing.reset();
        return existing.clone();
    }
    GLOBAL_HANDLER.get_or_init(|| handler).clone()
}
