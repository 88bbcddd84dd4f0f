//! CloneSweep - Duplicate File Finder
//!
//! Walks directory trees, hashes every file it has not seen before, and keeps
//! each digest in a JSON cache keyed by file name and validated by
//! modification time. Files sharing a digest are written out as a duplicate
//! report. Repeated scans of an unchanged tree compute no hashes at all.

pub mod cache;
pub mod cli;
pub mod commands;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod signal;

use anyhow::{Context, Result};

use crate::cli::{Cli, Commands};
use crate::commands::CommandContext;
use crate::config::Settings;
use crate::error::ExitCode;

/// Run the application for already-parsed arguments.
///
/// # Errors
///
/// Returns an error when settings cannot be located or loaded, a scan path
/// is invalid, a file cannot be written, or the scan is interrupted
/// ([`duplicates::FinderError::Interrupted`]).
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);
    if cli.no_color {
        yansi::disable();
    }
    commands::warn_if_unprivileged();

    let settings_path = match cli.config {
        Some(path) => path,
        None => Settings::default_path().context("Failed to locate the settings file")?,
    };
    let ctx = CommandContext {
        settings_path,
        cache_path: cli.cache,
        report_path: cli.report,
        quiet: cli.quiet,
    };
    log::debug!("Using {:?}", ctx);

    match cli.command {
        Commands::Scan(args) => commands::scan(&ctx, &args),
        Commands::ClearCache => commands::clear_cache(&ctx),
        Commands::ClearDuplicates => commands::clear_duplicates(&ctx),
        Commands::Exclude(args) => commands::exclude(&ctx, &args),
        Commands::ClearExclusions => commands::clear_exclusions(&ctx),
        Commands::Settings => commands::show_settings(&ctx),
    }
}
