//! Subcommand handlers.
//!
//! Each handler turns one parsed [`Commands`](crate::cli::Commands) variant
//! into calls on the library and prints the user-facing result. Failures
//! are returned as `anyhow` errors with context; the binary maps them to
//! exit codes.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};

use crate::cache::HashCache;
use crate::cli::{ExcludeArgs, ScanArgs};
use crate::config::Settings;
use crate::duplicates::{DuplicateFinder, FinderConfig, ScanSummary};
use crate::error::ExitCode;
use crate::output::{clear_report, to_json_pretty};
use crate::progress::Progress;
use crate::scanner::path_utils::{absolutize, remove_redundant_roots, validate_directories};
use crate::signal::install_handler;

/// File locations and output mode shared by every handler.
#[derive(Debug, Clone)]
pub struct CommandContext {
    /// Settings file
    pub settings_path: PathBuf,
    /// Hash cache file
    pub cache_path: PathBuf,
    /// Duplicate report file
    pub report_path: PathBuf,
    /// Suppress result output and the progress spinner
    pub quiet: bool,
}

/// Whether the process runs with elevated privileges.
///
/// Returns `None` where this cannot be determined.
#[must_use]
pub fn is_elevated() -> Option<bool> {
    #[cfg(unix)]
    {
        // SAFETY: geteuid has no preconditions and cannot fail.
        Some(unsafe { libc::geteuid() } == 0)
    }
    #[cfg(not(unix))]
    {
        None
    }
}

/// Log a notice when running unprivileged, since protected files will
/// then show up as scan errors.
pub fn warn_if_unprivileged() {
    if is_elevated() == Some(false) {
        log::info!("Non-administrative privileges detected, run with sudo for best experience.");
    }
}

/// Run a scan and print its result.
///
/// # Errors
///
/// Fails when a path is not an existing directory, settings cannot be
/// loaded, or the scan is interrupted.
pub fn scan(ctx: &CommandContext, args: &ScanArgs) -> Result<ExitCode> {
    let requested = if args.paths.is_empty() {
        vec![std::env::current_dir().context("Failed to determine the current directory")?]
    } else {
        args.paths.clone()
    };

    let roots = match validate_directories(&requested) {
        Ok(roots) => roots,
        Err(invalid) => {
            let listed = invalid
                .iter()
                .map(|p| format!("\"{}\"", p.display()))
                .collect::<Vec<_>>()
                .join(", ");
            bail!("Not a valid path or directory: {listed}");
        }
    };

    let (roots, redundant) = remove_redundant_roots(roots, args.recursive);
    if !redundant.is_empty() {
        log::info!("Following path(s) are redundant and will be excluded from the scan:");
        for path in &redundant {
            log::info!("\t\"{}\"", path.display());
        }
    }
    log::info!(
        "Scan path(s): {}",
        roots
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let settings = Settings::load_from_path(&ctx.settings_path).with_context(|| {
        format!("Failed to load settings from {}", ctx.settings_path.display())
    })?;

    let handler = install_handler();
    let mut config = FinderConfig::default()
        .with_settings(settings)
        .with_report_path(ctx.report_path.clone())
        .with_shutdown_flag(handler.get_flag());
    if !ctx.quiet {
        config = config.with_progress_callback(Arc::new(Progress::new(false)));
    }

    let (cache, _state) = HashCache::open(&ctx.cache_path);
    let mut finder = DuplicateFinder::new(config, cache);
    let (_report, summary) = finder.find_duplicates(&roots, args.recursive)?;

    log::info!(
        "Visited {} entries: {} files, {} hashed, {} cached, {} skipped in {:.2?}",
        summary.total_entries,
        summary.total_files,
        summary.files_hashed,
        summary.cache_hits,
        summary.skipped_entries,
        summary.scan_duration
    );

    if !ctx.quiet {
        print_summary(ctx, &summary);
    }
    print_errors(&summary);

    Ok(ExitCode::from_summary(&summary))
}

fn print_summary(ctx: &CommandContext, summary: &ScanSummary) {
    use yansi::Paint;

    let heading = "SCAN FINISHED".green().bold();
    if summary.duplicates_found() {
        println!(
            "\n{heading}: See \"{}\" for identified duplicates ({} group(s), {} duplicate file(s)).",
            absolutize(&ctx.report_path).display(),
            summary.duplicate_groups,
            summary.duplicate_files
        );
    } else {
        println!("\n{heading}: No duplicates were detected.");
    }
}

fn print_errors(summary: &ScanSummary) {
    use yansi::Paint;

    let messages = summary.error_messages();
    if messages.is_empty() {
        return;
    }
    eprintln!("\n{}", "Errors encountered during the scan:".yellow().bold());
    for message in messages {
        eprintln!("   - {message}");
    }
}

/// Reset the hash cache to an empty one.
///
/// # Errors
///
/// Fails when the emptied cache cannot be written.
pub fn clear_cache(ctx: &CommandContext) -> Result<ExitCode> {
    let mut cache = HashCache::new(&ctx.cache_path);
    HashCache::clear(&mut cache)
        .with_context(|| format!("Could not clear cache {}", ctx.cache_path.display()))?;
    if !ctx.quiet {
        println!("Cache cleared.");
    }
    Ok(ExitCode::Success)
}

/// Overwrite the duplicate report with an empty mapping.
///
/// # Errors
///
/// Fails when the report file cannot be written.
pub fn clear_duplicates(ctx: &CommandContext) -> Result<ExitCode> {
    clear_report(&ctx.report_path).context("Could not clear duplicate file")?;
    if !ctx.quiet {
        println!("Duplicates cleared.");
    }
    Ok(ExitCode::Success)
}

/// Append user exclusions to the settings file.
///
/// Nothing is written when any item is invalid.
///
/// # Errors
///
/// Fails on an invalid item or when the settings file cannot be read or
/// written.
pub fn exclude(ctx: &CommandContext, args: &ExcludeArgs) -> Result<ExitCode> {
    let mut settings = Settings::load_file(&ctx.settings_path).with_context(|| {
        format!("Failed to load settings from {}", ctx.settings_path.display())
    })?;

    let update = settings.add_exclusions(args.kind, &args.items)?;
    for item in &update.already_present {
        println!("Exclusion ('{item}') already exists.");
    }
    if update.added.is_empty() {
        return Ok(ExitCode::Success);
    }

    settings
        .save(&ctx.settings_path)
        .context("Failed to write to settings")?;
    log::debug!("Added {} exclusion(s): {:?}", args.kind, update.added);
    if !ctx.quiet {
        println!("Exclusion(s) successfully added.");
    }
    Ok(ExitCode::Success)
}

/// Empty every user exclusion list in the settings file.
///
/// # Errors
///
/// Fails when the settings file cannot be read or written.
pub fn clear_exclusions(ctx: &CommandContext) -> Result<ExitCode> {
    let mut settings = Settings::load_file(&ctx.settings_path).with_context(|| {
        format!("Failed to load settings from {}", ctx.settings_path.display())
    })?;
    settings.clear_user_exclusions();
    settings
        .save(&ctx.settings_path)
        .context("Failed to clear user defined exclusions")?;
    if !ctx.quiet {
        println!("User defined exclusions successfully cleared.");
    }
    Ok(ExitCode::Success)
}

/// Print the effective settings, environment overrides included.
///
/// # Errors
///
/// Fails when the settings cannot be loaded.
pub fn show_settings(ctx: &CommandContext) -> Result<ExitCode> {
    let settings = Settings::load_from_path(&ctx.settings_path).with_context(|| {
        format!("Failed to load settings from {}", ctx.settings_path.display())
    })?;
    println!("Settings file: {}", ctx.settings_path.display());
    println!("{}", to_json_pretty(&settings)?);
    Ok(ExitCode::Success)
}
