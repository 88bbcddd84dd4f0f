use clonesweep::cache::HashCache;
use clonesweep::config::Settings;
use clonesweep::duplicates::{DuplicateFinder, FinderConfig, FinderError};
use clonesweep::error::ExitCode;
use clonesweep::signal::ShutdownHandler;
use std::fs;
use tempfile::tempdir;

fn settings() -> Settings {
    Settings {
        default_paths_skip: Vec::new(),
        ..Settings::default()
    }
}

#[cfg(unix)]
fn running_as_root() -> bool {
    clonesweep::commands::is_elevated() == Some(true)
}

#[cfg(unix)]
#[test]
fn test_unreadable_file_is_recorded_and_scan_continues() {
    use std::os::unix::fs::PermissionsExt;

    if running_as_root() {
        eprintln!("skipping: permissions are not enforced for root");
        return;
    }

    let dir = tempdir().unwrap();
    let scan = dir.path().join("scan");
    fs::create_dir(&scan).unwrap();
    fs::write(scan.join("a.txt"), "same").unwrap();
    fs::write(scan.join("b.txt"), "same").unwrap();
    let locked = scan.join("locked.txt");
    fs::write(&locked, "secret").unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    let (cache, _) = HashCache::open(dir.path().join("cache.json"));
    let mut finder = DuplicateFinder::new(FinderConfig::default().with_settings(settings()), cache);
    let result = finder.find_duplicates(&[scan.clone()], false);

    fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();
    let (report, summary) = result.unwrap();

    assert_eq!(summary.scan_errors.len(), 1);
    assert_eq!(summary.scan_errors[0].path(), locked.as_path());
    assert_eq!(report.len(), 1);
    assert!(finder.cache().data().get("a.txt").is_some());
    assert!(finder.cache().data().get("locked.txt").is_none());
    assert_eq!(ExitCode::from_summary(&summary), ExitCode::PartialSuccess);
}

#[cfg(unix)]
#[test]
fn test_unreadable_directory_is_recorded_and_scan_continues() {
    use std::os::unix::fs::PermissionsExt;

    if running_as_root() {
        eprintln!("skipping: permissions are not enforced for root");
        return;
    }

    let dir = tempdir().unwrap();
    let scan = dir.path().join("scan");
    let closed = scan.join("closed");
    fs::create_dir_all(&closed).unwrap();
    fs::write(closed.join("hidden.txt"), "x").unwrap();
    fs::write(scan.join("visible.txt"), "y").unwrap();
    fs::set_permissions(&closed, fs::Permissions::from_mode(0o000)).unwrap();

    let (cache, _) = HashCache::open(dir.path().join("cache.json"));
    let mut finder = DuplicateFinder::new(FinderConfig::default().with_settings(settings()), cache);
    let result = finder.find_duplicates(&[scan], true);

    fs::set_permissions(&closed, fs::Permissions::from_mode(0o755)).unwrap();
    let (_, summary) = result.unwrap();

    assert_eq!(summary.scan_errors.len(), 1);
    assert!(finder.cache().data().get("visible.txt").is_some());
}

#[test]
fn test_shutdown_before_scan_is_interrupted() {
    let dir = tempdir().unwrap();
    let scan = dir.path().join("scan");
    fs::create_dir(&scan).unwrap();
    fs::write(scan.join("a.txt"), "data").unwrap();
    let cache_path = dir.path().join("cache.json");
    let report_path = dir.path().join("duplicates.json");

    let handler = ShutdownHandler::new();
    handler.request_shutdown();

    let cache = HashCache::new(&cache_path);
    let config = FinderConfig::default()
        .with_settings(settings())
        .with_report_path(report_path.clone())
        .with_shutdown_flag(handler.get_flag());
    let mut finder = DuplicateFinder::new(config, cache);

    let err = finder.find_duplicates(&[scan], true).unwrap_err();

    assert!(matches!(err, FinderError::Interrupted));
    assert!(!cache_path.exists());
    assert!(!report_path.exists());
}

#[test]
fn test_unwritable_report_is_not_fatal() {
    let dir = tempdir().unwrap();
    let scan = dir.path().join("scan");
    fs::create_dir(&scan).unwrap();
    fs::write(scan.join("a.txt"), "same").unwrap();
    fs::write(scan.join("b.txt"), "same").unwrap();

    // A directory where the report file should go cannot be overwritten.
    let report_path = dir.path().join("report_dir");
    fs::create_dir(&report_path).unwrap();

    let (cache, _) = HashCache::open(dir.path().join("cache.json"));
    let config = FinderConfig::default()
        .with_settings(settings())
        .with_report_path(report_path);
    let mut finder = DuplicateFinder::new(config, cache);
    let (report, summary) = finder.find_duplicates(&[scan], false).unwrap();

    assert_eq!(report.len(), 1);
    assert!(summary.report_error.is_some());
    assert!(summary.has_errors());
    assert_eq!(summary.error_messages().len(), 1);
}
