use clonesweep::cache::HashCache;
use clonesweep::config::Settings;
use clonesweep::duplicates::{DuplicateFinder, FinderConfig};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

/// MD5 of `b"hello"`.
const HELLO_MD5: &str = "5d41402abc4b2a76b9719d911017c592";

fn settings() -> Settings {
    Settings {
        default_paths_skip: Vec::new(),
        ..Settings::default()
    }
}

/// Cache and report live next to `scan`, never inside it.
fn finder_in(dir: &TempDir) -> DuplicateFinder {
    let (cache, _) = HashCache::open(dir.path().join("cache.json"));
    let config = FinderConfig::default()
        .with_settings(settings())
        .with_report_path(dir.path().join("duplicates.json"));
    DuplicateFinder::new(config, cache)
}

fn scan_dir(dir: &TempDir) -> PathBuf {
    let scan = dir.path().join("scan");
    fs::create_dir_all(&scan).unwrap();
    scan
}

fn write(path: &Path, content: &[u8]) {
    File::create(path).unwrap().write_all(content).unwrap();
}

fn path_str(p: &Path) -> String {
    p.to_string_lossy().into_owned()
}

#[test]
fn test_scan_empty_directory() {
    let dir = tempdir().unwrap();
    let scan = scan_dir(&dir);
    let mut finder = finder_in(&dir);

    let (report, summary) = finder.find_duplicates(&[scan], true).unwrap();

    assert!(report.is_empty());
    assert_eq!(summary.total_files, 0);
    assert_eq!(summary.duplicate_groups, 0);
    assert!(!summary.duplicates_found());
}

#[test]
fn test_scan_unique_files() {
    let dir = tempdir().unwrap();
    let scan = scan_dir(&dir);
    write(&scan.join("a.txt"), b"content a");
    write(&scan.join("b.txt"), b"content b");
    write(&scan.join("c.txt"), b"content c");

    let mut finder = finder_in(&dir);
    let (report, summary) = finder.find_duplicates(&[scan], false).unwrap();

    assert!(report.is_empty());
    assert_eq!(summary.total_files, 3);
    assert_eq!(summary.files_hashed, 3);
    assert_eq!(summary.duplicate_groups, 0);
}

#[test]
fn test_report_file_matches_expected_mapping() {
    let dir = tempdir().unwrap();
    let scan = scan_dir(&dir);
    write(&scan.join("a.txt"), b"hello");
    write(&scan.join("b.txt"), b"hello");

    let mut finder = finder_in(&dir);
    let (report, summary) = finder.find_duplicates(&[scan.clone()], false).unwrap();

    assert_eq!(summary.duplicate_groups, 1);
    assert_eq!(summary.duplicate_files, 1);
    let group = report.get(HELLO_MD5).expect("md5 group present");
    assert_eq!(
        group.paths,
        vec![path_str(&scan.join("a.txt")), path_str(&scan.join("b.txt"))]
    );

    let written: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("duplicates.json")).unwrap())
            .unwrap();
    let expected = serde_json::json!({
        HELLO_MD5: [path_str(&scan.join("a.txt")), path_str(&scan.join("b.txt"))]
    });
    assert_eq!(written, expected);
}

#[test]
fn test_same_name_in_different_directories() {
    let dir = tempdir().unwrap();
    let scan = scan_dir(&dir);
    let left = scan.join("left");
    let right = scan.join("right");
    fs::create_dir(&left).unwrap();
    fs::create_dir(&right).unwrap();
    write(&left.join("photo.jpg"), b"pixels");
    write(&right.join("photo.jpg"), b"pixels");

    let mut finder = finder_in(&dir);
    let (report, _) = finder.find_duplicates(&[scan], true).unwrap();

    assert_eq!(report.len(), 1);
    assert_eq!(report.groups()[0].paths.len(), 2);
    assert_eq!(finder.cache().data().get("photo.jpg").unwrap().len(), 2);
}

#[test]
fn test_top_level_scan_ignores_subdirectories() {
    let dir = tempdir().unwrap();
    let scan = scan_dir(&dir);
    let sub = scan.join("subdir");
    fs::create_dir(&sub).unwrap();
    write(&scan.join("a.txt"), b"duplicate");
    write(&sub.join("b.txt"), b"duplicate");

    let mut finder = finder_in(&dir);
    let (report, summary) = finder.find_duplicates(&[scan.clone()], false).unwrap();
    assert!(report.is_empty());
    assert_eq!(summary.total_files, 1);

    let (report, summary) = finder.find_duplicates(&[scan], true).unwrap();
    assert_eq!(report.len(), 1);
    assert_eq!(summary.total_files, 2);
}

#[test]
fn test_deeply_nested_tree() {
    let dir = tempdir().unwrap();
    let scan = scan_dir(&dir);
    let mut deep = scan.clone();
    for i in 0..40 {
        deep = deep.join(format!("level{i}"));
    }
    fs::create_dir_all(&deep).unwrap();
    write(&scan.join("top.bin"), b"deep copy");
    write(&deep.join("bottom.bin"), b"deep copy");

    let mut finder = finder_in(&dir);
    let (report, _) = finder.find_duplicates(&[scan], true).unwrap();

    assert_eq!(report.len(), 1);
}

#[test]
fn test_multiple_roots_share_groups() {
    let dir = tempdir().unwrap();
    let first = dir.path().join("first");
    let second = dir.path().join("second");
    fs::create_dir(&first).unwrap();
    fs::create_dir(&second).unwrap();
    write(&first.join("one.txt"), b"shared");
    write(&second.join("two.txt"), b"shared");

    let mut finder = finder_in(&dir);
    let (report, _) = finder.find_duplicates(&[first, second], true).unwrap();

    assert_eq!(report.len(), 1);
    assert_eq!(report.total_files(), 2);
}

#[test]
fn test_rerun_without_changes_is_identical_and_hash_free() {
    let dir = tempdir().unwrap();
    let scan = scan_dir(&dir);
    write(&scan.join("a.txt"), b"hello");
    write(&scan.join("b.txt"), b"hello");
    write(&scan.join("c.txt"), b"other");

    let mut finder = finder_in(&dir);
    let (first, _) = finder.find_duplicates(&[scan.clone()], true).unwrap();
    let first_report = fs::read_to_string(dir.path().join("duplicates.json")).unwrap();
    drop(finder);

    // A fresh finder reloads the persisted cache from disk.
    let mut finder = finder_in(&dir);
    let (second, summary) = finder.find_duplicates(&[scan], true).unwrap();
    let second_report = fs::read_to_string(dir.path().join("duplicates.json")).unwrap();

    assert_eq!(first, second);
    assert_eq!(first_report, second_report);
    assert_eq!(summary.files_hashed, 0);
    assert_eq!(summary.cache_hits, 3);
    assert_eq!(finder.cache().metadata().times_loaded, 1);
}

#[test]
fn test_empty_files_are_duplicates_of_each_other() {
    let dir = tempdir().unwrap();
    let scan = scan_dir(&dir);
    write(&scan.join("empty1"), b"");
    write(&scan.join("empty2"), b"");

    let mut finder = finder_in(&dir);
    let (report, _) = finder.find_duplicates(&[scan], false).unwrap();

    assert_eq!(report.len(), 1);
    assert!(report.get("d41d8cd98f00b204e9800998ecf8427e").is_some());
}

#[cfg(unix)]
#[test]
fn test_symlinks_are_not_followed() {
    let dir = tempdir().unwrap();
    let scan = scan_dir(&dir);
    let outside = dir.path().join("outside");
    fs::create_dir(&outside).unwrap();
    write(&outside.join("target.txt"), b"linked");
    write(&scan.join("real.txt"), b"linked");
    std::os::unix::fs::symlink(&outside, scan.join("link_dir")).unwrap();
    std::os::unix::fs::symlink(scan.join("real.txt"), scan.join("link.txt")).unwrap();

    let mut finder = finder_in(&dir);
    let (report, summary) = finder.find_duplicates(&[scan], true).unwrap();

    assert!(report.is_empty());
    assert_eq!(summary.total_files, 1);
    assert_eq!(summary.skipped_entries, 2);
    assert!(finder.cache().data().get("link.txt").is_none());
}
