use clonesweep::cache::{FileRecord, HashCache, LoadState};
use clonesweep::config::Settings;
use clonesweep::duplicates::{DuplicateFinder, FinderConfig};
use clonesweep::scanner::HashAlgorithm;
use filetime::FileTime;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn finder(cache_path: &Path, algorithm: &str) -> DuplicateFinder {
    let (cache, _) = HashCache::open(cache_path);
    let settings = Settings {
        hash_algorithm: algorithm.to_string(),
        default_paths_skip: Vec::new(),
        ..Settings::default()
    };
    DuplicateFinder::new(FinderConfig::default().with_settings(settings), cache)
}

#[test]
fn test_write_then_load_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cache.json");

    let mut cache = HashCache::new(&path);
    cache.set_hash_algorithm("sha256");
    cache.data_mut().append(
        "a.txt",
        FileRecord::new(HashAlgorithm::Sha256, "ab".repeat(32), "/x/a.txt", 1_700_000_000.123_456),
    );
    cache.write().unwrap();
    let written = cache.metadata().clone();

    let (loaded, state) = HashCache::open(&path);
    assert_eq!(state, LoadState::Valid);
    assert_eq!(loaded.metadata().time_created, written.time_created);
    assert_eq!(loaded.metadata().time_updated, written.time_updated);
    assert_eq!(loaded.metadata().hash_algorithm, "sha256");
    assert_eq!(loaded.metadata().times_loaded, written.times_loaded + 1);
    assert_eq!(loaded.data(), cache.data());
}

#[test]
fn test_cache_file_layout() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cache.json");

    let mut cache = HashCache::new(&path);
    cache.set_hash_algorithm("md5");
    cache.data_mut().append(
        "a.txt",
        FileRecord::new(HashAlgorithm::Md5, "5d41402abc4b2a76b9719d911017c592", "/x/a.txt", 12.5),
    );
    cache.write().unwrap();

    let content = fs::read_to_string(&path).unwrap();
    assert!(content.contains("\n    \"metadata\""), "four-space indent");

    let value: serde_json::Value = serde_json::from_str(&content).unwrap();
    let metadata = value["metadata"].as_object().unwrap();
    let mut keys: Vec<&str> = metadata.keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(
        keys,
        vec!["hash_algorithm", "time_created", "time_updated", "times_loaded"]
    );

    let record = &value["data"]["a.txt"][0];
    assert_eq!(record["md5"], "5d41402abc4b2a76b9719d911017c592");
    assert_eq!(record["PATH"], "/x/a.txt");
    assert_eq!(record["MODIFIED_TIME"], 12.5);
}

#[test]
fn test_modified_file_is_rehashed() {
    let dir = tempdir().unwrap();
    let scan = dir.path().join("scan");
    fs::create_dir(&scan).unwrap();
    let file = scan.join("notes.txt");
    fs::write(&file, "v1").unwrap();
    filetime::set_file_mtime(&file, FileTime::from_unix_time(1_600_000_000, 0)).unwrap();

    let cache_path = dir.path().join("cache.json");
    let mut f = finder(&cache_path, "md5");
    let (_, summary) = f.find_duplicates(&[scan.clone()], false).unwrap();
    assert_eq!(summary.files_hashed, 1);

    let (_, summary) = f.find_duplicates(&[scan.clone()], false).unwrap();
    assert_eq!(summary.files_hashed, 0);
    assert_eq!(summary.cache_hits, 1);

    fs::write(&file, "v2").unwrap();
    filetime::set_file_mtime(&file, FileTime::from_unix_time(1_600_000_100, 0)).unwrap();
    let (_, summary) = f.find_duplicates(&[scan], false).unwrap();
    assert_eq!(summary.files_hashed, 1);

    let records = f.cache().data().get("notes.txt").unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].modified, 1_600_000_100.0);
}

#[test]
fn test_algorithm_change_clears_persisted_cache() {
    let dir = tempdir().unwrap();
    let scan = dir.path().join("scan");
    fs::create_dir(&scan).unwrap();
    fs::write(scan.join("a.txt"), "same").unwrap();
    fs::write(scan.join("b.txt"), "same").unwrap();
    let cache_path = dir.path().join("cache.json");

    let mut f = finder(&cache_path, "md5");
    f.find_duplicates(&[scan.clone()], false).unwrap();
    drop(f);

    let mut f = finder(&cache_path, "sha1");
    let (report, summary) = f.find_duplicates(&[scan], false).unwrap();

    assert!(summary.cache_cleared);
    assert_eq!(summary.files_hashed, 2);
    assert_eq!(report.groups()[0].hash.len(), 40);
    for record in f.cache().data().records() {
        assert_eq!(record.algorithm, HashAlgorithm::Sha1);
    }

    let (reloaded, _) = HashCache::open(&cache_path);
    assert_eq!(reloaded.hash_algorithm(), "sha1");
}

#[test]
fn test_clear_resets_and_persists() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cache.json");

    let mut cache = HashCache::new(&path);
    cache
        .data_mut()
        .append("a", FileRecord::new(HashAlgorithm::Md5, "00", "/a", 1.0));
    cache.write().unwrap();

    cache.clear().unwrap();
    assert!(cache.data().is_empty());

    let (reloaded, state) = HashCache::open(&path);
    assert!(state.is_valid());
    assert!(reloaded.data().is_empty());
}

#[test]
fn test_cache_in_missing_directory_is_created() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("deeper").join("cache.json");

    let (_, state) = HashCache::open(&path);

    assert_eq!(state, LoadState::Missing);
    assert!(path.exists());
}
