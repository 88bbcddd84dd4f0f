use clonesweep::cache::{HashCache, LoadState};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

/// The file left on disk after recovery must itself load cleanly and be empty.
fn assert_regenerated(path: &Path) {
    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(value["data"], serde_json::json!({}));
    assert_eq!(value["metadata"]["times_loaded"], 0);

    let (cache, state) = HashCache::open(path);
    assert_eq!(state, LoadState::Valid);
    assert!(cache.data().is_empty());
}

#[test]
fn test_invalid_json_regenerates() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cache.json");
    fs::write(&path, "{ this is not json").unwrap();

    let (cache, state) = HashCache::open(&path);

    assert!(matches!(state, LoadState::Corrupt(_)));
    assert!(state.to_string().contains("corrupt"));
    assert!(cache.data().is_empty());
    assert_regenerated(&path);
}

#[test]
fn test_empty_file_regenerates() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cache.json");
    fs::write(&path, "").unwrap();

    let (_, state) = HashCache::open(&path);

    assert!(matches!(state, LoadState::Corrupt(_)));
    assert_regenerated(&path);
}

#[test]
fn test_extra_metadata_key_regenerates() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cache.json");
    fs::write(
        &path,
        r#"{
            "metadata": {
                "time_created": "2024-01-01 00:00:00",
                "time_updated": null,
                "times_loaded": 3,
                "hash_algorithm": "md5",
                "owner": "someone"
            },
            "data": {
                "a.txt": [{"md5": "00", "PATH": "/a.txt", "MODIFIED_TIME": 1.0}]
            }
        }"#,
    )
    .unwrap();

    let (cache, state) = HashCache::open(&path);

    assert_eq!(
        state,
        LoadState::SchemaMismatch {
            missing: Vec::new(),
            unexpected: vec!["owner".to_string()],
        }
    );
    assert!(cache.data().is_empty());
    assert_regenerated(&path);
}

#[test]
fn test_missing_metadata_key_regenerates() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cache.json");
    fs::write(
        &path,
        r#"{
            "metadata": {
                "time_created": "2024-01-01 00:00:00",
                "time_updated": null,
                "hash_algorithm": "md5"
            },
            "data": {}
        }"#,
    )
    .unwrap();

    let (_, state) = HashCache::open(&path);

    assert_eq!(
        state,
        LoadState::SchemaMismatch {
            missing: vec!["times_loaded".to_string()],
            unexpected: Vec::new(),
        }
    );
    assert_regenerated(&path);
}

#[test]
fn test_missing_metadata_section_regenerates() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cache.json");
    fs::write(&path, r#"{"data": {}}"#).unwrap();

    let (_, state) = HashCache::open(&path);

    assert!(matches!(state, LoadState::SchemaMismatch { .. }));
    assert_regenerated(&path);
}

#[test]
fn test_malformed_record_regenerates() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cache.json");
    fs::write(
        &path,
        r#"{
            "metadata": {
                "time_created": "2024-01-01 00:00:00",
                "time_updated": null,
                "times_loaded": 0,
                "hash_algorithm": "md5"
            },
            "data": {
                "a.txt": [{"md5": "00", "PATH": "/a.txt"}]
            }
        }"#,
    )
    .unwrap();

    let (_, state) = HashCache::open(&path);

    assert!(matches!(state, LoadState::Corrupt(_)));
    assert_regenerated(&path);
}

#[test]
fn test_top_level_array_regenerates() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cache.json");
    fs::write(&path, "[1, 2, 3]").unwrap();

    let (_, state) = HashCache::open(&path);

    assert!(matches!(state, LoadState::Corrupt(_)));
    assert_regenerated(&path);
}
