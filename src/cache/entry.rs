//! Cache record definitions.
//!
//! A [`FileRecord`] serializes as a flat JSON object keyed by the digest
//! algorithm that produced it:
//!
//! ```json
//! { "md5": "5d41402abc4b2a76b9719d911017c592", "PATH": "/data/a.txt", "MODIFIED_TIME": 1700000000.25 }
//! ```

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};

use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

use crate::scanner::HashAlgorithm;

const PATH_KEY: &str = "PATH";
const MODIFIED_KEY: &str = "MODIFIED_TIME";
const FIELDS: &[&str] = &[
    "md5",
    "sha1",
    "sha224",
    "sha256",
    "sha384",
    "sha512",
    "blake3",
    PATH_KEY,
    MODIFIED_KEY,
];

/// One observed instance of a file.
#[derive(Debug, Clone, PartialEq)]
pub struct FileRecord {
    /// Algorithm that produced `hash`
    pub algorithm: HashAlgorithm,
    /// Lowercase hex digest of the file contents
    pub hash: String,
    /// Absolute path of the file when it was hashed
    pub path: String,
    /// Modification time in seconds since the Unix epoch
    pub modified: f64,
}

impl FileRecord {
    /// Create a new record.
    #[must_use]
    pub fn new(
        algorithm: HashAlgorithm,
        hash: impl Into<String>,
        path: impl Into<String>,
        modified: f64,
    ) -> Self {
        Self {
            algorithm,
            hash: hash.into(),
            path: path.into(),
            modified,
        }
    }

    /// Whether this record still describes the file at `path` with mtime `modified`.
    #[must_use]
    pub fn matches(&self, path: &str, modified: f64) -> bool {
        self.path == path && self.modified == modified
    }
}

impl Serialize for FileRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry(self.algorithm.name(), &self.hash)?;
        map.serialize_entry(PATH_KEY, &self.path)?;
        map.serialize_entry(MODIFIED_KEY, &self.modified)?;
        map.end()
    }
}

impl<'de> Deserialize<'de> for FileRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(RecordVisitor)
    }
}

struct RecordVisitor;

impl<'de> Visitor<'de> for RecordVisitor {
    type Value = FileRecord;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a file record with one digest, PATH and MODIFIED_TIME")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<FileRecord, A::Error> {
        let mut digest: Option<(HashAlgorithm, String)> = None;
        let mut path: Option<String> = None;
        let mut modified: Option<f64> = None;

        while let Some(key) = map.next_key::<String>()? {
            match key.as_str() {
                PATH_KEY => {
                    if path.is_some() {
                        return Err(de::Error::duplicate_field(PATH_KEY));
                    }
                    path = Some(map.next_value()?);
                }
                MODIFIED_KEY => {
                    if modified.is_some() {
                        return Err(de::Error::duplicate_field(MODIFIED_KEY));
                    }
                    modified = Some(map.next_value()?);
                }
                other => {
                    let algorithm = other
                        .parse::<HashAlgorithm>()
                        .map_err(|_| de::Error::unknown_field(other, FIELDS))?;
                    if digest.is_some() {
                        return Err(de::Error::custom("record holds more than one digest"));
                    }
                    digest = Some((algorithm, map.next_value()?));
                }
            }
        }

        let (algorithm, hash) = digest.ok_or_else(|| de::Error::custom("record has no digest"))?;
        Ok(FileRecord {
            algorithm,
            hash,
            path: path.ok_or_else(|| de::Error::missing_field(PATH_KEY))?,
            modified: modified.ok_or_else(|| de::Error::missing_field(MODIFIED_KEY))?,
        })
    }
}

/// Counts from a [`CacheData::reconcile`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileStats {
    /// Older records dropped because a newer one exists for the same path
    pub superseded: usize,
    /// Records dropped because their path was excluded during the scan
    pub excluded: usize,
    /// Records dropped because their file no longer exists
    pub missing: usize,
    /// Filename keys left empty and removed
    pub empty_entries: usize,
}

impl ReconcileStats {
    /// Total records removed.
    #[must_use]
    pub fn records_removed(&self) -> usize {
        self.superseded + self.excluded + self.missing
    }
}

/// Filename to records mapping, the `data` section of the cache file.
///
/// Keys are base names, so files in different directories sharing a name
/// share one entry. Records within an entry keep discovery order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheData(BTreeMap<String, Vec<FileRecord>>);

impl CacheData {
    /// Create an empty mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache hit test: some record under `name` has this exact path and mtime.
    #[must_use]
    pub fn is_cached(&self, name: &str, path: &str, modified: f64) -> bool {
        self.0
            .get(name)
            .is_some_and(|records| records.iter().any(|r| r.matches(path, modified)))
    }

    /// Append a record under `name`, creating the entry if needed.
    pub fn append(&mut self, name: impl Into<String>, record: FileRecord) {
        self.0.entry(name.into()).or_default().push(record);
    }

    /// Records stored under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&[FileRecord]> {
        self.0.get(name).map(Vec::as_slice)
    }

    /// Every record, in key order then discovery order.
    pub fn records(&self) -> impl Iterator<Item = &FileRecord> {
        self.0.values().flatten()
    }

    /// Iterate over `(filename, records)` pairs.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &[FileRecord])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Number of filename keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no filename keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Total number of records across all keys.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Tidy the mapping after a complete traversal.
    ///
    /// Within each filename, only the most recently appended record per path
    /// survives. Records for `excluded_files`, or nested in `excluded_dirs`,
    /// are dropped, and so are records whose file is gone when
    /// `prune_missing` is set. Entries left empty are removed.
    pub fn reconcile(
        &mut self,
        excluded_files: &HashSet<String>,
        excluded_dirs: &[PathBuf],
        prune_missing: bool,
    ) -> ReconcileStats {
        let mut stats = ReconcileStats::default();

        for records in self.0.values_mut() {
            let before = records.len();
            let mut seen = HashSet::with_capacity(before);
            let mut kept: Vec<FileRecord> = records
                .drain(..)
                .rev()
                .filter(|r| seen.insert(r.path.clone()))
                .collect();
            kept.reverse();
            stats.superseded += before - kept.len();

            let before = kept.len();
            kept.retain(|r| {
                let path = Path::new(&r.path);
                !excluded_files.contains(&r.path) && !excluded_dirs.iter().any(|d| path.starts_with(d))
            });
            stats.excluded += before - kept.len();

            if prune_missing {
                let before = kept.len();
                kept.retain(|r| Path::new(&r.path).is_file());
                stats.missing += before - kept.len();
            }

            *records = kept;
        }

        let before = self.0.len();
        self.0.retain(|_, records| !records.is_empty());
        stats.empty_entries = before - self.0.len();

        stats
    }
}
