//! Duplicate grouping over cached records.
//!
//! # Overview
//!
//! Grouping is a single pass over every [`FileRecord`] in the cache. The
//! first path seen for a hash is remembered; when the hash shows up again
//! under a different path, a group is opened seeded with that first path.
//! Only hashes with two or more distinct paths end up in the report.
//!
//! The report is recomputed from the whole cache every time and never
//! merged with an earlier one.
//!
//! # Example
//!
//! ```
//! use clonesweep::cache::{CacheData, FileRecord};
//! use clonesweep::duplicates::find_duplicates;
//! use clonesweep::scanner::HashAlgorithm;
//!
//! let mut data = CacheData::new();
//! data.append("a.txt", FileRecord::new(HashAlgorithm::Md5, "h1", "/d/a.txt", 1.0));
//! data.append("b.txt", FileRecord::new(HashAlgorithm::Md5, "h1", "/d/b.txt", 1.0));
//! data.append("c.txt", FileRecord::new(HashAlgorithm::Md5, "h2", "/d/c.txt", 1.0));
//!
//! let report = find_duplicates(&data);
//! assert_eq!(report.len(), 1);
//! assert_eq!(report.get("h1").unwrap().paths, vec!["/d/a.txt", "/d/b.txt"]);
//! ```
//!
//! [`FileRecord`]: crate::cache::FileRecord

use std::collections::HashMap;

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::cache::CacheData;

/// Paths sharing one content hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    /// The shared digest
    pub hash: String,
    /// Distinct paths, first-seen first
    pub paths: Vec<String>,
}

impl DuplicateGroup {
    fn new(hash: &str, first: &str) -> Self {
        Self {
            hash: hash.to_string(),
            paths: vec![first.to_string()],
        }
    }

    /// Number of paths in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Check if this group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// Hash to paths mapping produced by [`find_duplicates`].
///
/// Serializes as a JSON object `{ "<hash>": ["<path>", ...] }` with groups
/// in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DuplicateReport {
    groups: Vec<DuplicateGroup>,
}

impl DuplicateReport {
    /// All groups in discovery order.
    #[must_use]
    pub fn groups(&self) -> &[DuplicateGroup] {
        &self.groups
    }

    /// Group for `hash`, if it has duplicates.
    #[must_use]
    pub fn get(&self, hash: &str) -> Option<&DuplicateGroup> {
        self.groups.iter().find(|g| g.hash == hash)
    }

    /// Number of groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether no duplicates were found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of paths across all groups.
    #[must_use]
    pub fn total_files(&self) -> usize {
        self.groups.iter().map(DuplicateGroup::len).sum()
    }

    /// Number of redundant copies (every path beyond the first per group).
    #[must_use]
    pub fn duplicate_files(&self) -> usize {
        self.groups.iter().map(|g| g.len().saturating_sub(1)).sum()
    }
}

impl Serialize for DuplicateReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.groups.len()))?;
        for group in &self.groups {
            map.serialize_entry(&group.hash, &group.paths)?;
        }
        map.end()
    }
}

/// Group every cached record by hash.
#[must_use]
pub fn find_duplicates(data: &CacheData) -> DuplicateReport {
    let mut first_seen: HashMap<&str, &str> = HashMap::new();
    let mut group_index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<DuplicateGroup> = Vec::new();

    for record in data.records() {
        let hash = record.hash.as_str();
        let path = record.path.as_str();

        let Some(&first) = first_seen.get(hash) else {
            first_seen.insert(hash, path);
            continue;
        };
        if first == path {
            continue;
        }

        let idx = *group_index.entry(hash).or_insert_with(|| {
            groups.push(DuplicateGroup::new(hash, first));
            groups.len() - 1
        });
        let group = &mut groups[idx];
        if !group.paths.iter().any(|p| p == path) {
            group.paths.push(path.to_string());
        }
    }

    log::debug!(
        "Grouped {} records into {} duplicate groups",
        data.record_count(),
        groups.len()
    );

    DuplicateReport { groups }
}
