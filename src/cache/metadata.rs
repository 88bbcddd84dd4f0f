//! Cache metadata and its declared key set.

use serde::{Deserialize, Serialize};

/// Timestamp format used for `time_created` and `time_updated`.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// The metadata keys this build reads and writes.
///
/// A cache file whose metadata object has any other key set is rejected.
pub const KEYS: [&str; 4] = ["time_created", "time_updated", "times_loaded", "hash_algorithm"];

/// The `metadata` section of the cache file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheMetadata {
    /// When the cache was first created
    pub time_created: String,
    /// When the cache was last written, `None` until the first write
    pub time_updated: Option<String>,
    /// How many times the cache has been loaded successfully
    pub times_loaded: u64,
    /// Algorithm that produced the stored digests, empty when unset
    pub hash_algorithm: String,
}

impl CacheMetadata {
    /// Fresh metadata stamped with the current time.
    #[must_use]
    pub fn new() -> Self {
        Self {
            time_created: current_time(),
            time_updated: None,
            times_loaded: 0,
            hash_algorithm: String::new(),
        }
    }
}

impl Default for CacheMetadata {
    fn default() -> Self {
        Self::new()
    }
}

/// Compare a stored key set against [`KEYS`].
///
/// Returns `(missing, unexpected)`; both empty means the sets match.
#[must_use]
pub fn key_mismatch<'a, I>(stored: I) -> (Vec<String>, Vec<String>)
where
    I: IntoIterator<Item = &'a str>,
{
    let stored: Vec<&str> = stored.into_iter().collect();
    let missing = KEYS
        .iter()
        .filter(|k| !stored.contains(*k))
        .map(|k| (*k).to_string())
        .collect();
    let unexpected = stored
        .iter()
        .filter(|k| !KEYS.contains(*k))
        .map(|k| (*k).to_string())
        .collect();
    (missing, unexpected)
}

/// Local time formatted with [`TIME_FORMAT`].
#[must_use]
pub fn current_time() -> String {
    chrono::Local::now().format(TIME_FORMAT).to_string()
}
