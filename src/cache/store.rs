//! JSON-backed hash cache store.

use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;
use serde_json::Value;
use tempfile::NamedTempFile;

use super::entry::CacheData;
use super::metadata::{current_time, key_mismatch, CacheMetadata};

/// Errors that can occur while persisting the cache.
#[derive(thiserror::Error, Debug)]
pub enum CacheError {
    /// The snapshot could not be serialized.
    #[error("Failed to serialize cache: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The snapshot could not be written to disk.
    #[error("Could not write cache to {path}: {source}")]
    Persist {
        /// Cache file path
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Outcome of [`HashCache::load`].
///
/// Every state other than `Valid` has already been recovered from by the
/// time `load` returns: the in-memory cache is reset and an empty cache has
/// been written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    /// The file was read and accepted.
    Valid,
    /// No cache file existed.
    Missing,
    /// The file could not be read or is not a valid cache document.
    Corrupt(String),
    /// The metadata key set differs from the one this build declares.
    SchemaMismatch {
        /// Declared keys absent from the file
        missing: Vec<String>,
        /// Keys in the file this build does not declare
        unexpected: Vec<String>,
    },
}

impl LoadState {
    /// Whether the cache was loaded from disk as-is.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

impl fmt::Display for LoadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Valid => f.write_str("Cache loaded."),
            Self::Missing => f.write_str("Cache file not found. Initializing a new cache."),
            Self::Corrupt(reason) => {
                write!(f, "Cache file is corrupt ({reason}). Regenerating cache.")
            }
            Self::SchemaMismatch {
                missing,
                unexpected,
            } => {
                let keys: Vec<&str> = missing
                    .iter()
                    .chain(unexpected)
                    .map(String::as_str)
                    .collect();
                write!(
                    f,
                    "Inconsistent metadata key(s) {keys:?} passed. Regenerating cache with keys."
                )
            }
        }
    }
}

#[derive(Serialize)]
struct SnapshotRef<'a> {
    metadata: &'a CacheMetadata,
    data: &'a CacheData,
}

#[derive(Deserialize)]
struct Snapshot {
    metadata: CacheMetadata,
    data: CacheData,
}

/// Persistent filename-keyed hash cache.
///
/// The cache is mutated in memory during a scan and written back as one
/// snapshot. Writes go to a temporary file beside the cache which is then
/// renamed over it, so a crash never leaves a half-written cache behind.
///
/// # Example
///
/// ```no_run
/// use clonesweep::cache::HashCache;
///
/// let (mut cache, state) = HashCache::open("./cache.json");
/// println!("{state}: {} names cached", cache.data().len());
/// cache.write()?;
/// # Ok::<(), clonesweep::cache::CacheError>(())
/// ```
#[derive(Debug)]
pub struct HashCache {
    path: PathBuf,
    defaults: CacheMetadata,
    metadata: CacheMetadata,
    data: CacheData,
}

impl HashCache {
    /// Create an empty cache bound to `path` without touching the disk.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let defaults = CacheMetadata::new();
        Self {
            path: path.into(),
            metadata: defaults.clone(),
            defaults,
            data: CacheData::new(),
        }
    }

    /// Create a cache bound to `path` and load it.
    pub fn open(path: impl Into<PathBuf>) -> (Self, LoadState) {
        let mut cache = Self::new(path);
        let state = cache.load();
        (cache, state)
    }

    /// Hydrate from disk.
    ///
    /// On a missing, unreadable or mismatched file the cause is logged, the
    /// cache is reset to defaults and an empty cache is written immediately.
    /// A successful load increments `times_loaded` in memory only.
    pub fn load(&mut self) -> LoadState {
        let state = match self.read_snapshot() {
            Ok(snapshot) => {
                self.metadata = snapshot.metadata;
                self.data = snapshot.data;
                self.metadata.times_loaded += 1;
                log::debug!(
                    "Loaded cache {} ({} names, loaded {} times)",
                    self.path.display(),
                    self.data.len(),
                    self.metadata.times_loaded
                );
                return LoadState::Valid;
            }
            Err(state) => state,
        };

        match state {
            LoadState::Missing => log::info!("{state}"),
            _ => log::warn!("{state}"),
        }
        self.reset();
        if let Err(e) = self.write() {
            log::warn!("{e}");
        }
        state
    }

    fn read_snapshot(&self) -> Result<Snapshot, LoadState> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(LoadState::Missing),
            Err(e) => return Err(LoadState::Corrupt(e.to_string())),
        };

        let value: Value = serde_json::from_str(&content)
            .map_err(|e| LoadState::Corrupt(format!("invalid JSON: {e}")))?;

        let Some(root) = value.as_object() else {
            return Err(LoadState::Corrupt("top level is not an object".into()));
        };

        let stored_keys: Vec<&str> = match root.get("metadata") {
            Some(Value::Object(meta)) => meta.keys().map(String::as_str).collect(),
            Some(_) => return Err(LoadState::Corrupt("metadata is not an object".into())),
            None => Vec::new(),
        };
        let (missing, unexpected) = key_mismatch(stored_keys);
        if !missing.is_empty() || !unexpected.is_empty() {
            return Err(LoadState::SchemaMismatch {
                missing,
                unexpected,
            });
        }

        serde_json::from_value(value).map_err(|e| LoadState::Corrupt(e.to_string()))
    }

    /// Persist the full snapshot, stamping `time_updated` first.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Persist`] if the file cannot be written. The
    /// in-memory cache is unaffected.
    pub fn write(&mut self) -> CacheResult<()> {
        self.metadata.time_updated = Some(current_time());

        let mut buf = Vec::new();
        let formatter = PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        SnapshotRef {
            metadata: &self.metadata,
            data: &self.data,
        }
        .serialize(&mut ser)?;

        self.persist(&buf).map_err(|source| CacheError::Persist {
            path: self.path.clone(),
            source,
        })?;

        log::debug!("Wrote cache {} ({} bytes)", self.path.display(), buf.len());
        Ok(())
    }

    fn persist(&self, bytes: &[u8]) -> io::Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }

    /// Reset to defaults and persist immediately.
    ///
    /// # Errors
    ///
    /// Returns an error if the emptied cache cannot be written.
    pub fn clear(&mut self) -> CacheResult<()> {
        self.reset();
        self.write()?;
        log::info!("Cache cleared.");
        Ok(())
    }

    fn reset(&mut self) {
        self.metadata = self.defaults.clone();
        self.data.clear();
    }

    /// Path of the cache file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current metadata.
    #[must_use]
    pub fn metadata(&self) -> &CacheMetadata {
        &self.metadata
    }

    /// Algorithm stamped into the metadata, empty when unset.
    #[must_use]
    pub fn hash_algorithm(&self) -> &str {
        &self.metadata.hash_algorithm
    }

    /// Stamp the algorithm that produced the stored digests.
    pub fn set_hash_algorithm(&mut self, name: impl Into<String>) {
        self.metadata.hash_algorithm = name.into();
    }

    /// Cached records.
    #[must_use]
    pub fn data(&self) -> &CacheData {
        &self.data
    }

    /// Mutable access to cached records.
    pub fn data_mut(&mut self) -> &mut CacheData {
        &mut self.data
    }
}

impl fmt::Display for HashCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "HashCache with {} items at {}",
            self.data.len(),
            self.path.display()
        )
    }
}
