//! Chunked file hasher with a selectable digest algorithm.
//!
//! # Overview
//!
//! [`Hasher`] streams a file through one of the supported digests in
//! fixed-size chunks, so large files are never loaded into memory at once.
//! The digest is returned as a lowercase hexadecimal string, which is the
//! form stored in the cache and in the duplicate report.
//!
//! # Example
//!
//! ```no_run
//! use clonesweep::scanner::{HashAlgorithm, Hasher};
//! use std::path::Path;
//!
//! let hasher = Hasher::new(HashAlgorithm::Sha256, 64 * 1024);
//! let digest = hasher.hash_file(Path::new("Cargo.toml")).unwrap();
//! println!("{digest}");
//! ```

use std::fmt;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::Digest;

use super::HashError;

/// Default read chunk size (64 KiB).
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Largest read chunk size accepted (64 MiB); larger values are clamped.
pub const MAX_CHUNK_SIZE: usize = 64 * 1024 * 1024;

/// Digest algorithms the hasher can compute.
///
/// The lowercase name is what appears in settings, in the cache metadata
/// and as the digest key of every cached record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// MD5 (128-bit). The default, matching caches written by earlier releases.
    #[default]
    Md5,
    /// SHA-1 (160-bit)
    Sha1,
    /// SHA-224
    Sha224,
    /// SHA-256
    Sha256,
    /// SHA-384
    Sha384,
    /// SHA-512
    Sha512,
    /// BLAKE3 (256-bit)
    Blake3,
}

impl HashAlgorithm {
    /// Every supported algorithm, in display order.
    pub const ALL: [HashAlgorithm; 7] = [
        HashAlgorithm::Md5,
        HashAlgorithm::Sha1,
        HashAlgorithm::Sha224,
        HashAlgorithm::Sha256,
        HashAlgorithm::Sha384,
        HashAlgorithm::Sha512,
        HashAlgorithm::Blake3,
    ];

    /// Canonical lowercase name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Md5 => "md5",
            Self::Sha1 => "sha1",
            Self::Sha224 => "sha224",
            Self::Sha256 => "sha256",
            Self::Sha384 => "sha384",
            Self::Sha512 => "sha512",
            Self::Blake3 => "blake3",
        }
    }

    /// Resolve a configured algorithm name, substituting the default.
    ///
    /// An unsupported name is replaced by [`HashAlgorithm::Md5`] and a single
    /// warning is logged, including the closest supported name when one is
    /// similar enough to be a likely typo.
    #[must_use]
    pub fn resolve(name: &str) -> Self {
        match name.parse() {
            Ok(algorithm) => algorithm,
            Err(err) => {
                let fallback = Self::default();
                match Self::suggest(name) {
                    Some(suggestion) => log::warn!(
                        "{err} (did you mean '{suggestion}'?), defaulting to {fallback}"
                    ),
                    None => log::warn!("{err}, defaulting to {fallback}"),
                }
                fallback
            }
        }
    }

    /// Closest supported name to `name`, if any is reasonably close.
    #[must_use]
    pub fn suggest(name: &str) -> Option<&'static str> {
        let lowered = name.to_ascii_lowercase();
        Self::ALL
            .iter()
            .map(|a| (a.name(), strsim::jaro_winkler(&lowered, a.name())))
            .filter(|(_, score)| *score > 0.8)
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(candidate, _)| candidate)
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The configured algorithm name is not one the hasher supports.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unsupported hashing algorithm: '{0}'")]
pub struct UnsupportedAlgorithm(pub String);

impl FromStr for HashAlgorithm {
    type Err = UnsupportedAlgorithm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|a| a.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnsupportedAlgorithm(s.to_string()))
    }
}

/// Incremental digest state for one file.
enum DigestState {
    Md5(md5::Md5),
    Sha1(sha1::Sha1),
    Sha224(sha2::Sha224),
    Sha256(sha2::Sha256),
    Sha384(sha2::Sha384),
    Sha512(sha2::Sha512),
    Blake3(Box<blake3::Hasher>),
}

impl DigestState {
    fn new(algorithm: HashAlgorithm) -> Self {
        match algorithm {
            HashAlgorithm::Md5 => Self::Md5(md5::Md5::new()),
            HashAlgorithm::Sha1 => Self::Sha1(sha1::Sha1::new()),
            HashAlgorithm::Sha224 => Self::Sha224(sha2::Sha224::new()),
            HashAlgorithm::Sha256 => Self::Sha256(sha2::Sha256::new()),
            HashAlgorithm::Sha384 => Self::Sha384(sha2::Sha384::new()),
            HashAlgorithm::Sha512 => Self::Sha512(sha2::Sha512::new()),
            HashAlgorithm::Blake3 => Self::Blake3(Box::new(blake3::Hasher::new())),
        }
    }

    fn update(&mut self, chunk: &[u8]) {
        match self {
            Self::Md5(h) => h.update(chunk),
            Self::Sha1(h) => h.update(chunk),
            Self::Sha224(h) => h.update(chunk),
            Self::Sha256(h) => h.update(chunk),
            Self::Sha384(h) => h.update(chunk),
            Self::Sha512(h) => h.update(chunk),
            Self::Blake3(h) => {
                h.update(chunk);
            }
        }
    }

    fn finalize_hex(self) -> String {
        match self {
            Self::Md5(h) => format!("{:x}", h.finalize()),
            Self::Sha1(h) => format!("{:x}", h.finalize()),
            Self::Sha224(h) => format!("{:x}", h.finalize()),
            Self::Sha256(h) => format!("{:x}", h.finalize()),
            Self::Sha384(h) => format!("{:x}", h.finalize()),
            Self::Sha512(h) => format!("{:x}", h.finalize()),
            Self::Blake3(h) => h.finalize().to_hex().to_string(),
        }
    }
}

/// Streaming file hasher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hasher {
    algorithm: HashAlgorithm,
    chunk_size: usize,
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new(HashAlgorithm::default(), DEFAULT_CHUNK_SIZE)
    }
}

impl Hasher {
    /// Create a hasher. A zero chunk size falls back to [`DEFAULT_CHUNK_SIZE`]
    /// and anything above [`MAX_CHUNK_SIZE`] is clamped to it.
    #[must_use]
    pub fn new(algorithm: HashAlgorithm, chunk_size: usize) -> Self {
        let chunk_size = match chunk_size {
            0 => DEFAULT_CHUNK_SIZE,
            n if n > MAX_CHUNK_SIZE => {
                log::warn!("Hash chunk size {n} is too large, using {MAX_CHUNK_SIZE}");
                MAX_CHUNK_SIZE
            }
            n => n,
        };
        Self {
            algorithm,
            chunk_size,
        }
    }

    /// The algorithm this hasher computes.
    #[must_use]
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// The read chunk size in bytes.
    #[must_use]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Hash the full contents of the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the file cannot be opened or read.
    pub fn hash_file(&self, path: &Path) -> Result<String, HashError> {
        let file = File::open(path).map_err(|e| HashError::from_io(path, e))?;
        self.hash_reader(file)
            .map_err(|e| HashError::from_io(path, e))
    }

    /// Hash everything readable from `reader`.
    ///
    /// # Errors
    ///
    /// Propagates any read error other than [`ErrorKind::Interrupted`].
    pub fn hash_reader<R: Read>(&self, mut reader: R) -> std::io::Result<String> {
        let mut state = DigestState::new(self.algorithm);
        let mut buffer = vec![0u8; self.chunk_size];

        loop {
            match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => state.update(&buffer[..n]),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }

        Ok(state.finalize_hex())
    }
}
