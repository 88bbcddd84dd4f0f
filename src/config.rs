//! Application settings management.
//!
//! Settings are layered with figment: built-in defaults, then the settings
//! file (TOML, or JSON when the file ends in `.json`), then environment
//! variables prefixed with `CLONESWEEP_`. A missing settings file simply
//! yields the defaults.
//!
//! User exclusions are edited against the file layer only, so environment
//! overrides are never baked into the saved file.

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Json, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::scanner::path_utils::absolutize;
use crate::scanner::{HashAlgorithm, DEFAULT_CHUNK_SIZE};

/// Prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "CLONESWEEP_";

/// Settings file name inside the platform config directory.
pub const SETTINGS_FILE: &str = "settings.toml";

const MAX_EXTENSION_LEN: usize = 8;
const MAX_FILENAME_LEN: usize = 255;
const FORBIDDEN_FILENAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Errors that can occur while loading or saving settings.
#[derive(thiserror::Error, Debug)]
pub enum SettingsError {
    /// The layered settings could not be extracted.
    #[error("Failed to load settings: {0}")]
    Load(#[from] Box<figment::Error>),

    /// Settings could not be encoded as TOML.
    #[error("Failed to encode settings: {0}")]
    Toml(#[from] toml::ser::Error),

    /// Settings could not be encoded as JSON.
    #[error("Failed to encode settings: {0}")]
    Json(#[from] serde_json::Error),

    /// The settings file could not be written.
    #[error("Failed to write settings to {path}: {source}")]
    Write {
        /// Settings file path
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// No platform config directory could be determined.
    #[error("Failed to determine the configuration directory")]
    NoConfigDir,

    /// A user exclusion failed validation.
    #[error("Invalid {kind} exclusion '{item}': {reason}")]
    InvalidExclusion {
        /// Which exclusion list the item was meant for
        kind: ExclusionKind,
        /// The rejected item
        item: String,
        /// Why it was rejected
        reason: &'static str,
    },
}

/// The user-editable exclusion lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExclusionKind {
    /// Directory paths (`user_paths_skip`)
    Paths,
    /// File extensions with a leading dot (`user_exts_skip`)
    Exts,
    /// File names, with or without extension (`user_filenames_skip`)
    Names,
}

impl std::fmt::Display for ExclusionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Paths => "path",
            Self::Exts => "extension",
            Self::Names => "filename",
        })
    }
}

/// Result of [`Settings::add_exclusions`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionUpdate {
    /// Items appended to the list
    pub added: Vec<String>,
    /// Items that were already in the list
    pub already_present: Vec<String>,
}

/// Scan settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Digest algorithm name; unsupported names fall back to md5
    pub hash_algorithm: String,
    /// Read chunk size in bytes
    pub hash_chunk_size: usize,
    /// System paths never scanned
    pub default_paths_skip: Vec<String>,
    /// User-excluded paths
    pub user_paths_skip: Vec<String>,
    /// Extensions never scanned
    pub default_exts_skip: Vec<String>,
    /// User-excluded extensions
    pub user_exts_skip: Vec<String>,
    /// User-excluded file names
    pub user_filenames_skip: Vec<String>,
    /// Files larger than this many MiB are skipped
    pub max_file_size_mb: u64,
    /// Drop cache records whose file no longer exists
    pub prune_missing: bool,
}

impl Default for Settings {
    fn default() -> Self {
        let default_paths_skip = if cfg!(windows) {
            vec!["%SystemRoot%".to_string()]
        } else {
            vec!["/proc".to_string(), "/sys".to_string(), "/dev".to_string()]
        };

        Self {
            hash_algorithm: HashAlgorithm::Md5.name().to_string(),
            hash_chunk_size: DEFAULT_CHUNK_SIZE,
            default_paths_skip,
            user_paths_skip: Vec::new(),
            default_exts_skip: vec![".tmp".to_string(), ".swp".to_string(), ".lock".to_string()],
            user_exts_skip: Vec::new(),
            user_filenames_skip: Vec::new(),
            max_file_size_mb: 4096,
            prune_missing: true,
        }
    }
}

impl Settings {
    /// Default platform-specific settings file path.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::NoConfigDir`] when no home directory is known.
    pub fn default_path() -> Result<PathBuf, SettingsError> {
        let project_dirs = ProjectDirs::from("com", "clonesweep", "clonesweep")
            .ok_or(SettingsError::NoConfigDir)?;
        Ok(project_dirs.config_dir().join(SETTINGS_FILE))
    }

    /// Build the layered figment for `path` with the given env prefix.
    #[must_use]
    pub fn figment(path: &Path, env_prefix: &str) -> Figment {
        Self::file_figment(path).merge(Env::prefixed(env_prefix))
    }

    fn file_figment(path: &Path) -> Figment {
        let figment = Figment::from(Serialized::defaults(Settings::default()));
        if is_json(path) {
            figment.merge(Json::file(path))
        } else {
            figment.merge(Toml::file(path))
        }
    }

    /// Load defaults, then `path`, then `CLONESWEEP_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is malformed or a value has the wrong type.
    pub fn load_from_path(path: &Path) -> Result<Self, SettingsError> {
        let settings: Settings = Self::figment(path, ENV_PREFIX)
            .extract()
            .map_err(Box::new)?;
        log::debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Load defaults and `path` only, for editing and saving back.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is malformed or a value has the wrong type.
    pub fn load_file(path: &Path) -> Result<Self, SettingsError> {
        Ok(Self::file_figment(path).extract().map_err(Box::new)?)
    }

    /// Write the settings to `path` (TOML, or JSON for `.json` files).
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or writing fails.
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let content = if is_json(path) {
            serde_json::to_string_pretty(self)?
        } else {
            toml::to_string_pretty(self)?
        };

        let write_err = |source| SettingsError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        fs::write(path, content).map_err(write_err)?;

        log::debug!("Saved settings to {}", path.display());
        Ok(())
    }

    /// The configured algorithm, falling back to md5 with a warning.
    #[must_use]
    pub fn algorithm(&self) -> HashAlgorithm {
        HashAlgorithm::resolve(&self.hash_algorithm)
    }

    fn user_list_mut(&mut self, kind: ExclusionKind) -> &mut Vec<String> {
        match kind {
            ExclusionKind::Paths => &mut self.user_paths_skip,
            ExclusionKind::Exts => &mut self.user_exts_skip,
            ExclusionKind::Names => &mut self.user_filenames_skip,
        }
    }

    /// Append user exclusions of one kind.
    ///
    /// Every item is validated first; nothing is added if any item fails.
    /// Paths are stored absolutized. Items already present are reported in
    /// [`ExclusionUpdate::already_present`] and not duplicated.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::InvalidExclusion`] for the first invalid item.
    pub fn add_exclusions(
        &mut self,
        kind: ExclusionKind,
        items: &[String],
    ) -> Result<ExclusionUpdate, SettingsError> {
        let validated = items
            .iter()
            .map(|item| validate_exclusion(kind, item))
            .collect::<Result<Vec<_>, _>>()?;

        let list = self.user_list_mut(kind);
        let mut update = ExclusionUpdate::default();
        for item in validated {
            if list.contains(&item) {
                update.already_present.push(item);
            } else {
                list.push(item.clone());
                update.added.push(item);
            }
        }
        Ok(update)
    }

    /// Empty every `user_*` exclusion list.
    pub fn clear_user_exclusions(&mut self) {
        self.user_paths_skip.clear();
        self.user_exts_skip.clear();
        self.user_filenames_skip.clear();
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

/// Validate and normalize one exclusion item.
///
/// # Errors
///
/// Returns [`SettingsError::InvalidExclusion`] when the item is rejected.
pub fn validate_exclusion(kind: ExclusionKind, item: &str) -> Result<String, SettingsError> {
    let item = item.trim();
    let invalid = |reason| SettingsError::InvalidExclusion {
        kind,
        item: item.to_string(),
        reason,
    };

    if item.is_empty() {
        return Err(invalid("must not be empty"));
    }

    match kind {
        ExclusionKind::Paths => {
            let path = absolutize(Path::new(item));
            if !path.is_dir() {
                return Err(invalid("not a valid path or directory"));
            }
            Ok(path.to_string_lossy().into_owned())
        }
        ExclusionKind::Exts => {
            if !item.starts_with('.') || item.chars().count() > MAX_EXTENSION_LEN {
                return Err(invalid(
                    "must start with a \".\" and be at most 8 characters",
                ));
            }
            Ok(item.to_string())
        }
        ExclusionKind::Names => {
            if item.contains(FORBIDDEN_FILENAME_CHARS) || item.chars().count() > MAX_FILENAME_LEN {
                return Err(invalid(
                    "avoid <>:\"/\\|?* and keep within 255 characters",
                ));
            }
            Ok(item.to_string())
        }
    }
}
