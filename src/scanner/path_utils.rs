//! Path helpers shared by the skip rules and the command-line shell.
//!
//! - [`expand_env_vars`] expands `$VAR`, `${VAR}` and `%VAR%` references the
//!   way users write them in settings files. Unset variables are left as-is.
//! - [`absolutize`] anchors relative paths at the current directory without
//!   touching the filesystem.
//! - [`remove_redundant_roots`] drops scan roots already covered by another
//!   root, so a recursive scan never visits a subtree twice.
//!
//! # Example
//!
//! ```
//! use clonesweep::scanner::path_utils::remove_redundant_roots;
//! use std::path::PathBuf;
//!
//! let roots = vec![PathBuf::from("/data"), PathBuf::from("/data/photos")];
//! let (kept, dropped) = remove_redundant_roots(roots, true);
//! assert_eq!(kept, vec![PathBuf::from("/data")]);
//! assert_eq!(dropped, vec![PathBuf::from("/data/photos")]);
//! ```

use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::{Captures, Regex};

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}|\$([A-Za-z_][A-Za-z0-9_]*)|%([A-Za-z_][A-Za-z0-9_]*)%")
            .expect("env var pattern is a valid regex")
    })
}

/// Expand environment variable references in `input`.
///
/// # Example
///
/// ```
/// use clonesweep::scanner::path_utils::expand_env_vars;
///
/// std::env::set_var("CLONESWEEP_DOC_HOME", "/home/doc");
/// assert_eq!(expand_env_vars("$CLONESWEEP_DOC_HOME/cache"), "/home/doc/cache");
/// assert_eq!(expand_env_vars("%CLONESWEEP_DOC_HOME%"), "/home/doc");
/// assert_eq!(expand_env_vars("$CLONESWEEP_DOC_UNSET/x"), "$CLONESWEEP_DOC_UNSET/x");
/// ```
#[must_use]
pub fn expand_env_vars(input: &str) -> Cow<'_, str> {
    env_var_pattern().replace_all(input, |caps: &Captures<'_>| {
        let name = caps
            .get(1)
            .or_else(|| caps.get(2))
            .or_else(|| caps.get(3))
            .map_or("", |m| m.as_str());
        std::env::var(name).unwrap_or_else(|_| caps[0].to_string())
    })
}

/// Make `path` absolute relative to the current directory.
///
/// Falls back to the path unchanged if the current directory is unavailable.
#[must_use]
pub fn absolutize(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Resolve a configured skip path: expand variables, then absolutize.
#[must_use]
pub fn resolve_skip_path(raw: &str) -> PathBuf {
    absolutize(Path::new(expand_env_vars(raw).as_ref()))
}

/// Split `paths` into existing directories and everything else.
///
/// Returned directories are absolutized.
pub fn validate_directories(paths: &[PathBuf]) -> Result<Vec<PathBuf>, Vec<PathBuf>> {
    let absolute: Vec<PathBuf> = paths.iter().map(|p| absolutize(p)).collect();
    let invalid: Vec<PathBuf> = absolute.iter().filter(|p| !p.is_dir()).cloned().collect();

    if invalid.is_empty() {
        Ok(absolute)
    } else {
        Err(invalid)
    }
}

/// Drop roots that another root already covers.
///
/// Exact duplicates are always dropped. When `recursive` is set, any root
/// nested inside another root is dropped too, since descending from the outer
/// root visits it anyway. Order of the kept roots is preserved.
///
/// Returns `(kept, dropped)`.
#[must_use]
pub fn remove_redundant_roots(roots: Vec<PathBuf>, recursive: bool) -> (Vec<PathBuf>, Vec<PathBuf>) {
    let mut kept: Vec<PathBuf> = Vec::with_capacity(roots.len());
    let mut dropped = Vec::new();

    for (i, root) in roots.iter().enumerate() {
        let covered = roots.iter().enumerate().any(|(j, other)| {
            if i == j {
                return false;
            }
            if root == other {
                // Keep the first occurrence of an exact duplicate.
                return j < i;
            }
            recursive && root.starts_with(other)
        });

        if covered {
            dropped.push(root.clone());
        } else {
            kept.push(root.clone());
        }
    }

    (kept, dropped)
}
