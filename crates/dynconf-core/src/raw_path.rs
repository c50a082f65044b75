//! Paths that keep the exact text the user typed.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// A path value preserving the user-supplied string verbatim.
///
/// The platform path is only built on first access, then cached. Equality,
/// hashing and display all use the raw text, so a path like
/// `%H/terracotta/logs` is exported exactly as configured.
#[derive(Clone, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct RawPath {
    raw: String,
    path: OnceLock<PathBuf>,
}

impl RawPath {
    /// Wraps the given text.
    pub fn new(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            path: OnceLock::new(),
        }
    }

    /// Returns the text as configured.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns the platform path, building it on first use.
    pub fn to_path(&self) -> &Path {
        self.path.get_or_init(|| PathBuf::from(&self.raw))
    }

    /// Returns `true` once the platform path has been built.
    pub fn is_materialized(&self) -> bool {
        self.path.get().is_some()
    }
}

impl fmt::Debug for RawPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RawPath").field(&self.raw).finish()
    }
}

impl fmt::Display for RawPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl PartialEq for RawPath {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for RawPath {}

impl Hash for RawPath {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl From<String> for RawPath {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

impl From<&str> for RawPath {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<RawPath> for String {
    fn from(path: RawPath) -> Self {
        path.raw
    }
}
