//! Keyboard identifiers.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Slash-delimited keyboard path such as `"vendor/model/rev"`.
///
/// The identifier names a directory below `keyboards/` in a QMK tree. It is
/// validated once on construction and never changes afterwards.
///
/// # Validation
///
/// - Must not be empty
/// - Segments must not be empty, `.` or `..`
/// - Backslashes are normalized to forward slashes, a trailing slash is dropped
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct KeyboardId(String);

impl KeyboardId {
    /// Parses and validates a keyboard identifier.
    pub fn parse(raw: &str) -> Result<Self> {
        let normalized = raw.trim().replace('\\', "/");
        let normalized = normalized.trim_end_matches('/');

        if normalized.is_empty() {
            anyhow::bail!("Keyboard name cannot be empty");
        }

        if let Some(bad) = normalized
            .split('/')
            .find(|segment| segment.is_empty() || *segment == "." || *segment == "..")
        {
            anyhow::bail!("Invalid keyboard name '{}': bad path segment '{}'", raw, bad);
        }

        Ok(Self(normalized.to_string()))
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterates over the path segments (`vendor`, `model`, `rev`).
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }

    /// Returns every ancestor path from the first segment down to the full id.
    ///
    /// `"vendor/model/rev"` yields `["vendor", "vendor/model", "vendor/model/rev"]`.
    pub fn hierarchy(&self) -> Vec<&str> {
        self.0
            .match_indices('/')
            .map(|(idx, _)| &self.0[..idx])
            .chain(std::iter::once(self.0.as_str()))
            .collect()
    }

    /// Last path segment, used as the keyboard header name.
    pub fn leaf(&self) -> &str {
        self.segments().last().unwrap_or(self.0.as_str())
    }

    /// Directory of this keyboard below a `keyboards/` root.
    pub fn dir_in(&self, keyboards_root: &Path) -> PathBuf {
        self.segments()
            .fold(keyboards_root.to_path_buf(), |path, segment| path.join(segment))
    }
}

impl fmt::Display for KeyboardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for KeyboardId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for KeyboardId {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<KeyboardId> for String {
    fn from(id: KeyboardId) -> Self {
        id.0
    }
}

impl AsRef<str> for KeyboardId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
