//! Per-keymap conversion records kept by the batch orchestrator.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Status of one keymap in a batch run, serialized into `keymaps.json`.
///
/// The record starts out with only `name` and `path`; the orchestrator fills
/// in `no-cpp` when it falls back to the raw source and `error` when the
/// keymap ends in a failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionAttempt {
    /// Keymap name (directory name below `keymaps/`)
    pub name: String,
    /// Keymap directory
    pub path: PathBuf,
    /// Terminal error status, absent on success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Set when the preprocessed attempt failed and the raw source was used
    #[serde(rename = "no-cpp", default, skip_serializing_if = "is_false")]
    pub no_cpp: bool,
    /// Human-readable description of the last failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_false(value: &bool) -> bool {
    !*value
}

impl ConversionAttempt {
    /// Creates a pending record for a discovered keymap.
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            error: None,
            no_cpp: false,
            detail: None,
        }
    }

    /// Records a terminal failure.
    pub fn fail(&mut self, status: impl Into<String>, detail: Option<String>) {
        self.error = Some(status.into());
        self.detail = detail;
    }

    /// Whether the keymap ended without an error.
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}
