//! Error taxonomy for the keymap conversion pipeline.
//!
//! Every stage of a conversion (layout resolution, preprocessing, extraction,
//! generation, output) reports failures through [`ConversionError`]. The batch
//! orchestrator inspects the variant to decide whether a keymap is retried
//! without the preprocessor and which status string ends up in the summary.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used by the conversion pipeline.
pub type ConversionResult<T> = std::result::Result<T, ConversionError>;

/// Errors produced while turning a keymap.c file into a keymap document.
#[derive(Debug, Error)]
pub enum ConversionError {
    /// No info.json or keyboard.json exists anywhere along the keyboard path.
    #[error("no keyboard configuration found for '{keyboard}' under {}", .searched.display())]
    ConfigurationNotFound {
        /// Keyboard identifier that was looked up
        keyboard: String,
        /// Directory that was searched
        searched: PathBuf,
    },

    /// A keyboard metadata file exists but cannot be parsed.
    #[error("invalid keyboard configuration for '{keyboard}': {reason}")]
    ConfigurationInvalid {
        /// Keyboard identifier that was looked up
        keyboard: String,
        /// Parse failure description
        reason: String,
    },

    /// The requested layout variant does not exist and no default applies.
    #[error("layout {} not found for '{keyboard}'. Available layouts: {available:?}", .requested.as_deref().map_or_else(|| "<unspecified>".to_string(), |name| format!("'{name}'")))]
    LayoutNotFound {
        /// Keyboard identifier
        keyboard: String,
        /// Layout name that was asked for, if any
        requested: Option<String>,
        /// Layout names the keyboard declares
        available: Vec<String>,
    },

    /// The keymap source (or preprocessor output) is not valid UTF-8.
    #[error("{} is not valid UTF-8", .path.display())]
    EncodingError {
        /// File whose contents failed to decode
        path: PathBuf,
    },

    /// The external preprocessor could not be run, failed or timed out.
    #[error("preprocessor failed (exit code {}): {stderr}", .exit_code.map_or_else(|| "none".to_string(), |code| code.to_string()))]
    PreprocessorFailure {
        /// Exit code, `None` when the process could not be started or was killed
        exit_code: Option<i32>,
        /// Captured standard error or a description of the failure
        stderr: String,
    },

    /// No `keymaps` layer table could be located in the source.
    #[error("keymap structure not found: {0}")]
    KeymapStructureNotFound(String),

    /// A layer could not be parsed (unbalanced braces, empty layer, ...).
    #[error("malformed layer {layer}: {reason}")]
    MalformedLayer {
        /// Layer name or index
        layer: String,
        /// What was wrong with it
        reason: String,
    },

    /// A layer's keycode count differs from the layout's key count.
    #[error("layer {layer} has {found} keycodes but layout '{layout}' has {expected} keys")]
    LayerShapeMismatch {
        /// Layer index in declaration order
        layer: usize,
        /// Layout variant the layer was checked against
        layout: String,
        /// Key count of the layout
        expected: usize,
        /// Keycode count of the layer
        found: usize,
    },

    /// The output document could not be written.
    #[error("failed to write {}: {source}", .path.display())]
    OutputWriteFailure {
        /// Target path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The keymap source file does not exist.
    #[error("C file does not exist: {}", .path.display())]
    SourceNotFound {
        /// Path that was given
        path: PathBuf,
    },

    /// The keymap source file exists but could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    SourceRead {
        /// Path that was given
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Reading the keymap from standard input is not supported.
    #[error("reading keymap.c from standard input is not supported")]
    StdinUnsupported,
}

impl ConversionError {
    /// Short status string recorded in the batch summary for this error.
    pub fn status_label(&self) -> &'static str {
        match self {
            Self::ConfigurationNotFound { .. } => "Configuration Not Found",
            Self::ConfigurationInvalid { .. } => "Configuration Invalid",
            Self::LayoutNotFound { .. } => "Layout Not Found",
            Self::EncodingError { .. } => "Unicode Decode Error",
            Self::PreprocessorFailure { .. } => "Preprocessor Failure",
            Self::KeymapStructureNotFound(_) => "Keymap Structure Not Found",
            Self::MalformedLayer { .. } => "Malformed Layer",
            Self::LayerShapeMismatch { .. } => "Layer Shape Mismatch",
            Self::OutputWriteFailure { .. } => "Output Write Failure",
            Self::SourceNotFound { .. } => "No C file",
            Self::SourceRead { .. } => "Read Error",
            Self::StdinUnsupported => "Unsupported Input",
        }
    }

    /// Whether a failure after preprocessing is worth retrying on the raw source.
    ///
    /// Encoding and I/O failures do not depend on the preprocessor, so a raw
    /// retry cannot change their outcome.
    pub fn retry_without_preprocessor(&self) -> bool {
        matches!(
            self,
            Self::LayerShapeMismatch { .. }
                | Self::PreprocessorFailure { .. }
                | Self::KeymapStructureNotFound(_)
                | Self::MalformedLayer { .. }
                | Self::LayoutNotFound { .. }
        )
    }
}
