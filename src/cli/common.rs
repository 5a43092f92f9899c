//! Shared CLI plumbing: error type, exit codes and config loading.

use std::fmt;
use std::path::Path;

use crate::config::Config;
use crate::error::ConversionError;

/// Process exit codes used by every subcommand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Command completed
    Success = 0,
    /// Invalid input or a conversion that cannot succeed
    ValidationError = 1,
    /// File system or subprocess failure
    IoError = 2,
}

impl ExitCode {
    /// Numeric value passed to `std::process::exit`.
    pub fn code(self) -> i32 {
        self as i32
    }
}

/// Classification of a CLI failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliErrorKind {
    /// Bad arguments or unconvertible input
    Validation,
    /// I/O failure
    Io,
}

/// Error returned by subcommand handlers.
#[derive(Debug, Clone)]
pub struct CliError {
    /// Error classification, decides the exit code
    pub kind: CliErrorKind,
    /// Message printed to stderr
    pub message: String,
}

/// Result type for subcommand handlers.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Creates a validation error (exit code 1).
    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            kind: CliErrorKind::Validation,
            message: message.into(),
        }
    }

    /// Creates an I/O error (exit code 2).
    pub fn io(message: impl Into<String>) -> Self {
        Self {
            kind: CliErrorKind::Io,
            message: message.into(),
        }
    }

    /// Exit code for this error.
    pub fn exit_code(&self) -> ExitCode {
        match self.kind {
            CliErrorKind::Validation => ExitCode::ValidationError,
            CliErrorKind::Io => ExitCode::IoError,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for CliError {}

impl From<ConversionError> for CliError {
    fn from(err: ConversionError) -> Self {
        match err {
            ConversionError::SourceNotFound { .. }
            | ConversionError::SourceRead { .. }
            | ConversionError::OutputWriteFailure { .. }
            | ConversionError::PreprocessorFailure { .. } => Self::io(err.to_string()),
            _ => Self::validation(err.to_string()),
        }
    }
}

/// Loads the configuration from `--config` or the default location.
pub fn load_config(path: Option<&Path>) -> CliResult<Config> {
    let result = match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };

    result.map_err(|e| CliError::validation(format!("Failed to load configuration: {e:#}")))
}
