//! Configuration management for the application.
//!
//! This module handles loading, validating, and saving application configuration
//! in TOML format with platform-specific directory resolution. The loaded
//! [`Config`] is passed explicitly into every command; there is no global state.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::{APP_NAME, KEYBOARDS_DIR, QMK_HOME_ENV};

/// Path configuration for file system locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathConfig {
    /// QMK firmware root (the directory containing `keyboards/`)
    pub qmk_home: PathBuf,
    /// Root directory for batch output (`<output_dir>/<keyboard>/...`)
    pub output_dir: PathBuf,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            qmk_home: PathBuf::from("."),
            output_dir: PathBuf::from("keymaps"),
        }
    }
}

/// C preprocessor settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessorConfig {
    /// Run keymap.c through the preprocessor before extraction
    pub enabled: bool,
    /// Preprocessor executable
    pub command: String,
    /// Extra arguments passed before the generated include and define flags
    pub args: Vec<String>,
    /// Seconds before a running preprocessor is killed
    pub timeout_secs: u64,
}

impl Default for PreprocessorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            command: "cpp".to_string(),
            args: Vec::new(),
            timeout_secs: 30,
        }
    }
}

impl PreprocessorConfig {
    /// Timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Batch conversion settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Number of keyboards converted in parallel
    pub jobs: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            jobs: std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get),
        }
    }
}

/// Application configuration.
///
/// # Validation Rules
///
/// - `preprocessor.command` must not be empty
/// - `preprocessor.timeout_secs` must be greater than zero
/// - `batch.jobs` must be greater than zero
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// File system paths
    pub paths: PathConfig,
    /// Preprocessor settings
    pub preprocessor: PreprocessorConfig,
    /// Batch settings
    pub batch: BatchConfig,
}

impl Config {
    /// Creates a new Config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets the platform-specific config directory path.
    ///
    /// - Linux: `~/.config/qmkjson/`
    /// - macOS: `~/Library/Application Support/qmkjson/`
    /// - Windows: `%APPDATA%\qmkjson\`
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to determine config directory")?
            .join(APP_NAME);

        Ok(config_dir)
    }

    /// Gets the full path to the default config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Loads configuration from the default config file.
    ///
    /// A missing file yields the defaults. The `QMKJSON_QMK_HOME` environment
    /// variable overrides the configured QMK root either way.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_file_path()?;
        let mut config = if config_path.exists() {
            Self::read_file(&config_path)?
        } else {
            Self::new()
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from an explicit file, which must exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            anyhow::bail!("Config file not found: {}", path.display());
        }

        let mut config = Self::read_file(path)?;
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .context(format!("Failed to parse config file: {}", path.display()))
    }

    fn apply_env(&mut self) {
        if let Some(home) = std::env::var_os(QMK_HOME_ENV) {
            if !home.is_empty() {
                self.paths.qmk_home = PathBuf::from(home);
            }
        }
    }

    /// Saves configuration to a file using atomic write.
    ///
    /// Uses temp file + rename pattern for atomic writes.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        self.validate()?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).context(format!(
                "Failed to create config directory: {}",
                parent.display()
            ))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;
        let temp_path = path.with_extension("toml.tmp");

        fs::write(&temp_path, content).context(format!(
            "Failed to write temp config file: {}",
            temp_path.display()
        ))?;

        fs::rename(&temp_path, path).context(format!(
            "Failed to rename temp config file to: {}",
            path.display()
        ))?;

        Ok(())
    }

    /// Validates configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.preprocessor.command.trim().is_empty() {
            anyhow::bail!("Preprocessor command cannot be empty");
        }

        if self.preprocessor.timeout_secs == 0 {
            anyhow::bail!("Preprocessor timeout must be at least one second");
        }

        if self.batch.jobs == 0 {
            anyhow::bail!("Batch job count must be at least 1");
        }

        Ok(())
    }

    /// The `keyboards/` directory of the configured QMK root.
    pub fn keyboards_dir(&self) -> PathBuf {
        self.paths.qmk_home.join(KEYBOARDS_DIR)
    }
}
