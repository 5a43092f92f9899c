//! CLI command handlers for qmkjson.
//!
//! Every subcommand is a clap `Args` struct with an `execute` method that
//! receives the resolved [`Config`]. Options shared by all subcommands live
//! in [`GlobalArgs`].

pub mod c2json;
pub mod common;
pub mod create_all;
pub mod qmk;

use clap::Args;
use std::path::PathBuf;

use crate::config::Config;

// Re-export types used by main.rs and tests
pub use c2json::C2JsonArgs;
pub use common::{CliError, CliResult, ExitCode};
pub use create_all::CreateAllKeymapsArgs;
pub use qmk::{ListKeyboardsArgs, ListKeymapsArgs, ListLayoutsArgs, LocateInfoJsonArgs};

/// Options accepted by every subcommand.
#[derive(Debug, Clone, Default, Args)]
pub struct GlobalArgs {
    /// Configuration file (default: platform config dir/qmkjson/config.toml)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// QMK firmware root, the directory containing `keyboards/`
    #[arg(long, global = true, value_name = "PATH")]
    pub qmk_home: Option<PathBuf>,

    /// C preprocessor command
    #[arg(long, global = true, value_name = "COMMAND")]
    pub cpp: Option<String>,

    /// Seconds before a running preprocessor is killed
    #[arg(long, global = true, value_name = "SECONDS", value_parser = clap::value_parser!(u64).range(1..))]
    pub cpp_timeout: Option<u64>,

    /// Enable debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Quiet mode, only output error messages
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

impl GlobalArgs {
    /// Loads the configuration and applies command-line overrides.
    pub fn resolve_config(&self) -> CliResult<Config> {
        let mut config = common::load_config(self.config.as_deref())?;

        if let Some(qmk_home) = &self.qmk_home {
            config.paths.qmk_home.clone_from(qmk_home);
        }
        if let Some(cpp) = &self.cpp {
            config.preprocessor.command.clone_from(cpp);
        }
        if let Some(timeout) = self.cpp_timeout {
            config.preprocessor.timeout_secs = timeout;
        }

        config
            .validate()
            .map_err(|e| CliError::validation(format!("Invalid configuration: {e}")))?;

        Ok(config)
    }

    /// Default log filter for the chosen verbosity.
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "info"
        }
    }
}
