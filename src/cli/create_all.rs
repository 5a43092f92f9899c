//! `create-all-keymaps`: batch conversion over a whole QMK tree.

use clap::Args;
use regex::Regex;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

use crate::cli::common::{CliError, CliResult};
use crate::config::Config;
use crate::models::KeyboardId;
use crate::services::batch::{run_batch, BatchOptions};
use crate::services::converter::Converter;
use crate::services::discovery::list_keyboards;
use crate::services::preprocessor::CppPreprocessor;

/// Generate keymap.json files for every keymap of every keyboard
#[derive(Debug, Clone, Args)]
pub struct CreateAllKeymapsArgs {
    /// Output root (defaults to `paths.output_dir` from the config)
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Number of keyboards converted in parallel
    #[arg(short, long, value_name = "N", value_parser = clap::value_parser!(u16).range(1..))]
    pub jobs: Option<u16>,

    /// Skip the C preprocessor entirely
    #[arg(long)]
    pub no_cpp: bool,

    /// Only convert keyboards whose name matches this regex
    #[arg(long, value_name = "REGEX")]
    pub filter: Option<String>,

    /// Keyboards to convert (default: every keyboard in the tree)
    #[arg(value_name = "KEYBOARD")]
    pub keyboards: Vec<String>,
}

impl CreateAllKeymapsArgs {
    /// Execute the create-all-keymaps command
    pub fn execute(&self, config: &Config) -> CliResult<()> {
        let start = Instant::now();
        info!("Collecting keyboards");

        let keyboards_dir = config.keyboards_dir();
        let mut keyboards = if self.keyboards.is_empty() {
            list_keyboards(&keyboards_dir)
                .map_err(|e| CliError::io(format!("Failed to scan keyboards directory: {e:#}")))?
        } else {
            self.keyboards
                .iter()
                .map(|name| KeyboardId::parse(name))
                .collect::<anyhow::Result<Vec<_>>>()
                .map_err(|e| CliError::validation(format!("{e:#}")))?
        };

        if let Some(filter_str) = &self.filter {
            let regex = Regex::new(filter_str)
                .map_err(|e| CliError::validation(format!("Invalid regex pattern: {e}")))?;
            keyboards.retain(|kb| regex.is_match(kb.as_str()));
        }

        let collected = Instant::now();
        info!(
            "Collected {} keyboards in {:.2?}",
            keyboards.len(),
            collected.duration_since(start)
        );
        info!("Converting keymaps");

        let options = BatchOptions {
            output_dir: self
                .output_dir
                .clone()
                .unwrap_or_else(|| config.paths.output_dir.clone()),
            jobs: self.jobs.map_or(config.batch.jobs, usize::from),
            use_preprocessor: config.preprocessor.enabled && !self.no_cpp,
        };

        let preprocessor = CppPreprocessor::from_config(config);
        let converter = Converter::new(config, &preprocessor);
        let report = run_batch(&converter, keyboards, &options);

        let end = Instant::now();
        info!("Converted keymaps in {:.2?}", end.duration_since(collected));
        info!("Total time: {:.2?}", end.duration_since(start));
        info!(
            "{} keymaps written, {} failed, {} keyboards skipped",
            report.converted(),
            report.failed(),
            report.skipped()
        );

        Ok(())
    }
}
