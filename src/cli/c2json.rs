//! `c2json`: convert one keymap.c into a keymap.json document.

use clap::Args;
use std::path::PathBuf;
use tracing::{error, info};

use crate::cli::common::{CliError, CliResult};
use crate::config::Config;
use crate::error::ConversionError;
use crate::models::KeyboardId;
use crate::services::converter::{ConversionRequest, Converter, STDIN_PATH};
use crate::services::output::write_with_backup;
use crate::services::preprocessor::CppPreprocessor;

/// Create a keymap.json from a keymap.c file
#[derive(Debug, Clone, Args)]
pub struct C2JsonArgs {
    /// The keyboard's name (e.g., "xd75", "crkbd/rev1")
    #[arg(short = 'k', long, visible_alias = "kb", value_name = "KEYBOARD")]
    pub keyboard: String,

    /// The keymap's name
    #[arg(short = 'm', long, visible_alias = "km", value_name = "KEYMAP")]
    pub keymap: String,

    /// File to write to (`-` for stdout, the default)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Do not run the C preprocessor on keymap.c
    #[arg(long)]
    pub no_cpp: bool,

    /// Layout variant to use instead of the one named in keymap.c
    #[arg(long, value_name = "LAYOUT")]
    pub layout: Option<String>,

    /// keymap.c file
    #[arg(value_name = "FILE")]
    pub filename: PathBuf,
}

impl C2JsonArgs {
    /// Execute the c2json command
    pub fn execute(&self, config: &Config, quiet: bool) -> CliResult<()> {
        let keyboard = KeyboardId::parse(&self.keyboard)
            .map_err(|e| CliError::validation(format!("{e:#}")))?;

        let use_preprocessor = config.preprocessor.enabled && !self.no_cpp;
        let preprocessor = CppPreprocessor::from_config(config);
        let converter = Converter::new(config, &preprocessor);

        let mut request = ConversionRequest::new(keyboard, &self.keymap, &self.filename)
            .with_preprocessor(use_preprocessor);
        request.layout.clone_from(&self.layout);

        let document = converter.convert(&request).map_err(|e| {
            match &e {
                ConversionError::SourceNotFound { .. } => error!("C file does not exist!"),
                _ if use_preprocessor && e.retry_without_preprocessor() => {
                    error!("Something went wrong. Try to use --no-cpp.");
                }
                _ => {}
            }
            CliError::from(e)
        })?;

        match self.output.as_deref().filter(|path| path.as_os_str() != STDIN_PATH) {
            Some(path) => {
                let json = document
                    .to_json_pretty()
                    .map_err(|e| CliError::io(format!("Failed to serialize keymap: {e}")))?;
                write_with_backup(path, &json)?;

                if !quiet {
                    info!("Wrote keymap to {}.", path.display());
                }
            }
            None => {
                let json = document
                    .to_json()
                    .map_err(|e| CliError::io(format!("Failed to serialize keymap: {e}")))?;
                println!("{json}");
            }
        }

        Ok(())
    }
}
