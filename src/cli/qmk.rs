//! QMK tree inspection commands.
//!
//! These commands read the `keyboards/` directory of the configured QMK root
//! directly: keyboard discovery, layout variants, keymaps and info.json
//! lookup.

use clap::Args;
use regex::Regex;
use serde::Serialize;
use std::path::PathBuf;

use crate::cli::common::{CliError, CliResult};
use crate::config::Config;
use crate::models::KeyboardId;
use crate::parser::keyboard_json::locate_info_json;
use crate::services::discovery::{keyboard_entries, list_keymaps};
use crate::services::layouts::KeyboardLayouts;

/// Returns the `keyboards/` directory, failing when the QMK root has none.
fn keyboards_dir(config: &Config) -> CliResult<PathBuf> {
    let keyboards_dir = config.keyboards_dir();
    if !keyboards_dir.is_dir() {
        return Err(CliError::io(format!(
            "QMK keyboards directory not found: {}",
            keyboards_dir.display()
        )));
    }
    Ok(keyboards_dir)
}

fn parse_keyboard(name: &str) -> CliResult<KeyboardId> {
    KeyboardId::parse(name).map_err(|e| CliError::validation(format!("{e:#}")))
}

fn print_json<T: Serialize>(value: &T) -> CliResult<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value)
            .map_err(|e| CliError::io(format!("Failed to serialize JSON: {e}")))?
    );
    Ok(())
}

/// List all keyboards (directories with rules.mk) in the QMK tree
#[derive(Debug, Clone, Args)]
pub struct ListKeyboardsArgs {
    /// Optional regex filter for keyboard names
    #[arg(long, value_name = "REGEX")]
    pub filter: Option<String>,

    /// Output results as JSON (`[{"name", "path"}]`)
    #[arg(long)]
    pub json: bool,
}

impl ListKeyboardsArgs {
    /// Execute the list-keyboards command
    pub fn execute(&self, config: &Config) -> CliResult<()> {
        let keyboards_dir = keyboards_dir(config)?;

        let mut keyboards = keyboard_entries(&keyboards_dir)
            .map_err(|e| CliError::io(format!("Failed to scan keyboards directory: {e:#}")))?;

        if keyboards.is_empty() {
            return Err(CliError::validation("No keyboards found in QMK directory"));
        }

        // Apply regex filter if provided
        if let Some(filter_str) = &self.filter {
            let regex = Regex::new(filter_str)
                .map_err(|e| CliError::validation(format!("Invalid regex pattern: {e}")))?;
            keyboards.retain(|kb| regex.is_match(kb.name.as_str()));

            if keyboards.is_empty() {
                return Err(CliError::validation(format!(
                    "No keyboards match filter: {filter_str}"
                )));
            }
        }

        if self.json {
            print_json(&keyboards)?;
        } else {
            for kb in &keyboards {
                println!("{}", kb.name);
            }
        }

        Ok(())
    }
}

/// List layout variants for a specific keyboard
#[derive(Debug, Clone, Args)]
pub struct ListLayoutsArgs {
    /// Keyboard name (e.g., "crkbd/rev1", "xd75")
    #[arg(value_name = "KEYBOARD")]
    pub keyboard: String,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

/// JSON response for list-layouts command
#[derive(Debug, Clone, Serialize)]
struct ListLayoutsResponse {
    /// Keyboard name
    keyboard: String,
    /// Layout names with key counts
    layouts: Vec<LayoutInfo>,
    /// Total count
    count: usize,
}

/// Layout information including name and key count
#[derive(Debug, Clone, Serialize)]
struct LayoutInfo {
    /// Layout name (e.g., "LAYOUT", "LAYOUT_ortho_5x15")
    name: String,
    /// Number of keys in this layout
    key_count: usize,
}

impl ListLayoutsArgs {
    /// Execute the list-layouts command
    pub fn execute(&self, config: &Config) -> CliResult<()> {
        let keyboards_dir = keyboards_dir(config)?;
        let keyboard = parse_keyboard(&self.keyboard)?;
        let layouts = KeyboardLayouts::load(&keyboards_dir, &keyboard)?;

        let variants: Vec<LayoutInfo> = layouts
            .names()
            .into_iter()
            .filter_map(|name| layouts.get(&name))
            .map(|layout| LayoutInfo {
                key_count: layout.key_count(),
                name: layout.name,
            })
            .collect();

        if variants.is_empty() {
            return Err(CliError::validation(format!(
                "No layouts found for keyboard '{keyboard}'"
            )));
        }

        if self.json {
            print_json(&ListLayoutsResponse {
                keyboard: keyboard.to_string(),
                count: variants.len(),
                layouts: variants,
            })?;
        } else {
            println!("Keyboard: {keyboard}");
            println!("\nAvailable layouts ({}):", variants.len());
            for variant in &variants {
                println!("  {} ({} keys)", variant.name, variant.key_count);
            }
        }

        Ok(())
    }
}

/// List the keymaps available to a keyboard
#[derive(Debug, Clone, Args)]
pub struct ListKeymapsArgs {
    /// Keyboard name
    #[arg(value_name = "KEYBOARD")]
    pub keyboard: String,

    /// Output results as JSON (`[{"name", "path"}]`)
    #[arg(long)]
    pub json: bool,
}

impl ListKeymapsArgs {
    /// Execute the list-keymaps command
    pub fn execute(&self, config: &Config) -> CliResult<()> {
        let keyboards_dir = keyboards_dir(config)?;
        let keyboard = parse_keyboard(&self.keyboard)?;

        if !keyboard.dir_in(&keyboards_dir).is_dir() {
            return Err(CliError::validation(format!("Keyboard not found: {keyboard}")));
        }

        let keymaps = list_keymaps(&keyboards_dir, &keyboard)
            .map_err(|e| CliError::io(format!("Failed to list keymaps: {e:#}")))?;

        if self.json {
            print_json(&keymaps)?;
        } else {
            for keymap in &keymaps {
                println!("{}", keymap.name);
            }
        }

        Ok(())
    }
}

/// Print the most specific info.json of a keyboard
#[derive(Debug, Clone, Args)]
pub struct LocateInfoJsonArgs {
    /// Keyboard name
    #[arg(value_name = "KEYBOARD")]
    pub keyboard: String,
}

impl LocateInfoJsonArgs {
    /// Execute the locate-info-json command
    pub fn execute(&self, config: &Config) -> CliResult<()> {
        let keyboards_dir = keyboards_dir(config)?;
        let keyboard = parse_keyboard(&self.keyboard)?;

        let path = locate_info_json(&keyboards_dir, &keyboard).ok_or_else(|| {
            CliError::validation(format!("No info.json found for keyboard '{keyboard}'"))
        })?;

        println!("{}", path.display());
        Ok(())
    }
}
