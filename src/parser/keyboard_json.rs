//! QMK info.json / keyboard.json parser for layout information.
//!
//! This module handles parsing QMK's keyboard metadata files and merging the
//! files found along a keyboard's directory hierarchy into one definition.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::{INFO_JSON, KEYBOARD_JSON};
use crate::models::{KeyPosition, KeyboardId};

/// QMK info.json structure (simplified for our needs)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct QmkInfoJson {
    /// Keyboard name/identifier
    pub keyboard_name: Option<String>,
    /// Manufacturer name
    pub manufacturer: Option<String>,
    /// Maintainer name
    pub maintainer: Option<String>,
    /// URL to keyboard information
    pub url: Option<String>,
    /// Available layouts
    #[serde(default)]
    pub layouts: HashMap<String, LayoutDefinition>,
    /// Alternative layout names mapped to their canonical name
    #[serde(default)]
    pub layout_aliases: HashMap<String, String>,
}

/// Layout definition from info.json
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LayoutDefinition {
    /// Physical key positions and matrix assignments
    #[serde(default)]
    pub layout: Vec<KeyPosition>,
}

impl QmkInfoJson {
    /// Merges a more specific definition on top of this one.
    ///
    /// Layouts and aliases with the same name are replaced, scalar fields are
    /// replaced when the overlay sets them.
    pub fn merge(&mut self, overlay: QmkInfoJson) {
        if overlay.keyboard_name.is_some() {
            self.keyboard_name = overlay.keyboard_name;
        }
        if overlay.manufacturer.is_some() {
            self.manufacturer = overlay.manufacturer;
        }
        if overlay.maintainer.is_some() {
            self.maintainer = overlay.maintainer;
        }
        if overlay.url.is_some() {
            self.url = overlay.url;
        }
        self.layouts.extend(overlay.layouts);
        self.layout_aliases.extend(overlay.layout_aliases);
    }
}

/// Parses a QMK info.json (or keyboard.json) file.
///
/// # Arguments
///
/// * `path` - Path to the metadata file
///
/// # Returns
///
/// Parsed QMK info.json structure
pub fn parse_info_json(path: &Path) -> Result<QmkInfoJson> {
    let content = fs::read_to_string(path)
        .context(format!("Failed to read info.json: {}", path.display()))?;

    let info: QmkInfoJson = serde_json::from_str(&content)
        .context(format!("Failed to parse info.json: {}", path.display()))?;

    Ok(info)
}

/// Lists the metadata files that apply to a keyboard, least specific first.
///
/// For `vendor/model` this checks `vendor/info.json`, `vendor/keyboard.json`,
/// `vendor/model/info.json` and `vendor/model/keyboard.json`.
pub fn keyboard_config_files(keyboards_dir: &Path, keyboard: &KeyboardId) -> Vec<PathBuf> {
    keyboard
        .hierarchy()
        .into_iter()
        .flat_map(|level| {
            let dir = keyboards_dir.join(level);
            [dir.join(INFO_JSON), dir.join(KEYBOARD_JSON)]
        })
        .filter(|path| path.is_file())
        .collect()
}

/// Returns the most specific info.json for a keyboard.
///
/// Every level of the keyboard path is checked and the last match wins, so
/// `vendor/model/rev/info.json` beats `vendor/model/info.json`.
pub fn locate_info_json(keyboards_dir: &Path, keyboard: &KeyboardId) -> Option<PathBuf> {
    keyboard
        .hierarchy()
        .into_iter()
        .map(|level| keyboards_dir.join(level).join(INFO_JSON))
        .filter(|path| path.is_file())
        .last()
}

/// Loads and merges every metadata file along the keyboard hierarchy.
///
/// Returns `Ok(None)` when no metadata file exists at any level.
pub fn load_keyboard_info(keyboards_dir: &Path, keyboard: &KeyboardId) -> Result<Option<QmkInfoJson>> {
    let files = keyboard_config_files(keyboards_dir, keyboard);
    if files.is_empty() {
        return Ok(None);
    }

    let mut merged = QmkInfoJson::default();
    for file in files {
        merged.merge(parse_info_json(&file)?);
    }

    Ok(Some(merged))
}

/// Extracts available layout names from info.json.
///
/// # Returns
///
/// Vector of layout names (e.g., ["LAYOUT", "LAYOUT_split_3x6_3"]), sorted
pub fn extract_layout_names(info: &QmkInfoJson) -> Vec<String> {
    let mut names: Vec<String> = info.layouts.keys().cloned().collect();
    names.sort();
    names
}
