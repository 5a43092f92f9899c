//! Keyboard and keymap discovery in a QMK `keyboards/` tree.

use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::{KEYMAPS_DIR, KEYMAP_C, RULES_MK};
use crate::models::KeyboardId;
use crate::parser::keyboard_json::locate_info_json;

/// A keyboard definition and its most specific info.json.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyboardEntry {
    /// Keyboard identifier
    pub name: KeyboardId,
    /// Located info.json, `null` when the keyboard only has keyboard.json
    pub path: Option<PathBuf>,
}

/// A keymap directory found for a keyboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeymapEntry {
    /// Keymap name (directory name)
    pub name: String,
    /// Keymap directory
    pub path: PathBuf,
}

impl KeymapEntry {
    /// Expected location of the keymap source.
    pub fn source_path(&self) -> PathBuf {
        self.path.join(KEYMAP_C)
    }
}

/// Finds every keyboard below `keyboards_dir`.
///
/// A keyboard is a directory containing `rules.mk`. Anything inside a
/// `keymaps` directory and hidden directories are skipped. The result is
/// sorted by identifier.
pub fn list_keyboards(keyboards_dir: &Path) -> Result<Vec<KeyboardId>> {
    fn visit_directory(dir: &Path, keyboards_root: &Path, keyboards: &mut Vec<KeyboardId>) -> Result<()> {
        let entries =
            fs::read_dir(dir).context(format!("Failed to read directory: {}", dir.display()))?;

        for entry in entries {
            let path = entry?.path();
            if !path.is_dir() {
                continue;
            }

            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                if name.starts_with('.') || name == KEYMAPS_DIR {
                    continue;
                }
            }

            if path.join(RULES_MK).is_file() {
                if let Ok(rel_path) = path.strip_prefix(keyboards_root) {
                    let name = rel_path.to_string_lossy();
                    keyboards.push(KeyboardId::parse(&name)?);
                }
            }

            visit_directory(&path, keyboards_root, keyboards)?;
        }

        Ok(())
    }

    if !keyboards_dir.is_dir() {
        anyhow::bail!("Keyboards directory not found: {}", keyboards_dir.display());
    }

    let mut keyboards = Vec::new();
    visit_directory(keyboards_dir, keyboards_dir, &mut keyboards)?;
    keyboards.sort();
    Ok(keyboards)
}

/// Lists keyboards together with their located info.json.
pub fn keyboard_entries(keyboards_dir: &Path) -> Result<Vec<KeyboardEntry>> {
    Ok(list_keyboards(keyboards_dir)?
        .into_iter()
        .map(|name| KeyboardEntry {
            path: locate_info_json(keyboards_dir, &name),
            name,
        })
        .collect())
}

/// Lists the keymaps available to a keyboard, sorted by name.
///
/// Every `keymaps/` directory along the keyboard path contributes; a keymap
/// in a deeper directory replaces a same-named one further up.
pub fn list_keymaps(keyboards_dir: &Path, keyboard: &KeyboardId) -> Result<Vec<KeymapEntry>> {
    let mut found = BTreeMap::new();

    for level in keyboard.hierarchy() {
        let keymaps_dir = keyboards_dir.join(level).join(KEYMAPS_DIR);
        if !keymaps_dir.is_dir() {
            continue;
        }

        let entries = fs::read_dir(&keymaps_dir)
            .context(format!("Failed to read directory: {}", keymaps_dir.display()))?;
        for entry in entries {
            let path = entry?.path();
            if !path.is_dir() {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                if !name.starts_with('.') {
                    found.insert(name.to_string(), path.clone());
                }
            }
        }
    }

    Ok(found
        .into_iter()
        .map(|(name, path)| KeymapEntry { name, path })
        .collect())
}
