//! Layout resolution for a keyboard.
//!
//! Loads the merged keyboard metadata once and answers "which physical layout
//! does this keymap use" for every keymap of that keyboard.

use std::path::Path;
use tracing::debug;

use crate::error::{ConversionError, ConversionResult};
use crate::models::{KeyboardId, Layout};
use crate::parser::keyboard_json::{extract_layout_names, load_keyboard_info, QmkInfoJson};

/// Name of the layout used when a keymap does not say which one it targets.
const DEFAULT_LAYOUT: &str = "LAYOUT";

/// The layouts declared by one keyboard.
#[derive(Debug, Clone)]
pub struct KeyboardLayouts {
    keyboard: KeyboardId,
    info: QmkInfoJson,
}

impl KeyboardLayouts {
    /// Loads the layouts of `keyboard` from a `keyboards/` directory.
    ///
    /// # Errors
    ///
    /// - `ConfigurationNotFound` if no info.json/keyboard.json exists along the path
    /// - `ConfigurationInvalid` if one of them cannot be parsed
    pub fn load(keyboards_dir: &Path, keyboard: &KeyboardId) -> ConversionResult<Self> {
        let info = load_keyboard_info(keyboards_dir, keyboard)
            .map_err(|e| ConversionError::ConfigurationInvalid {
                keyboard: keyboard.to_string(),
                reason: format!("{e:#}"),
            })?
            .ok_or_else(|| ConversionError::ConfigurationNotFound {
                keyboard: keyboard.to_string(),
                searched: keyboard.dir_in(keyboards_dir),
            })?;

        Ok(Self::from_info(keyboard.clone(), info))
    }

    /// Wraps already-parsed metadata.
    pub fn from_info(keyboard: KeyboardId, info: QmkInfoJson) -> Self {
        Self { keyboard, info }
    }

    /// Keyboard these layouts belong to.
    pub fn keyboard(&self) -> &KeyboardId {
        &self.keyboard
    }

    /// Declared layout names, sorted.
    pub fn names(&self) -> Vec<String> {
        extract_layout_names(&self.info)
    }

    /// Looks up a layout by name or alias, returning it under its canonical name.
    pub fn get(&self, name: &str) -> Option<Layout> {
        if let Some(def) = self.info.layouts.get(name) {
            return Some(Layout::new(name, def.layout.clone()));
        }

        let target = self.info.layout_aliases.get(name)?;
        self.info
            .layouts
            .get(target)
            .map(|def| Layout::new(target.clone(), def.layout.clone()))
    }

    /// Picks the layout for a keymap.
    ///
    /// An explicit override must exist. Otherwise the layout macro named in
    /// the source is used when the keyboard declares it, falling back to the
    /// keyboard's only layout or its `LAYOUT`.
    ///
    /// # Errors
    ///
    /// `LayoutNotFound` when none of the above yields a layout.
    pub fn resolve(&self, explicit: Option<&str>, from_source: Option<&str>) -> ConversionResult<Layout> {
        if let Some(name) = explicit {
            return self.get(name).ok_or_else(|| self.not_found(Some(name)));
        }

        if let Some(name) = from_source {
            if let Some(layout) = self.get(name) {
                return Ok(layout);
            }
            debug!(
                "{}: layout macro {} is not declared, falling back to the default layout",
                self.keyboard, name
            );
        }

        self.default_layout().ok_or_else(|| self.not_found(from_source))
    }

    fn default_layout(&self) -> Option<Layout> {
        if self.info.layouts.len() == 1 {
            let (name, def) = self.info.layouts.iter().next()?;
            return Some(Layout::new(name.clone(), def.layout.clone()));
        }

        self.get(DEFAULT_LAYOUT)
    }

    fn not_found(&self, requested: Option<&str>) -> ConversionError {
        ConversionError::LayoutNotFound {
            keyboard: self.keyboard.to_string(),
            requested: requested.map(str::to_string),
            available: self.names(),
        }
    }
}
