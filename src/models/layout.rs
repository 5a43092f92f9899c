//! Physical layout variants declared by a keyboard.

use serde::{Deserialize, Serialize};

/// One key position of a layout as declared in info.json.
///
/// The fields are carried through untouched; the conversion pipeline only
/// relies on the number and order of positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyPosition {
    /// Optional legend, e.g. `"K00"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Physical X position in keyboard units
    #[serde(default)]
    pub x: f32,
    /// Physical Y position in keyboard units
    #[serde(default)]
    pub y: f32,
    /// Key width in keyboard units (default 1.0)
    #[serde(default = "default_key_size")]
    pub w: f32,
    /// Key height in keyboard units (default 1.0)
    #[serde(default = "default_key_size")]
    pub h: f32,
    /// Matrix position [row, col]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matrix: Option<[u8; 2]>,
}

fn default_key_size() -> f32 {
    1.0
}

impl KeyPosition {
    /// Creates a 1u key at the given coordinates with a label.
    pub fn labeled(label: impl Into<String>, x: f32, y: f32) -> Self {
        Self {
            label: Some(label.into()),
            x,
            y,
            w: 1.0,
            h: 1.0,
            matrix: None,
        }
    }
}

/// A resolved layout variant: its canonical name and ordered key positions.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    /// Canonical layout name (e.g. `"LAYOUT_ortho_5x15"`)
    pub name: String,
    /// Key positions in declaration order
    pub keys: Vec<KeyPosition>,
}

impl Layout {
    /// Creates a layout from a name and its positions.
    pub fn new(name: impl Into<String>, keys: Vec<KeyPosition>) -> Self {
        Self {
            name: name.into(),
            keys,
        }
    }

    /// Number of physical key positions.
    pub fn key_count(&self) -> usize {
        self.keys.len()
    }
}
