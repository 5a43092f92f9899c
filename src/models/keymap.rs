//! Keymap documents and the raw layers extracted from keymap.c.

use serde::{Deserialize, Serialize};

/// One layer's keycodes, one per physical key position.
pub type Layer = Vec<String>;

/// A layer as found in C source, before it is checked against a layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedLayer {
    /// Designator text (`_BASE`, `0`) or the declaration index
    pub name: String,
    /// Layout macro used to declare the layer (`LAYOUT_ortho_5x15`), if any
    pub layout: Option<String>,
    /// Keycode tokens in source order
    pub keycodes: Vec<String>,
}

/// The canonical keymap.json document.
///
/// Field order is the serialization order: keyboard, keymap, layout, layers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeymapDocument {
    /// Keyboard identifier
    pub keyboard: String,
    /// Keymap name
    pub keymap: String,
    /// Layout variant name
    pub layout: String,
    /// Layers in source declaration order
    pub layers: Vec<Layer>,
}

impl KeymapDocument {
    /// Serializes the document as a single line of JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Serializes the document as indented JSON.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_field_order() {
        let doc = KeymapDocument {
            keyboard: "kb".to_string(),
            keymap: "km".to_string(),
            layout: "LAYOUT".to_string(),
            layers: vec![vec!["KC_A".to_string(), "KC_B".to_string()]],
        };

        assert_eq!(
            doc.to_json().unwrap(),
            r#"{"keyboard":"kb","keymap":"km","layout":"LAYOUT","layers":[["KC_A","KC_B"]]}"#
        );
    }
}
