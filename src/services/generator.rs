//! Keymap document generation.
//!
//! Checks extracted layers against the resolved layout and assembles the
//! canonical `{keyboard, keymap, layout, layers}` document.

use crate::error::{ConversionError, ConversionResult};
use crate::models::{ExtractedLayer, KeyboardId, KeymapDocument, Layout};

/// Builds a keymap document from extracted layers.
///
/// Layers keep their source order and their keycodes keep the layout's
/// position order; nothing is reordered.
///
/// # Errors
///
/// `LayerShapeMismatch` for the first layer whose keycode count differs from
/// the layout's key count. No document is produced in that case.
pub fn generate_document(
    keyboard: &KeyboardId,
    keymap: &str,
    layout: &Layout,
    layers: &[ExtractedLayer],
) -> ConversionResult<KeymapDocument> {
    let expected = layout.key_count();

    if let Some((index, layer)) = layers
        .iter()
        .enumerate()
        .find(|(_, layer)| layer.keycodes.len() != expected)
    {
        return Err(ConversionError::LayerShapeMismatch {
            layer: index,
            layout: layout.name.clone(),
            expected,
            found: layer.keycodes.len(),
        });
    }

    Ok(KeymapDocument {
        keyboard: keyboard.to_string(),
        keymap: keymap.to_string(),
        layout: layout.name.clone(),
        layers: layers.iter().map(|layer| layer.keycodes.clone()).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::KeyPosition;

    fn two_key_layout() -> Layout {
        Layout::new(
            "LAYOUT",
            vec![
                KeyPosition::labeled("K0", 0.0, 0.0),
                KeyPosition::labeled("K1", 1.0, 0.0),
            ],
        )
    }

    fn layer(name: &str, keycodes: &[&str]) -> ExtractedLayer {
        ExtractedLayer {
            name: name.to_string(),
            layout: Some("LAYOUT".to_string()),
            keycodes: keycodes.iter().map(ToString::to_string).collect(),
        }
    }

    #[test]
    fn test_layers_keep_source_order() {
        let keyboard = KeyboardId::parse("kb").unwrap();
        let layers = vec![
            layer("_BASE", &["KC_A", "KC_B"]),
            layer("_FN", &["MO(2)", "KC_TRNS"]),
            layer("_ADJ", &["QK_BOOT", "KC_NO"]),
        ];

        let doc = generate_document(&keyboard, "km", &two_key_layout(), &layers).unwrap();

        assert_eq!(doc.keyboard, "kb");
        assert_eq!(doc.keymap, "km");
        assert_eq!(doc.layout, "LAYOUT");
        let expected: Vec<Vec<String>> = layers.into_iter().map(|l| l.keycodes).collect();
        assert_eq!(doc.layers, expected);
    }

    #[test]
    fn test_shape_mismatch_reports_first_bad_layer() {
        let keyboard = KeyboardId::parse("kb").unwrap();
        let layers = vec![
            layer("0", &["KC_A", "KC_B"]),
            layer("1", &["KC_A", "KC_B", "KC_C"]),
            layer("2", &["KC_A"]),
        ];

        match generate_document(&keyboard, "km", &two_key_layout(), &layers).unwrap_err() {
            ConversionError::LayerShapeMismatch {
                layer,
                layout,
                expected,
                found,
            } => {
                assert_eq!(layer, 1);
                assert_eq!(layout, "LAYOUT");
                assert_eq!(expected, 2);
                assert_eq!(found, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_short_layer_is_mismatch() {
        let keyboard = KeyboardId::parse("kb").unwrap();
        let layers = vec![layer("0", &["KC_A"])];

        let err = generate_document(&keyboard, "km", &two_key_layout(), &layers).unwrap_err();
        assert!(matches!(err, ConversionError::LayerShapeMismatch { found: 1, .. }));
    }
}
