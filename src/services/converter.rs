//! Single-keymap conversion pipeline.
//!
//! Reads a keymap.c file, optionally preprocesses it, extracts the layer
//! table, resolves the keyboard layout and generates the keymap document.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::Config;
use crate::error::{ConversionError, ConversionResult};
use crate::models::{KeyboardId, KeymapDocument};
use crate::parser::keymap_c::extract_layers;
use crate::services::generator::generate_document;
use crate::services::layouts::KeyboardLayouts;
use crate::services::preprocessor::{prepare_source, PreprocessRequest, Preprocessor};

/// Source path that means "standard input".
pub const STDIN_PATH: &str = "-";

/// One keymap to convert.
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    /// Keyboard the keymap belongs to
    pub keyboard: KeyboardId,
    /// Keymap name written into the document
    pub keymap: String,
    /// keymap.c location (`-` for standard input)
    pub source_path: PathBuf,
    /// Layout variant to use instead of the inferred one
    pub layout: Option<String>,
    /// Run the source through the preprocessor first
    pub use_preprocessor: bool,
}

impl ConversionRequest {
    /// Creates a request with the preprocessor enabled and no layout override.
    pub fn new(keyboard: KeyboardId, keymap: impl Into<String>, source_path: impl Into<PathBuf>) -> Self {
        Self {
            keyboard,
            keymap: keymap.into(),
            source_path: source_path.into(),
            layout: None,
            use_preprocessor: true,
        }
    }

    /// Returns the same request with preprocessing switched on or off.
    #[must_use]
    pub fn with_preprocessor(mut self, use_preprocessor: bool) -> Self {
        self.use_preprocessor = use_preprocessor;
        self
    }
}

/// Runs conversions against one QMK tree.
pub struct Converter<'a> {
    keyboards_dir: PathBuf,
    preprocessor: &'a dyn Preprocessor,
}

impl<'a> Converter<'a> {
    /// Creates a converter for the tree configured in `config`.
    pub fn new(config: &Config, preprocessor: &'a dyn Preprocessor) -> Self {
        Self::with_keyboards_dir(config.keyboards_dir(), preprocessor)
    }

    /// Creates a converter for an explicit `keyboards/` directory.
    pub fn with_keyboards_dir(keyboards_dir: impl Into<PathBuf>, preprocessor: &'a dyn Preprocessor) -> Self {
        Self {
            keyboards_dir: keyboards_dir.into(),
            preprocessor,
        }
    }

    /// The `keyboards/` directory conversions resolve layouts in.
    pub fn keyboards_dir(&self) -> &Path {
        &self.keyboards_dir
    }

    /// Reads the source, loads the keyboard's layouts and converts one keymap.
    ///
    /// The source is read first so a missing `keymap.c` is reported as such
    /// even when the keyboard is unknown.
    pub fn convert(&self, request: &ConversionRequest) -> ConversionResult<KeymapDocument> {
        let source = read_source(&request.source_path)?;
        let layouts = KeyboardLayouts::load(&self.keyboards_dir, &request.keyboard)?;
        self.convert_source(&layouts, &source, request)
    }

    /// Converts one keymap against already-loaded layouts.
    pub fn convert_with(
        &self,
        layouts: &KeyboardLayouts,
        request: &ConversionRequest,
    ) -> ConversionResult<KeymapDocument> {
        let source = read_source(&request.source_path)?;
        self.convert_source(layouts, &source, request)
    }

    /// Converts keymap source text that has already been read.
    pub fn convert_source(
        &self,
        layouts: &KeyboardLayouts,
        source: &str,
        request: &ConversionRequest,
    ) -> ConversionResult<KeymapDocument> {
        let pp_request = PreprocessRequest {
            keyboard: &request.keyboard,
            keymap: &request.keymap,
            source_path: &request.source_path,
        };
        let text = prepare_source(self.preprocessor, source, &pp_request, request.use_preprocessor)?;
        let layers = extract_layers(&text)?;

        let mut layout_hint = layers.iter().find_map(|layer| layer.layout.clone());
        if layout_hint.is_none() && request.use_preprocessor {
            // Layout macros are usually expanded away; the raw source still names them.
            layout_hint = extract_layers(source)
                .ok()
                .and_then(|raw| raw.into_iter().find_map(|layer| layer.layout));
        }

        let layout = layouts.resolve(request.layout.as_deref(), layout_hint.as_deref())?;
        debug!(
            "{} | {}: {} layers, layout {} ({} keys)",
            request.keyboard,
            request.keymap,
            layers.len(),
            layout.name,
            layout.key_count()
        );

        generate_document(&request.keyboard, &request.keymap, &layout, &layers)
    }
}

/// Reads a keymap source file as UTF-8 text.
///
/// # Errors
///
/// - `StdinUnsupported` for `-`
/// - `SourceNotFound` if the file does not exist
/// - `SourceRead` if it cannot be read
/// - `EncodingError` if it is not valid UTF-8
pub fn read_source(path: &Path) -> ConversionResult<String> {
    if path.as_os_str() == STDIN_PATH {
        return Err(ConversionError::StdinUnsupported);
    }

    let bytes = fs::read(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => ConversionError::SourceNotFound {
            path: path.to_path_buf(),
        },
        _ => ConversionError::SourceRead {
            path: path.to_path_buf(),
            source,
        },
    })?;

    String::from_utf8(bytes).map_err(|_| ConversionError::EncodingError {
        path: path.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// Appends a third key to every brace-delimited layer, like a macro that expands to extra keys.
    struct Inflating;

    impl Preprocessor for Inflating {
        fn preprocess(&self, source: &str, _request: &PreprocessRequest<'_>) -> ConversionResult<String> {
            Ok(source.replace("KC_B}", "KC_B, KC_EXTRA}"))
        }
    }

    struct Identity;

    impl Preprocessor for Identity {
        fn preprocess(&self, source: &str, _request: &PreprocessRequest<'_>) -> ConversionResult<String> {
            Ok(source.to_string())
        }
    }

    fn mock_tree() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let kb = temp_dir.path().join("kb");
        fs::create_dir_all(kb.join("keymaps/km")).unwrap();
        fs::write(
            kb.join("info.json"),
            r#"{"layouts": {"LAYOUT": {"layout": [{"label": "K0", "x": 0, "y": 0}, {"label": "K1", "x": 1, "y": 0}]}}}"#,
        )
        .unwrap();
        temp_dir
    }

    fn write_keymap(tree: &TempDir, body: &str) -> PathBuf {
        let path = tree.path().join("kb/keymaps/km/keymap.c");
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_two_key_scenario_without_preprocessor() {
        let tree = mock_tree();
        let path = write_keymap(
            &tree,
            "const uint16_t PROGMEM keymaps[][MATRIX_ROWS][MATRIX_COLS] = {\n  {KC_A, KC_B}\n};\n",
        );
        let converter = Converter::with_keyboards_dir(tree.path(), &Identity);
        let request = ConversionRequest::new(KeyboardId::parse("kb").unwrap(), "km", path)
            .with_preprocessor(false);

        let doc = converter.convert(&request).unwrap();
        assert_eq!(
            doc.to_json().unwrap(),
            r#"{"keyboard":"kb","keymap":"km","layout":"LAYOUT","layers":[["KC_A","KC_B"]]}"#
        );
    }

    #[test]
    fn test_preprocessor_output_is_what_gets_extracted() {
        let tree = mock_tree();
        let path = write_keymap(&tree, "const uint16_t keymaps[][1][2] = {{KC_A, KC_B}};");
        let converter = Converter::with_keyboards_dir(tree.path(), &Inflating);
        let request = ConversionRequest::new(KeyboardId::parse("kb").unwrap(), "km", path);

        let err = converter.convert(&request).unwrap_err();
        assert!(matches!(err, ConversionError::LayerShapeMismatch { found: 3, .. }));

        let doc = converter.convert(&request.with_preprocessor(false)).unwrap();
        assert_eq!(doc.layers, vec![vec!["KC_A".to_string(), "KC_B".to_string()]]);
    }

    #[test]
    fn test_three_keycodes_is_shape_mismatch() {
        let tree = mock_tree();
        let path = write_keymap(&tree, "const uint16_t keymaps[][1][3] = {{KC_A, KC_B, KC_C}};");
        let converter = Converter::with_keyboards_dir(tree.path(), &Identity);
        let request = ConversionRequest::new(KeyboardId::parse("kb").unwrap(), "km", path)
            .with_preprocessor(false);

        let err = converter.convert(&request).unwrap_err();
        assert!(matches!(
            err,
            ConversionError::LayerShapeMismatch {
                expected: 2,
                found: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_layout_override_must_exist() {
        let tree = mock_tree();
        let path = write_keymap(&tree, "const uint16_t keymaps[][1][2] = {{KC_A, KC_B}};");
        let converter = Converter::with_keyboards_dir(tree.path(), &Identity);
        let mut request = ConversionRequest::new(KeyboardId::parse("kb").unwrap(), "km", path);
        request.layout = Some("LAYOUT_missing".to_string());

        let err = converter.convert(&request).unwrap_err();
        assert!(matches!(err, ConversionError::LayoutNotFound { .. }));
    }

    #[test]
    fn test_unknown_keyboard_is_configuration_not_found() {
        let tree = mock_tree();
        let path = write_keymap(&tree, "const uint16_t keymaps[][1][2] = {{KC_A, KC_B}};");
        let converter = Converter::with_keyboards_dir(tree.path(), &Identity);
        let request = ConversionRequest::new(KeyboardId::parse("other").unwrap(), "km", path);

        let err = converter.convert(&request).unwrap_err();
        assert!(matches!(err, ConversionError::ConfigurationNotFound { .. }));
    }

    #[test]
    fn test_missing_source_reported_before_unknown_keyboard() {
        let tree = mock_tree();
        let converter = Converter::with_keyboards_dir(tree.path(), &Identity);
        let request = ConversionRequest::new(
            KeyboardId::parse("other").unwrap(),
            "km",
            tree.path().join("other/keymaps/km/keymap.c"),
        );

        let err = converter.convert(&request).unwrap_err();
        assert!(matches!(err, ConversionError::SourceNotFound { .. }));
    }

    #[test]
    fn test_read_source_errors() {
        let temp_dir = TempDir::new().unwrap();

        let err = read_source(Path::new("-")).unwrap_err();
        assert!(matches!(err, ConversionError::StdinUnsupported));

        let err = read_source(&temp_dir.path().join("missing.c")).unwrap_err();
        assert!(matches!(err, ConversionError::SourceNotFound { .. }));

        let latin1 = temp_dir.path().join("latin1.c");
        fs::write(&latin1, b"// caf\xe9\n").unwrap();
        let err = read_source(&latin1).unwrap_err();
        assert!(matches!(err, ConversionError::EncodingError { .. }));
    }
}
