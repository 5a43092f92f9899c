//! Shared test fixtures for E2E CLI tests.
#![allow(dead_code)] // Not every test binary uses every fixture

use qmkjson::config::Config;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Preprocessor command that does not exist, so preprocessing always fails.
pub const MISSING_CPP: &str = "qmkjson-test-missing-cpp";

/// info.json declaring a single two-key `LAYOUT`.
pub const TWO_KEY_INFO: &str = r#"{
    "keyboard_name": "kb",
    "layouts": {
        "LAYOUT": {"layout": [{"label": "K0", "x": 0, "y": 0}, {"label": "K1", "x": 1, "y": 0}]}
    }
}"#;

/// The xd75 keymap.c used for realistic conversions (5 layers, 75 keys each).
pub const XD75_KEYMAP: &[u8] = include_bytes!("xd75_keymap.c");

/// Path to the qmkjson binary built for the tests.
pub fn qmkjson_bin() -> &'static str {
    env!("CARGO_BIN_EXE_qmkjson")
}

/// Builds a keymap.c whose `keymaps` table contains one brace group per layer.
pub fn keymap_source(layers: &[&str]) -> String {
    let body: Vec<String> = layers.iter().map(|layer| format!("    {{{layer}}}")).collect();
    format!(
        "#include QMK_KEYBOARD_H\n\nconst uint16_t PROGMEM keymaps[][MATRIX_ROWS][MATRIX_COLS] = {{\n{}\n}};\n",
        body.join(",\n")
    )
}

/// info.json for the xd75 with its `LAYOUT_ortho_5x15` (matrix order).
pub fn xd75_info_json() -> String {
    let keys: Vec<String> = (0..5)
        .flat_map(|row| {
            (0..15).map(move |col| {
                format!(r#"{{"x": {col}, "y": {row}, "matrix": [{row}, {col}]}}"#)
            })
        })
        .collect();

    format!(
        r#"{{"keyboard_name": "XD75", "layouts": {{"LAYOUT_ortho_5x15": {{"layout": [{}]}}}}}}"#,
        keys.join(", ")
    )
}

/// A throwaway QMK tree plus a config file pointing at it.
pub struct MockQmk {
    dir: TempDir,
    config_path: PathBuf,
}

impl MockQmk {
    /// Creates an empty tree whose config uses a preprocessor that cannot start.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        fs::create_dir_all(dir.path().join("keyboards")).expect("Failed to create keyboards dir");

        let mut config = Config::new();
        config.paths.qmk_home = dir.path().to_path_buf();
        config.paths.output_dir = dir.path().join("out");
        config.preprocessor.command = MISSING_CPP.to_string();
        config.batch.jobs = 2;

        let config_path = dir.path().join("config.toml");
        config.save_to(&config_path).expect("Failed to write config");

        Self { dir, config_path }
    }

    /// Root of the tree (`qmk_home`).
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// The `keyboards/` directory.
    pub fn keyboards_dir(&self) -> PathBuf {
        self.root().join("keyboards")
    }

    /// Batch output root from the config.
    pub fn output_dir(&self) -> PathBuf {
        self.root().join("out")
    }

    /// Adds a keyboard directory with `rules.mk` and an info.json.
    pub fn add_keyboard(&self, keyboard: &str, info_json: &str) -> PathBuf {
        let dir = self.keyboards_dir().join(keyboard);
        fs::create_dir_all(&dir).expect("Failed to create keyboard dir");
        fs::write(dir.join("rules.mk"), "").expect("Failed to write rules.mk");
        fs::write(dir.join("info.json"), info_json).expect("Failed to write info.json");
        dir
    }

    /// Adds `keyboards/<keyboard>/keymaps/<keymap>/keymap.c`.
    pub fn add_keymap(&self, keyboard: &str, keymap: &str, source: &[u8]) -> PathBuf {
        let dir = self.keyboards_dir().join(keyboard).join("keymaps").join(keymap);
        fs::create_dir_all(&dir).expect("Failed to create keymap dir");
        let path = dir.join("keymap.c");
        fs::write(&path, source).expect("Failed to write keymap.c");
        path
    }

    /// A `qmkjson` command already pointed at this tree's config.
    pub fn command(&self) -> Command {
        let mut cmd = Command::new(qmkjson_bin());
        cmd.arg("--config")
            .arg(&self.config_path)
            .env_remove("QMKJSON_QMK_HOME")
            .env_remove("RUST_LOG");
        cmd
    }
}
