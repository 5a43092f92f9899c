//! Application-wide constants.
//!
//! This module defines constants used throughout the application,
//! including the application name and the fixed file names of the QMK tree.

/// The display name of the application.
pub const APP_NAME: &str = "qmkjson";

/// Environment variable that overrides the configured QMK firmware root.
pub const QMK_HOME_ENV: &str = "QMKJSON_QMK_HOME";

/// Directory under the QMK root that holds keyboard definitions.
pub const KEYBOARDS_DIR: &str = "keyboards";

/// Directory name that holds keymaps below a keyboard directory.
pub const KEYMAPS_DIR: &str = "keymaps";

/// Marker file that makes a directory a keyboard.
pub const RULES_MK: &str = "rules.mk";

/// Keyboard metadata file names, in merge order for one directory level.
pub const INFO_JSON: &str = "info.json";
/// Data-driven keyboard definition file.
pub const KEYBOARD_JSON: &str = "keyboard.json";

/// Keymap source file inside a keymap directory.
pub const KEYMAP_C: &str = "keymap.c";

/// Suffix of per-keymap batch output files.
pub const KEYMAP_JSON_SUFFIX: &str = ".keymap.json";

/// File name of the per-keyboard batch summary.
pub const SUMMARY_JSON: &str = "keymaps.json";

/// Suffix appended to an existing output file before it is overwritten.
pub const BACKUP_SUFFIX: &str = ".bak";
