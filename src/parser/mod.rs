//! Parsing for the QMK file formats the converter reads.
//!
//! `keyboard_json` handles info.json/keyboard.json metadata, `keymap_c`
//! pulls the layer table out of keymap.c source.

pub mod keyboard_json;
pub mod keymap_c;

// Re-export commonly used functions
pub use keyboard_json::{load_keyboard_info, locate_info_json};
pub use keymap_c::extract_layers;
