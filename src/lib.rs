//! qmkjson library
//!
//! Converts QMK keymap.c sources into keymap.json documents: resolves the
//! keyboard's physical layout, optionally runs the C preprocessor, extracts
//! the layer table and checks every layer against the layout. A batch
//! orchestrator does the same for every keymap of a QMK tree.

// Module declarations
pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod parser;
pub mod services;
