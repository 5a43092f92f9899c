//! Data models for keyboards, layouts and keymap documents.
//!
//! This module contains the core data structures used throughout the application.
//! Models are independent of the CLI and of file-system access.

pub mod attempt;
pub mod keyboard;
pub mod keymap;
pub mod layout;

// Re-export all model types
pub use attempt::ConversionAttempt;
pub use keyboard::KeyboardId;
pub use keymap::{ExtractedLayer, KeymapDocument, Layer};
pub use layout::{KeyPosition, Layout};
