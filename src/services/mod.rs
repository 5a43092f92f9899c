//! Service layer for the conversion pipeline.
//!
//! Each service covers one stage: resolving layouts, preprocessing, generating
//! documents, writing output, discovering keyboards and keymaps, and the
//! batch orchestration that ties them together.

pub mod batch;
pub mod converter;
pub mod discovery;
pub mod generator;
pub mod layouts;
pub mod output;
pub mod preprocessor;

// Re-export commonly used types and functions
pub use batch::{run_batch, BatchOptions, BatchReport, KeyboardReport, KeyboardStatus};
pub use converter::{read_source, ConversionRequest, Converter};
pub use discovery::{keyboard_entries, list_keyboards, list_keymaps, KeyboardEntry, KeymapEntry};
pub use generator::generate_document;
pub use layouts::KeyboardLayouts;
pub use preprocessor::{prepare_source, CppPreprocessor, PreprocessRequest, Preprocessor};
