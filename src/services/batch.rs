//! Batch conversion of every keymap of many keyboards.
//!
//! Keyboards are handed to a fixed pool of worker threads through a shared
//! job queue; each worker converts all keymaps of one keyboard, writes the
//! outputs and the keyboard's `keymaps.json` summary, then reports back over
//! a result channel. Workers share nothing mutable: every keyboard owns a
//! distinct output directory.
//!
//! Per keymap the conversion runs through these states:
//!
//! ```text
//! Pending -> read source -> preprocessed attempt -> generated
//!                 |                 |
//!                 |                 +-- retryable failure -> raw attempt -> generated
//!                 |                                                |
//!                 +-- "No C file" / "Unicode Decode Error"         +-- "Unknown Error"
//! ```

use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::sync::Mutex;
use std::thread;
use tracing::{debug, info, warn};

use crate::constants::{KEYMAP_JSON_SUFFIX, SUMMARY_JSON};
use crate::error::ConversionError;
use crate::models::{ConversionAttempt, KeyboardId, KeymapDocument};
use crate::services::converter::{read_source, ConversionRequest, Converter};
use crate::services::discovery::{list_keymaps, KeymapEntry};
use crate::services::layouts::KeyboardLayouts;
use crate::services::output::{write_replacing, write_with_backup};

/// Status recorded when a keymap still fails after the raw retry.
pub const UNKNOWN_ERROR: &str = "Unknown Error";

/// Settings for one batch run.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Root directory receiving `<keyboard>/<keymap>.keymap.json`
    pub output_dir: PathBuf,
    /// Number of worker threads
    pub jobs: usize,
    /// Try the preprocessor first
    pub use_preprocessor: bool,
}

/// Outcome for one keyboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyboardStatus {
    /// All keymaps reached a terminal state and the summary was written.
    Summarized {
        /// Location of `keymaps.json`
        summary_path: PathBuf,
        /// Final record of every keymap, in name order
        attempts: Vec<ConversionAttempt>,
    },
    /// The keyboard was not processed (missing configuration, unreadable tree).
    Skipped {
        /// Why the keyboard was left out
        reason: String,
    },
}

/// Result of processing one keyboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyboardReport {
    /// Keyboard identifier
    pub keyboard: KeyboardId,
    /// What happened
    pub status: KeyboardStatus,
}

impl KeyboardReport {
    /// Keymap records, empty for skipped keyboards.
    pub fn attempts(&self) -> &[ConversionAttempt] {
        match &self.status {
            KeyboardStatus::Summarized { attempts, .. } => attempts,
            KeyboardStatus::Skipped { .. } => &[],
        }
    }
}

/// Results of a whole batch run, sorted by keyboard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// One entry per requested keyboard
    pub keyboards: Vec<KeyboardReport>,
}

impl BatchReport {
    /// Number of keymaps written successfully.
    pub fn converted(&self) -> usize {
        self.attempts().filter(|a| a.succeeded()).count()
    }

    /// Number of keymaps that ended with an error.
    pub fn failed(&self) -> usize {
        self.attempts().filter(|a| !a.succeeded()).count()
    }

    /// Number of keyboards that were left out.
    pub fn skipped(&self) -> usize {
        self.keyboards
            .iter()
            .filter(|k| matches!(k.status, KeyboardStatus::Skipped { .. }))
            .count()
    }

    fn attempts(&self) -> impl Iterator<Item = &ConversionAttempt> {
        self.keyboards.iter().flat_map(KeyboardReport::attempts)
    }
}

/// Converts every keymap of `keyboards` using a pool of worker threads.
///
/// One keymap's failure never stops the run; it is recorded in that
/// keyboard's summary instead.
pub fn run_batch(converter: &Converter<'_>, keyboards: Vec<KeyboardId>, options: &BatchOptions) -> BatchReport {
    if keyboards.is_empty() {
        return BatchReport::default();
    }

    let workers = options.jobs.clamp(1, keyboards.len());
    debug!("Converting {} keyboards with {} workers", keyboards.len(), workers);

    let (job_tx, job_rx) = mpsc::channel();
    for keyboard in keyboards {
        // The receiver is alive until the end of this function
        let _ = job_tx.send(keyboard);
    }
    drop(job_tx);
    let job_rx = Mutex::new(job_rx);

    let (result_tx, result_rx) = mpsc::channel();

    let mut reports: Vec<KeyboardReport> = thread::scope(|scope| {
        for _ in 0..workers {
            let result_tx = result_tx.clone();
            let job_rx = &job_rx;
            scope.spawn(move || loop {
                let next = match job_rx.lock() {
                    Ok(rx) => rx.recv().ok(),
                    Err(_) => None,
                };
                let Some(keyboard) = next else { break };

                let report = process_keyboard(converter, keyboard, options);
                if result_tx.send(report).is_err() {
                    break;
                }
            });
        }
        drop(result_tx);

        result_rx.iter().collect()
    });

    reports.sort_by(|a, b| a.keyboard.cmp(&b.keyboard));
    BatchReport { keyboards: reports }
}

/// Converts all keymaps of one keyboard and writes its summary.
pub fn process_keyboard(converter: &Converter<'_>, keyboard: KeyboardId, options: &BatchOptions) -> KeyboardReport {
    info!("{}", keyboard);

    let layouts = match KeyboardLayouts::load(converter.keyboards_dir(), &keyboard) {
        Ok(layouts) => layouts,
        Err(e) => {
            warn!("{} | skipped: {}", keyboard, e);
            return KeyboardReport {
                keyboard,
                status: KeyboardStatus::Skipped { reason: e.to_string() },
            };
        }
    };

    let keymaps = match list_keymaps(converter.keyboards_dir(), &keyboard) {
        Ok(keymaps) => keymaps,
        Err(e) => {
            warn!("{} | skipped: {:#}", keyboard, e);
            return KeyboardReport {
                keyboard,
                status: KeyboardStatus::Skipped {
                    reason: format!("{e:#}"),
                },
            };
        }
    };

    let keyboard_out = keyboard.dir_in(&options.output_dir);
    let attempts: Vec<ConversionAttempt> = keymaps
        .iter()
        .map(|entry| {
            debug!("{} | {}", keyboard, entry.name);
            convert_keymap(converter, &layouts, entry, &keyboard_out, options.use_preprocessor)
        })
        .collect();

    let summary_path = keyboard_out.join(SUMMARY_JSON);
    let written = serde_json::to_string(&attempts)
        .map_err(|e| e.to_string())
        .and_then(|json| write_replacing(&summary_path, &json).map_err(|e| e.to_string()));

    let status = match written {
        Ok(()) => KeyboardStatus::Summarized {
            summary_path,
            attempts,
        },
        Err(reason) => {
            warn!("{} | summary not written: {}", keyboard, reason);
            KeyboardStatus::Skipped { reason }
        }
    };

    KeyboardReport { keyboard, status }
}

/// Runs one keymap to a terminal state and returns its record.
fn convert_keymap(
    converter: &Converter<'_>,
    layouts: &KeyboardLayouts,
    entry: &KeymapEntry,
    keyboard_out: &Path,
    use_preprocessor: bool,
) -> ConversionAttempt {
    let keyboard = layouts.keyboard();
    let mut attempt = ConversionAttempt::new(&entry.name, &entry.path);
    let source_path = entry.source_path();

    let source = match read_source(&source_path) {
        Ok(source) => source,
        Err(e) => {
            let detail = match &e {
                ConversionError::SourceNotFound { .. } => None,
                _ => Some(e.to_string()),
            };
            debug!("{} | {}: {}", keyboard, entry.name, e);
            attempt.fail(e.status_label(), detail);
            return attempt;
        }
    };

    let request = ConversionRequest::new(keyboard.clone(), &entry.name, source_path)
        .with_preprocessor(use_preprocessor);

    let mut result = converter.convert_source(layouts, &source, &request);

    if use_preprocessor {
        if let Err(e) = &result {
            if e.retry_without_preprocessor() {
                warn!(
                    "{} | {}: {}. Retrying without the preprocessor",
                    keyboard, entry.name, e
                );
                attempt.no_cpp = true;
                result = converter.convert_source(layouts, &source, &request.with_preprocessor(false));
            }
        }
    }

    let output_path = keyboard_out.join(format!("{}{}", entry.name, KEYMAP_JSON_SUFFIX));
    match result.and_then(|doc| write_document(&output_path, &doc)) {
        Ok(()) => debug!("{} | {}: wrote {}", keyboard, entry.name, output_path.display()),
        Err(e) => {
            warn!("{} | {}: {}", keyboard, entry.name, e);
            let status = terminal_status(&e, attempt.no_cpp);
            attempt.fail(status, Some(e.to_string()));
        }
    }

    attempt
}

fn write_document(path: &Path, doc: &KeymapDocument) -> Result<(), ConversionError> {
    let json = doc
        .to_json_pretty()
        .map_err(|e| ConversionError::OutputWriteFailure {
            path: path.to_path_buf(),
            source: std::io::Error::other(e),
        })?;
    write_with_backup(path, &json)
}

/// Status string for a keymap's final error.
///
/// Encoding and write failures keep their own label. Any other failure
/// after the raw retry, and any layer shape mismatch, is reported as
/// `Unknown Error`.
pub fn terminal_status(error: &ConversionError, retried: bool) -> &'static str {
    match error {
        ConversionError::EncodingError { .. } | ConversionError::OutputWriteFailure { .. } => {
            error.status_label()
        }
        ConversionError::LayerShapeMismatch { .. } => UNKNOWN_ERROR,
        _ if retried => UNKNOWN_ERROR,
        _ => error.status_label(),
    }
}
