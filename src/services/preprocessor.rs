//! C preprocessor adapter.
//!
//! When enabled, keymap.c text is piped through an external preprocessor
//! (`cpp` by default) with the keyboard's include directories and the usual
//! QMK defines. The child process is killed if it outlives the configured
//! timeout.

use std::borrow::Cow;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::config::Config;
use crate::error::{ConversionError, ConversionResult};
use crate::models::KeyboardId;

/// How often a running preprocessor is polled for completion.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// QMK directories added to the include path when they exist.
const QMK_INCLUDE_DIRS: &[&str] = &[
    "quantum",
    "quantum/keymap_extras",
    "quantum/process_keycode",
    "platforms",
    "tmk_core",
    "drivers",
];

/// What is being preprocessed.
#[derive(Debug, Clone, Copy)]
pub struct PreprocessRequest<'a> {
    /// Keyboard the keymap belongs to
    pub keyboard: &'a KeyboardId,
    /// Keymap name
    pub keymap: &'a str,
    /// Location of the keymap.c file (its directory is searched for includes)
    pub source_path: &'a Path,
}

/// Expands keymap source text.
pub trait Preprocessor: Send + Sync {
    /// Returns the expanded text for `source`.
    fn preprocess(&self, source: &str, request: &PreprocessRequest<'_>) -> ConversionResult<String>;
}

/// Produces the text handed to the extractor.
///
/// With `use_preprocessor == false` the source is returned unchanged.
pub fn prepare_source<'s>(
    preprocessor: &dyn Preprocessor,
    source: &'s str,
    request: &PreprocessRequest<'_>,
    use_preprocessor: bool,
) -> ConversionResult<Cow<'s, str>> {
    if !use_preprocessor {
        return Ok(Cow::Borrowed(source));
    }

    preprocessor.preprocess(source, request).map(Cow::Owned)
}

/// Runs an external C preprocessor as a subprocess.
#[derive(Debug, Clone)]
pub struct CppPreprocessor {
    command: String,
    args: Vec<String>,
    timeout: Duration,
    qmk_home: PathBuf,
}

impl CppPreprocessor {
    /// Creates a preprocessor from explicit settings.
    pub fn new(
        command: impl Into<String>,
        args: Vec<String>,
        timeout: Duration,
        qmk_home: impl Into<PathBuf>,
    ) -> Self {
        Self {
            command: command.into(),
            args,
            timeout,
            qmk_home: qmk_home.into(),
        }
    }

    /// Creates a preprocessor from the application configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.preprocessor.command.clone(),
            config.preprocessor.args.clone(),
            config.preprocessor.timeout(),
            config.paths.qmk_home.clone(),
        )
    }

    /// Include directories, most specific first.
    ///
    /// The keymap's own directory, then each keyboard directory from the
    /// deepest level up, then the shared QMK directories.
    pub fn include_dirs(&self, request: &PreprocessRequest<'_>) -> Vec<PathBuf> {
        let keyboards_dir = self.qmk_home.join(crate::constants::KEYBOARDS_DIR);
        let mut dirs = Vec::new();

        if let Some(parent) = request.source_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            dirs.push(parent.to_path_buf());
        }

        dirs.extend(
            request
                .keyboard
                .hierarchy()
                .into_iter()
                .rev()
                .map(|level| keyboards_dir.join(level)),
        );

        dirs.extend(QMK_INCLUDE_DIRS.iter().map(|dir| self.qmk_home.join(dir)));
        dirs.retain(|dir| dir.is_dir());
        dirs
    }

    /// Macro definitions QMK's build would provide.
    pub fn defines(request: &PreprocessRequest<'_>) -> Vec<String> {
        vec![
            format!("-DQMK_KEYBOARD=\"{}\"", request.keyboard),
            format!("-DQMK_KEYBOARD_H=\"{}.h\"", request.keyboard.leaf()),
            format!("-DQMK_KEYMAP=\"{}\"", request.keymap),
            format!("-DQMK_KEYMAP_H=\"{}.h\"", request.keymap),
            format!("-DQMK_KEYMAP_CONFIG_H=\"{}\"", request.source_path.with_file_name("config.h").display()),
        ]
    }

    /// Full argument list: configured args, `-P`, includes, defines, stdin marker.
    pub fn arguments(&self, request: &PreprocessRequest<'_>) -> Vec<String> {
        let mut args = self.args.clone();
        args.push("-P".to_string());
        args.extend(
            self.include_dirs(request)
                .into_iter()
                .map(|dir| format!("-I{}", dir.display())),
        );
        args.extend(Self::defines(request));
        args.push("-".to_string());
        args
    }

    fn failure(&self, exit_code: Option<i32>, stderr: impl Into<String>) -> ConversionError {
        ConversionError::PreprocessorFailure {
            exit_code,
            stderr: stderr.into(),
        }
    }
}

impl Preprocessor for CppPreprocessor {
    fn preprocess(&self, source: &str, request: &PreprocessRequest<'_>) -> ConversionResult<String> {
        let args = self.arguments(request);
        debug!("Running: {} {}", self.command, args.join(" "));

        let mut child = Command::new(&self.command)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.failure(None, format!("failed to start '{}': {e}", self.command)))?;

        let input = source.to_owned();
        let stdin = child.stdin.take();
        let writer = thread::spawn(move || {
            if let Some(mut stdin) = stdin {
                // A preprocessor that exits early closes the pipe; its exit status tells the story.
                let _ = stdin.write_all(input.as_bytes());
            }
        });
        let stdout = spawn_reader(child.stdout.take());
        let stderr = spawn_reader(child.stderr.take());

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if Instant::now() >= deadline => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(self.failure(
                        None,
                        format!("'{}' timed out after {}s", self.command, self.timeout.as_secs()),
                    ));
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(e) => {
                    let _ = child.kill();
                    return Err(self.failure(None, format!("failed to wait for '{}': {e}", self.command)));
                }
            }
        };

        let _ = writer.join();
        let stdout = stdout.join().unwrap_or_default();
        let stderr = stderr.join().unwrap_or_default();

        if !status.success() {
            return Err(self.failure(
                status.code(),
                String::from_utf8_lossy(&stderr).trim().to_string(),
            ));
        }

        String::from_utf8(stdout).map_err(|_| ConversionError::EncodingError {
            path: request.source_path.to_path_buf(),
        })
    }
}

fn spawn_reader<R: Read + Send + 'static>(pipe: Option<R>) -> thread::JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        buf
    })
}
