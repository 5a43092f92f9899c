//! Writing generated documents to disk.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::constants::BACKUP_SUFFIX;
use crate::error::{ConversionError, ConversionResult};

/// Path of the backup kept for `path` (`foo.keymap.json` -> `foo.keymap.json.bak`).
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(BACKUP_SUFFIX);
    PathBuf::from(name)
}

/// Writes `content` to `path`, keeping the previous file as `<path>.bak`.
///
/// The content goes to a temp file first; only after that succeeds is the
/// existing target moved aside and the temp file renamed into place. An
/// older backup is replaced, so repeated runs leave a single `.bak`.
pub fn write_with_backup(path: &Path, content: &str) -> ConversionResult<()> {
    write_output(path, content, true)
}

/// Writes `content` to `path`, replacing any existing file.
pub fn write_replacing(path: &Path, content: &str) -> ConversionResult<()> {
    write_output(path, content, false)
}

fn write_output(path: &Path, content: &str, keep_backup: bool) -> ConversionResult<()> {
    let fail = |source: io::Error| ConversionError::OutputWriteFailure {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(fail)?;
    }

    let mut temp_name = path.as_os_str().to_os_string();
    temp_name.push(".tmp");
    let temp_path = PathBuf::from(temp_name);

    fs::write(&temp_path, content).map_err(fail)?;

    replace_target(path, &temp_path, keep_backup).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        fail(e)
    })
}

/// Moves the existing target aside (or drops it) and renames the temp file into place.
fn replace_target(path: &Path, temp_path: &Path, keep_backup: bool) -> io::Result<()> {
    if keep_backup && path.exists() {
        let backup = backup_path(path);
        if backup.exists() {
            // rename() does not replace an existing file on every platform
            fs::remove_file(&backup)?;
        }
        fs::rename(path, &backup)?;
    }

    fs::rename(temp_path, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_backup_path() {
        assert_eq!(
            backup_path(Path::new("out/km.keymap.json")),
            PathBuf::from("out/km.keymap.json.bak")
        );
    }

    #[test]
    fn test_write_creates_parent_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("a/b/km.keymap.json");

        write_with_backup(&target, "{}").unwrap();

        assert_eq!(fs::read_to_string(&target).unwrap(), "{}");
        assert!(!backup_path(&target).exists());
    }

    #[test]
    fn test_repeated_writes_keep_one_backup() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("km.keymap.json");

        write_with_backup(&target, "first").unwrap();
        write_with_backup(&target, "second").unwrap();
        write_with_backup(&target, "third").unwrap();

        assert_eq!(fs::read_to_string(&target).unwrap(), "third");
        assert_eq!(fs::read_to_string(backup_path(&target)).unwrap(), "second");

        let names: Vec<String> = fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 2, "unexpected files: {names:?}");
    }

    #[test]
    fn test_write_replacing_has_no_backup() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("keymaps.json");

        write_replacing(&target, "[]").unwrap();
        write_replacing(&target, "[{}]").unwrap();

        assert_eq!(fs::read_to_string(&target).unwrap(), "[{}]");
        assert!(!backup_path(&target).exists());
    }

    #[test]
    fn test_failed_backup_leaves_no_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("km.keymap.json");
        fs::write(&target, "old").unwrap();

        // A non-empty directory where the backup goes cannot be removed as a file
        let backup = backup_path(&target);
        fs::create_dir_all(backup.join("blocker")).unwrap();

        let err = write_with_backup(&target, "new").unwrap_err();
        assert!(matches!(err, ConversionError::OutputWriteFailure { .. }));

        assert_eq!(fs::read_to_string(&target).unwrap(), "old");
        assert!(!temp_dir.path().join("km.keymap.json.tmp").exists());
    }

    #[test]
    fn test_unwritable_target_is_output_failure() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("file");
        fs::write(&blocker, "x").unwrap();

        let err = write_with_backup(&blocker.join("km.keymap.json"), "{}").unwrap_err();
        assert!(matches!(err, ConversionError::OutputWriteFailure { .. }));
    }
}
