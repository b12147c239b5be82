//! File-system side of compilation: idempotent writes, directory cleanup
//! and the top-level error log.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::Result;

/// Write `code` to `path`, creating parent directories.
///
/// Returns `false` without touching the file when it already holds exactly
/// `code`; otherwise the file is overwritten in full.
pub fn write_file(path: &Path, code: &str) -> Result<bool> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    if path.exists() && fs::read(path)? == code.as_bytes() {
        tracing::debug!(path = %path.display(), "unchanged, skipping write");
        return Ok(false);
    }

    fs::write(path, code)?;
    Ok(true)
}

/// Remove every entry of `path` except those named in `keep`.
/// A missing directory is left alone.
pub fn empty_dir(path: &Path, keep: &[&str]) -> Result<()> {
    if !path.exists() {
        return Ok(());
    }

    for entry in fs::read_dir(path)? {
        let entry = entry?;
        if keep.iter().any(|name| entry.file_name() == *name) {
            continue;
        }
        let entry_path = entry.path();
        if entry.file_type()?.is_dir() {
            fs::remove_dir_all(&entry_path)?;
        } else {
            fs::remove_file(&entry_path)?;
        }
    }

    Ok(())
}

/// Log a top-level build error with its full cause chain under `logs_dir`.
///
/// The file is named `error_<YYYY-MM-DD>__<HH-MM-SS>.log`. Returns its path;
/// the caller still propagates the error.
pub fn save_error(logs_dir: &Path, error: &anyhow::Error) -> Result<PathBuf> {
    let timestamp = Local::now().format("%Y-%m-%d__%H-%M-%S");
    let log_path = logs_dir.join(format!("error_{}.log", timestamp));

    fs::create_dir_all(logs_dir)?;
    fs::write(&log_path, format!("{:?}\n", error))?;

    Ok(log_path)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_file_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a/b/c.js");
        assert!(write_file(&path, "export {}").unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), "export {}");
    }

    #[test]
    fn test_write_file_overwrites_fully() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("theme.js");
        write_file(&path, "a much longer first version").unwrap();
        assert!(write_file(&path, "short").unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), "short");
    }

    #[test]
    fn test_empty_dir_keeps_named_entries() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("keep.json"), "{}").unwrap();
        fs::write(dir.path().join("drop.js"), "").unwrap();
        fs::create_dir_all(dir.path().join("nested/deep")).unwrap();

        empty_dir(dir.path(), &["keep.json"]).unwrap();

        let left: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(left, vec!["keep.json"]);
    }

    #[test]
    fn test_empty_dir_missing_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        assert!(empty_dir(&dir.path().join("nope"), &[]).is_ok());
    }

    #[test]
    fn test_save_error_writes_cause_chain() {
        let dir = tempfile::tempdir().unwrap();
        let err = anyhow::anyhow!("disk full").context("failed to write theme");
        let path = save_error(dir.path(), &err).unwrap();

        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("error_"));
        assert!(name.ends_with(".log"));
        assert_eq!(name.len(), "error_2024-01-01__00-00-00.log".len());

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("failed to write theme"));
        assert!(contents.contains("disk full"));
    }
}
