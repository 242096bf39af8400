//! Atomic file writes for trace and report output.
//!
//! Content is written to a temporary file in the target directory, fsynced,
//! then renamed over the target. Readers never observe a half-written file.

use anyhow::{Context, Result};
use camino::Utf8Path;
use std::fs;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

#[cfg(target_os = "windows")]
use std::{thread, time::Duration};

/// Atomically write content to a file using temp file + fsync + rename.
///
/// Line endings are normalized to LF and missing parent directories are created.
pub fn write_file_atomic(path: &Utf8Path, content: &str) -> Result<()> {
    let normalized_content = normalize_line_endings(content);

    let parent = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    fs::create_dir_all(parent)
        .with_context(|| format!("Failed to create parent directory: {parent}"))?;

    let mut temp_file = NamedTempFile::new_in(parent)
        .with_context(|| format!("Failed to create temporary file in: {parent}"))?;

    temp_file
        .write_all(normalized_content.as_bytes())
        .with_context(|| "Failed to write content to temporary file")?;

    temp_file
        .as_file()
        .sync_all()
        .with_context(|| "Failed to fsync temporary file")?;

    atomic_rename(temp_file, path.as_std_path())
        .with_context(|| format!("Failed to atomically write file: {path}"))
}

fn normalize_line_endings(content: &str) -> String {
    content.replace("\r\n", "\n").replace('\r', "\n")
}

/// Rename with bounded exponential backoff; virus scanners and indexers can
/// briefly hold the target open on Windows.
#[cfg(target_os = "windows")]
fn atomic_rename(mut temp_file: NamedTempFile, target: &Path) -> Result<()> {
    use std::io::ErrorKind;

    const MAX_RETRIES: u32 = 5;
    const INITIAL_DELAY_MS: u64 = 10;

    let mut retry_count = 0;
    loop {
        match temp_file.persist(target) {
            Ok(_) => {
                if retry_count > 0 {
                    tracing::debug!(
                        path = %target.display(),
                        retry_count,
                        "Rename succeeded after retries"
                    );
                }
                return Ok(());
            }
            Err(persist_error) => {
                let retryable = matches!(
                    persist_error.error.kind(),
                    ErrorKind::PermissionDenied | ErrorKind::Other
                );
                if !retryable || retry_count >= MAX_RETRIES {
                    return Err(anyhow::anyhow!(persist_error.error));
                }
                thread::sleep(Duration::from_millis(INITIAL_DELAY_MS * 2_u64.pow(retry_count)));
                retry_count += 1;
                temp_file = persist_error.file;
            }
        }
    }
}

#[cfg(not(target_os = "windows"))]
fn atomic_rename(temp_file: NamedTempFile, target: &Path) -> Result<()> {
    temp_file
        .persist(target)
        .map(|_| ())
        .map_err(|e| anyhow::anyhow!(e.error))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn utf8(path: &Path) -> &Utf8Path {
        Utf8Path::from_path(path).unwrap()
    }

    #[test]
    fn test_normalize_line_endings() {
        assert_eq!(normalize_line_endings("a\r\nb\r\nc"), "a\nb\nc");
        assert_eq!(normalize_line_endings("a\rb"), "a\nb");
        assert_eq!(normalize_line_endings("mixed\r\nline\nend\r"), "mixed\nline\nend\n");
    }

    #[test]
    fn test_atomic_write_basic() {
        let temp_dir = TempDir::new().unwrap();
        let path_buf = temp_dir.path().join("trace.json");
        let file_path = utf8(&path_buf);

        write_file_atomic(file_path, "{\"a\":1}\r\n").unwrap();
        assert_eq!(fs::read_to_string(&path_buf).unwrap(), "{\"a\":1}\n");
    }

    #[test]
    fn test_atomic_write_creates_parent_directories() {
        let temp_dir = TempDir::new().unwrap();
        let path_buf = temp_dir.path().join("build").join("reports").join("trace.json");

        write_file_atomic(utf8(&path_buf), "[]").unwrap();
        assert_eq!(fs::read_to_string(&path_buf).unwrap(), "[]");
    }

    #[test]
    fn test_atomic_write_replaces_existing_content() {
        let temp_dir = TempDir::new().unwrap();
        let path_buf = temp_dir.path().join("trace.json");
        fs::write(&path_buf, "old content that is longer").unwrap();

        write_file_atomic(utf8(&path_buf), "new").unwrap();
        assert_eq!(fs::read_to_string(&path_buf).unwrap(), "new");

        let leftovers: Vec<_> = fs::read_dir(temp_dir.path()).unwrap().collect();
        assert_eq!(leftovers.len(), 1, "temporary files must not be left behind");
    }

    #[test]
    fn test_atomic_write_fails_when_parent_is_a_file() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("blocker");
        fs::write(&blocker, "not a directory").unwrap();

        let err = write_file_atomic(utf8(&blocker.join("trace.json")), "[]").unwrap_err();
        assert!(format!("{err:#}").contains("Failed to create parent directory"));
    }
}
