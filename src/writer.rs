//! Crash-safe file replacement: write-temp → rename-backup → rename-new →
//! unlink-backup, restoring the backup when anything fails in between.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::common::{EngineError, Result};

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

/// Replace `path` with `content` atomically. A partial write never touches
/// the original: the content goes to `path.tmp` first, and the original is
/// only renamed aside once the temp file is complete. Returns the number of
/// bytes written.
pub fn write_atomic(path: &Path, content: &str) -> Result<u64> {
    let tmp = sibling(path, ".tmp");
    let bak = sibling(path, ".bak");

    if let Err(e) = fs::write(&tmp, content.as_bytes()) {
        let _ = fs::remove_file(&tmp);
        return Err(EngineError::file_access(&tmp, e));
    }

    let had_original = path.exists();
    if had_original {
        if let Err(e) = fs::rename(path, &bak) {
            let _ = fs::remove_file(&tmp);
            return Err(EngineError::file_access(path, e));
        }
    }

    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        if had_original {
            if let Err(restore) = fs::rename(&bak, path) {
                warn!(
                    path = %path.display(),
                    error = %restore,
                    "failed to restore backup after aborted write"
                );
            }
        }
        return Err(EngineError::file_access(path, e));
    }

    if had_original {
        if let Err(e) = fs::remove_file(&bak) {
            // the new content is already in place; a leftover .bak is noise,
            // not data loss
            warn!(path = %bak.display(), error = %e, "could not unlink backup file");
        }
    }

    Ok(content.len() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_new_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.unity");
        let bytes = write_atomic(&path, "hello\n").unwrap();
        assert_eq!(bytes, 6);
        assert_eq!(fs::read_to_string(&path).unwrap(), "hello\n");
        assert!(!sibling(&path, ".tmp").exists());
        assert!(!sibling(&path, ".bak").exists());
    }

    #[test]
    fn test_overwrite_leaves_no_droppings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.unity");
        fs::write(&path, "old").unwrap();
        write_atomic(&path, "new content").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "new content");
        assert!(!sibling(&path, ".tmp").exists());
        assert!(!sibling(&path, ".bak").exists());
    }

    #[test]
    fn test_failed_temp_write_preserves_original() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.unity");
        fs::write(&path, "original bytes").unwrap();
        // a directory squatting on the temp path makes the temp write fail
        fs::create_dir(sibling(&path, ".tmp")).unwrap();
        let result = write_atomic(&path, "replacement");
        assert!(matches!(result, Err(EngineError::FileAccess { .. })));
        assert_eq!(fs::read_to_string(&path).unwrap(), "original bytes");
        let _ = fs::remove_dir(sibling(&path, ".tmp"));
    }

    #[test]
    fn test_missing_parent_dir_fails_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no/such/dir/scene.unity");
        let result = write_atomic(&path, "content");
        assert!(matches!(result, Err(EngineError::FileAccess { .. })));
    }
}
