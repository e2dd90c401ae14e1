//! Crash-safe JSON record persistence.
//!
//! Records are serialized into a uniquely named sibling file, synced, and
//! renamed over the target. Readers see either the old or the new record,
//! never a torn write. This is the only way job records are written.

use std::io::Write;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StorageError;

/// Serializes `record` as pretty JSON and atomically replaces `path`.
///
/// On failure the temporary sibling is removed and `path` is untouched.
pub fn write_json_atomic<T: Serialize + ?Sized>(
    path: &Path,
    record: &T,
) -> Result<(), StorageError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("record");

    let mut json = serde_json::to_vec_pretty(record).map_err(|e| StorageError::Serialize {
        path: path.to_path_buf(),
        source: e,
    })?;
    json.push(b'\n');

    // Dropping the temp file on any early return unlinks it.
    let mut tmp = tempfile::Builder::new()
        .prefix(&format!(".{}.tmp.", file_name))
        .tempfile_in(dir)
        .map_err(|e| StorageError::WriteFile {
            path: dir.to_path_buf(),
            source: e,
        })?;

    tmp.write_all(&json).map_err(|e| StorageError::WriteFile {
        path: tmp.path().to_path_buf(),
        source: e,
    })?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| StorageError::WriteFile {
            path: tmp.path().to_path_buf(),
            source: e,
        })?;

    tmp.persist(path).map_err(|e| StorageError::MoveFile {
        from: e.file.path().to_path_buf(),
        to: path.to_path_buf(),
        source: e.error,
    })?;

    Ok(())
}

/// Reads a JSON record into `T`.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, StorageError> {
    let raw = std::fs::read(path).map_err(|e| StorageError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_slice(&raw).map_err(|e| StorageError::ParseRecord {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Reads a JSON record as an untyped object.
///
/// Anything other than a top-level object is reported as unparsable, since
/// job and outcome records are always objects.
pub fn read_json_object(
    path: &Path,
) -> Result<serde_json::Map<String, serde_json::Value>, StorageError> {
    read_json(path)
}
