use std::path::{Path, PathBuf};

use crate::error::StorageError;

/// Move a file from `src` to `dst`. Uses `rename` first (atomic on the same
/// filesystem). Falls back to copy + delete when rename fails, which covers
/// source buckets mounted on a different device than the spool.
///
/// Refuses to replace an existing `dst`.
pub fn move_file(src: &Path, dst: &Path) -> Result<(), StorageError> {
    if std::fs::symlink_metadata(dst).is_ok() {
        return Err(StorageError::FileExists(dst.to_path_buf()));
    }

    // Fast path: atomic rename
    let rename_err = match std::fs::rename(src, dst) {
        Ok(()) => return Ok(()),
        Err(e) => e,
    };

    if rename_err.kind() == std::io::ErrorKind::NotFound {
        return Err(StorageError::MoveFile {
            from: src.to_path_buf(),
            to: dst.to_path_buf(),
            source: rename_err,
        });
    }

    // Slow path: copy then remove original
    std::fs::copy(src, dst).map_err(|e| StorageError::MoveFile {
        from: src.to_path_buf(),
        to: dst.to_path_buf(),
        source: e,
    })?;
    if let Err(e) = std::fs::remove_file(src) {
        // Keep exactly one copy: undo the copy rather than duplicate the file.
        let _ = std::fs::remove_file(dst);
        return Err(StorageError::MoveFile {
            from: src.to_path_buf(),
            to: dst.to_path_buf(),
            source: e,
        });
    }
    Ok(())
}

/// Rename a directory in a single step. Never falls back to copying, so the
/// directory is visible in exactly one place at every instant.
pub fn rename_dir(src: &Path, dst: &Path) -> Result<(), StorageError> {
    if std::fs::symlink_metadata(dst).is_ok() {
        return Err(StorageError::FileExists(dst.to_path_buf()));
    }
    std::fs::rename(src, dst).map_err(|e| StorageError::MoveFile {
        from: src.to_path_buf(),
        to: dst.to_path_buf(),
        source: e,
    })
}

pub fn copy_file(src: &Path, dst: &Path) -> Result<u64, StorageError> {
    std::fs::copy(src, dst).map_err(|e| StorageError::CopyFile {
        from: src.to_path_buf(),
        to: dst.to_path_buf(),
        source: e,
    })
}

pub fn ensure_directory(path: &Path) -> Result<(), StorageError> {
    if !path.is_dir() {
        std::fs::create_dir_all(path).map_err(|e| StorageError::CreateDirectory {
            path: path.to_path_buf(),
            source: e,
        })?;
    }
    Ok(())
}

/// Removes a file. Returns `Ok(false)` if it did not exist.
pub fn remove_file_if_exists(path: &Path) -> Result<bool, StorageError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(StorageError::RemoveFile {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Returns true if `candidate` resolves to a direct or nested child of
/// `base`. Both paths must exist; symlinks and `..` are resolved first.
pub fn is_within(candidate: &Path, base: &Path) -> bool {
    let (Ok(candidate), Ok(base)) = (candidate.canonicalize(), base.canonicalize()) else {
        return false;
    };
    candidate != base && candidate.starts_with(&base)
}

/// A plain file name: no separators, no parent references, not hidden.
pub fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains('/')
        && !name.contains('\\')
        && !name.contains('\0')
        && Path::new(name).file_name().map(|n| n == name).unwrap_or(false)
}

/// Splits `name` at its last dot into `(stem, ".ext")`.
pub fn split_extension(name: &str) -> (&str, Option<&str>) {
    match name.rfind('.') {
        Some(dot_pos) if dot_pos > 0 => (&name[..dot_pos], Some(&name[dot_pos..])),
        _ => (name, None),
    }
}

/// Candidate path in `directory` that does not exist yet.
///
/// Tries `filename` first, then `<stem>__<suffix><ext>` with a fresh suffix
/// from `make_suffix` for each attempt. A candidate is only taken when
/// `is_free` also accepts it, which lets callers reserve companion files
/// under the same stem.
pub fn resolve_conflict<F, G>(
    directory: &Path,
    filename: &str,
    attempts: usize,
    mut make_suffix: F,
    mut is_free: G,
) -> Result<PathBuf, StorageError>
where
    F: FnMut() -> String,
    G: FnMut(&Path) -> bool,
{
    let path = directory.join(filename);
    if std::fs::symlink_metadata(&path).is_err() && is_free(&path) {
        return Ok(path);
    }

    let (base, ext) = split_extension(filename);
    for _ in 0..attempts {
        let new_filename = match ext {
            Some(ext) => format!("{}__{}{}", base, make_suffix(), ext),
            None => format!("{}__{}", base, make_suffix()),
        };
        let new_path = directory.join(&new_filename);
        if std::fs::symlink_metadata(&new_path).is_err() && is_free(&new_path) {
            return Ok(new_path);
        }
    }

    Err(StorageError::FileExists(path))
}
