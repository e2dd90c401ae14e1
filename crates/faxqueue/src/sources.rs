//! Named source buckets that hold documents waiting to be sent.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::iter::Peekable;
use std::path::{Path, PathBuf};
use std::str::Chars;

use log::{debug, info};
use walkdir::WalkDir;

use crate::config::Config;
use crate::error::{SourceError, StorageError};
use crate::storage::filesystem;

/// Yields eligible document names and contents for a named bucket.
pub trait DocumentSource {
    /// Eligible file names in `bucket`, in display order.
    fn list(&self, bucket: &str) -> Result<Vec<String>, SourceError>;

    /// Validated path of `file` inside `bucket`.
    fn resolve(&self, bucket: &str, file: &str) -> Result<PathBuf, SourceError>;

    fn read(&self, bucket: &str, file: &str) -> Result<Vec<u8>, SourceError> {
        let path = self.resolve(bucket, file)?;
        std::fs::read(&path).map_err(|e| {
            SourceError::Storage(StorageError::ReadFile {
                path: path.clone(),
                source: e,
            })
        })
    }
}

/// Buckets backed by plain directories.
#[derive(Debug, Clone)]
pub struct SourceRegistry {
    buckets: BTreeMap<String, PathBuf>,
    exclude_suffixes: Vec<String>,
    exclude_contains: Vec<String>,
    max_list_files: usize,
}

impl SourceRegistry {
    pub fn new(
        buckets: BTreeMap<String, PathBuf>,
        exclude_suffixes: Vec<String>,
        exclude_contains: Vec<String>,
        max_list_files: usize,
    ) -> Self {
        Self {
            buckets,
            exclude_suffixes,
            exclude_contains,
            max_list_files,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.source_directories(),
            config.exclude_suffixes.clone(),
            config.exclude_contains.clone(),
            config.limits.max_list_files,
        )
    }

    pub fn bucket_names(&self) -> impl Iterator<Item = &str> {
        self.buckets.keys().map(String::as_str)
    }

    pub fn contains(&self, bucket: &str) -> bool {
        self.buckets.contains_key(bucket)
    }

    pub fn directory(&self, bucket: &str) -> Result<&Path, SourceError> {
        self.buckets
            .get(bucket)
            .map(PathBuf::as_path)
            .ok_or_else(|| SourceError::UnknownBucket(bucket.to_string()))
    }

    /// Creates every bucket directory that does not exist yet.
    pub fn ensure_directories(&self) -> Result<(), StorageError> {
        for dir in self.buckets.values() {
            filesystem::ensure_directory(dir)?;
        }
        Ok(())
    }

    /// Checks whether `name` may be offered and sent.
    ///
    /// Sendable files are visible PDFs that are not worker artifacts
    /// (`__OK.pdf`, `__FAILED.pdf`, report files).
    pub fn check_sendable(&self, name: &str) -> Result<(), String> {
        if !filesystem::is_plain_file_name(name) {
            return Err("not a plain, visible file name".to_string());
        }
        if !name.to_ascii_lowercase().ends_with(".pdf") {
            return Err("not a PDF".to_string());
        }
        if let Some(suffix) = self.exclude_suffixes.iter().find(|s| name.ends_with(s.as_str())) {
            return Err(format!("worker artifact ({})", suffix));
        }
        if let Some(infix) = self.exclude_contains.iter().find(|s| name.contains(s.as_str())) {
            return Err(format!("worker artifact ({})", infix));
        }
        Ok(())
    }

    pub fn is_sendable(&self, name: &str) -> bool {
        self.check_sendable(name).is_ok()
    }
}

impl DocumentSource for SourceRegistry {
    fn list(&self, bucket: &str) -> Result<Vec<String>, SourceError> {
        let dir = self.directory(bucket)?;
        if !dir.is_dir() {
            debug!("Source bucket '{}' has no directory yet", bucket);
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| SourceError::List {
                bucket: bucket.to_string(),
                source: e,
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if self.is_sendable(name) {
                    files.push(name.to_string());
                }
            }
        }

        files.sort_by(|a, b| natural_cmp(a, b));
        files.truncate(self.max_list_files);

        info!("Listed {} documents in bucket '{}'", files.len(), bucket);
        Ok(files)
    }

    fn resolve(&self, bucket: &str, file: &str) -> Result<PathBuf, SourceError> {
        let dir = self.directory(bucket)?;
        self.check_sendable(file)
            .map_err(|reason| SourceError::NotSendable {
                file: file.to_string(),
                reason,
            })?;

        let path = dir.join(file);
        if !path.is_file() || !filesystem::is_within(&path, dir) {
            return Err(SourceError::NotFound {
                bucket: bucket.to_string(),
                file: file.to_string(),
            });
        }
        Ok(path)
    }
}

fn take_digits(it: &mut Peekable<Chars<'_>>) -> String {
    let mut run = String::new();
    while let Some(c) = it.peek().copied().filter(char::is_ascii_digit) {
        run.push(c);
        it.next();
    }
    run
}

/// Case-insensitive natural ordering: digit runs compare by value, so
/// `scan2.pdf` sorts before `scan10.pdf`.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = a.chars().peekable();
    let mut right = b.chars().peekable();

    loop {
        match (left.peek().copied(), right.peek().copied()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let l = take_digits(&mut left);
                let r = take_digits(&mut right);
                let l_trim = l.trim_start_matches('0');
                let r_trim = r.trim_start_matches('0');
                let ord = l_trim
                    .len()
                    .cmp(&r_trim.len())
                    .then_with(|| l_trim.cmp(r_trim));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(x), Some(y)) => {
                let ord = x.to_lowercase().cmp(y.to_lowercase());
                if ord != Ordering::Equal {
                    return ord;
                }
                left.next();
                right.next();
            }
        }
    }
}
