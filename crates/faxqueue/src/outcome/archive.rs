//! Terminal outcome archives and the cleanup operations on them.
//!
//! The worker writes `<base>__<job_id>.json` into the success or failure
//! archive, optionally next to a companion artifact `<stem>__OK.pdf` resp.
//! `<stem>__FAILED.pdf`. Entries are addressed by record file name only.

use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::Serialize;
use serde_json::Value;
use walkdir::WalkDir;

use crate::error::{ArchiveError, StorageError};
use crate::job::id::{random_token, SUFFIX_LEN};
use crate::job::{Stage, StageLayout};
use crate::outcome::classify::{self, Outcome, PageCount};
use crate::storage::{filesystem, read_json};

/// Fresh suffixes tried when an adopted name is taken.
const MAX_ADOPT_ATTEMPTS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveKind {
    Success,
    Failure,
}

impl ArchiveKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "success" | "ok" => Some(ArchiveKind::Success),
            "failure" | "failed" => Some(ArchiveKind::Failure),
            _ => None,
        }
    }

    pub fn stage(&self) -> Stage {
        match self {
            ArchiveKind::Success => Stage::ArchivedSuccess,
            ArchiveKind::Failure => Stage::ArchivedFailure,
        }
    }

    pub fn artifact_suffix(&self) -> &'static str {
        match self {
            ArchiveKind::Success => "__OK.pdf",
            ArchiveKind::Failure => "__FAILED.pdf",
        }
    }

    /// Companion artifact name for a record name (`<stem>.json`).
    pub fn artifact_name(&self, record_name: &str) -> Option<String> {
        record_stem(record_name).map(|stem| format!("{}{}", stem, self.artifact_suffix()))
    }
}

/// One row of an archive listing.
#[derive(Debug, Clone, Serialize)]
pub struct TerminalEntry {
    pub name: String,
    pub outcome: Outcome,
    pub finished_at: Option<String>,
    pub duration: Option<String>,
    pub recipient_name: String,
    pub recipient_number: String,
    pub pages: PageCount,
    /// Failure reason; absent for successful transmissions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Companion artifact file name, when one exists.
    pub artifact: Option<String>,
}

impl TerminalEntry {
    fn from_record(name: String, record: &Value, artifact: Option<String>) -> Self {
        let outcome = classify::classify(record);
        let text = |pointer: &str| {
            record
                .pointer(pointer)
                .and_then(crate::job::record::value_as_string)
                .unwrap_or_default()
        };
        Self {
            outcome,
            finished_at: classify::finished_at(record),
            duration: classify::duration(record),
            recipient_name: text("/recipient/name"),
            recipient_number: text("/recipient/number"),
            pages: classify::page_count(record),
            error: (outcome != Outcome::Success).then(|| classify::error_text(record)),
            artifact,
            name,
        }
    }

    fn sort_key(&self) -> i64 {
        self.finished_at
            .as_deref()
            .and_then(classify::parse_timestamp)
            .map(|ts| ts.timestamp())
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum CleanupResult {
    Deleted,
    Adopted { renamed_to: String },
    Failed { error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct CleanupItem {
    pub name: String,
    #[serde(flatten)]
    pub result: CleanupResult,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl CleanupItem {
    fn failed(name: &str, error: impl ToString) -> Self {
        Self {
            name: name.to_string(),
            result: CleanupResult::Failed {
                error: error.to_string(),
            },
            warnings: Vec::new(),
        }
    }
}

/// Per-item results of a cleanup batch.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CleanupReport {
    pub processed: usize,
    pub items: Vec<CleanupItem>,
}

impl CleanupReport {
    fn push(&mut self, item: CleanupItem) {
        if !matches!(item.result, CleanupResult::Failed { .. }) {
            self.processed += 1;
        }
        self.items.push(item);
    }

    pub fn failed(&self) -> usize {
        self.items.len() - self.processed
    }
}

/// Strips `.json` (any case) from a record name.
fn record_stem(name: &str) -> Option<&str> {
    let split = name.len().checked_sub(5)?;
    let (stem, ext) = (name.get(..split)?, name.get(split..)?);
    (ext.eq_ignore_ascii_case(".json") && !stem.is_empty()).then_some(stem)
}

fn has_pdf_extension(name: &str) -> bool {
    name.len() > 4
        && name
            .get(name.len() - 4..)
            .is_some_and(|ext| ext.eq_ignore_ascii_case(".pdf"))
}

/// The success and failure archives of one spool.
#[derive(Debug, Clone)]
pub struct Archive {
    success_dir: PathBuf,
    failure_dir: PathBuf,
}

impl Archive {
    pub fn new(layout: &StageLayout) -> Self {
        Self {
            success_dir: layout.dir(Stage::ArchivedSuccess).to_path_buf(),
            failure_dir: layout.dir(Stage::ArchivedFailure).to_path_buf(),
        }
    }

    pub fn dir(&self, kind: ArchiveKind) -> &Path {
        match kind {
            ArchiveKind::Success => &self.success_dir,
            ArchiveKind::Failure => &self.failure_dir,
        }
    }

    /// Most recently finished entries first, at most `limit`.
    ///
    /// Records that cannot be read or parsed are skipped.
    pub fn list(&self, kind: ArchiveKind, limit: usize) -> Vec<TerminalEntry> {
        let dir = self.dir(kind);
        let mut entries = Vec::new();

        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str() else {
                continue;
            };
            if name.starts_with('.') || record_stem(name).is_none() {
                continue;
            }

            let record: Value = match read_json(entry.path()) {
                Ok(record @ Value::Object(_)) => record,
                Ok(_) => {
                    debug!("Skipping non-object archive record {}", name);
                    continue;
                }
                Err(e) => {
                    warn!("Skipping archive record {}: {}", name, e);
                    continue;
                }
            };

            let artifact = kind
                .artifact_name(name)
                .filter(|artifact| dir.join(artifact).is_file());
            entries.push(TerminalEntry::from_record(name.to_string(), &record, artifact));
        }

        entries.sort_by(|a, b| {
            b.sort_key()
                .cmp(&a.sort_key())
                .then_with(|| b.name.cmp(&a.name))
        });
        entries.truncate(limit);
        entries
    }

    /// Path of an existing record (`*.json`) in the archive.
    pub fn open_record(&self, kind: ArchiveKind, name: &str) -> Result<PathBuf, ArchiveError> {
        if !filesystem::is_plain_file_name(name) || record_stem(name).is_none() {
            return Err(ArchiveError::InvalidName(name.to_string()));
        }
        self.existing(kind, name)
    }

    /// Path of an existing artifact (`*.pdf`) in the archive.
    pub fn open_artifact(&self, kind: ArchiveKind, name: &str) -> Result<PathBuf, ArchiveError> {
        if !filesystem::is_plain_file_name(name) || !has_pdf_extension(name) {
            return Err(ArchiveError::InvalidName(name.to_string()));
        }
        self.existing(kind, name)
    }

    fn existing(&self, kind: ArchiveKind, name: &str) -> Result<PathBuf, ArchiveError> {
        let dir = self.dir(kind);
        let path = dir.join(name);
        if path.is_file() && filesystem::is_within(&path, dir) {
            Ok(path)
        } else {
            Err(ArchiveError::NotFound(name.to_string()))
        }
    }

    /// Removes failure records and their artifacts, item by item.
    pub fn delete_failures(&self, names: &[String]) -> CleanupReport {
        let _span = tracing::info_span!("archive.delete", count = names.len()).entered();

        let mut report = CleanupReport::default();
        for name in names {
            let item = match self.delete_failure(name) {
                Ok(warnings) => CleanupItem {
                    name: name.clone(),
                    result: CleanupResult::Deleted,
                    warnings,
                },
                Err(e) => {
                    warn!("Could not delete {}: {}", name, e);
                    CleanupItem::failed(name, e)
                }
            };
            report.push(item);
        }

        info!(
            "Deleted {} of {} failure record(s)",
            report.processed,
            names.len()
        );
        report
    }

    fn delete_failure(&self, name: &str) -> Result<Vec<String>, ArchiveError> {
        let record = self.open_record(ArchiveKind::Failure, name)?;
        std::fs::remove_file(&record).map_err(|e| StorageError::RemoveFile {
            path: record.clone(),
            source: e,
        })?;

        let mut warnings = Vec::new();
        if let Some(artifact) = ArchiveKind::Failure.artifact_name(name) {
            if let Err(e) = filesystem::remove_file_if_exists(&self.failure_dir.join(&artifact)) {
                warn!("Artifact {} left behind: {}", artifact, e);
                warnings.push(format!("artifact {} left behind: {}", artifact, e));
            }
        }
        Ok(warnings)
    }

    /// Moves failure records (and artifacts) into the success archive.
    ///
    /// An existing success entry is never replaced: a taken name gets a
    /// random `__<suffix>` before the extension. The failure entry only
    /// disappears once its record has been moved.
    pub fn adopt_failures(&self, names: &[String]) -> CleanupReport {
        let _span = tracing::info_span!("archive.adopt", count = names.len()).entered();

        let mut report = CleanupReport::default();
        for name in names {
            let item = match self.adopt_failure(name) {
                Ok(renamed_to) => CleanupItem {
                    name: name.clone(),
                    result: CleanupResult::Adopted { renamed_to },
                    warnings: Vec::new(),
                },
                Err(e) => {
                    warn!("Could not adopt {}: {}", name, e);
                    CleanupItem::failed(name, e)
                }
            };
            report.push(item);
        }

        info!(
            "Adopted {} of {} failure record(s)",
            report.processed,
            names.len()
        );
        report
    }

    fn adopt_failure(&self, name: &str) -> Result<String, ArchiveError> {
        let record = self.open_record(ArchiveKind::Failure, name)?;
        filesystem::ensure_directory(&self.success_dir)?;

        let target = filesystem::resolve_conflict(
            &self.success_dir,
            name,
            MAX_ADOPT_ATTEMPTS,
            || random_token(SUFFIX_LEN),
            |candidate| {
                candidate
                    .file_name()
                    .and_then(|n| n.to_str())
                    .and_then(|n| ArchiveKind::Success.artifact_name(n))
                    .map(|artifact| !self.success_dir.join(artifact).exists())
                    .unwrap_or(false)
            },
        )
        .map_err(|_| ArchiveError::NoFreeName(name.to_string()))?;

        let target_name = target
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .ok_or_else(|| ArchiveError::InvalidName(name.to_string()))?;

        let artifact_move = match (
            ArchiveKind::Failure.artifact_name(name),
            ArchiveKind::Success.artifact_name(&target_name),
        ) {
            (Some(from), Some(to)) if self.failure_dir.join(&from).is_file() => {
                let (from, to) = (self.failure_dir.join(from), self.success_dir.join(to));
                filesystem::move_file(&from, &to)?;
                Some((from, to))
            }
            _ => None,
        };

        if let Err(e) = filesystem::move_file(&record, &target) {
            if let Some((from, to)) = artifact_move {
                if let Err(undo) = filesystem::move_file(&to, &from) {
                    warn!("Artifact stranded at {}: {}", to.display(), undo);
                }
            }
            return Err(e.into());
        }

        info!("Adopted {} as {}", name, target_name);
        Ok(target_name)
    }
}
