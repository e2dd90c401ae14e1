//! Life-cycle stages and their directories.
//!
//! The stage a job is in is defined by the directory that holds it, not by
//! the `status` field inside its record. Moving between stages is a single
//! directory rename, so a job is visible in exactly one stage directory.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::schema::DirectoriesConfig;
use crate::error::{QueueError, StorageError};
use crate::job::id::JobId;
use crate::storage::filesystem;

pub const RECORD_FILE: &str = "job.json";
pub const DOCUMENT_FILE: &str = "doc.pdf";
pub const SOURCE_FILE: &str = "source.pdf";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    Staging,
    #[serde(rename = "queue", alias = "queued")]
    Queued,
    Processing,
    ArchivedSuccess,
    ArchivedFailure,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::Staging,
        Stage::Queued,
        Stage::Processing,
        Stage::ArchivedSuccess,
        Stage::ArchivedFailure,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Staging => "staging",
            Stage::Queued => "queue",
            Stage::Processing => "processing",
            Stage::ArchivedSuccess => "archived-success",
            Stage::ArchivedFailure => "archived-failure",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "staging" => Some(Stage::Staging),
            "queue" | "queued" => Some(Stage::Queued),
            "processing" => Some(Stage::Processing),
            "archived-success" => Some(Stage::ArchivedSuccess),
            "archived-failure" => Some(Stage::ArchivedFailure),
            _ => None,
        }
    }

    /// Stages in which a job is still in flight and may be cancel-flagged.
    pub fn is_cancellable(&self) -> bool {
        matches!(self, Stage::Queued | Stage::Processing)
    }

    /// Parses a caller-supplied stage for a cancellation request.
    pub fn parse_cancellable(s: &str) -> Result<Self, QueueError> {
        match Self::parse(s) {
            Some(stage) if stage.is_cancellable() => Ok(stage),
            _ => Err(QueueError::InvalidStage(s.to_string())),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps stages to directories below the spool root.
#[derive(Debug, Clone)]
pub struct StageLayout {
    root: PathBuf,
    staging: PathBuf,
    queue: PathBuf,
    processing: PathBuf,
    success: PathBuf,
    failure: PathBuf,
}

impl StageLayout {
    pub fn new<P: AsRef<Path>>(root: P, dirs: &DirectoriesConfig) -> Self {
        let root = root.as_ref().to_path_buf();
        Self {
            staging: root.join(&dirs.staging),
            queue: root.join(&dirs.queue),
            processing: root.join(&dirs.processing),
            success: root.join(&dirs.archive_success),
            failure: root.join(&dirs.archive_failure),
            root,
        }
    }

    /// Layout with the default directory names.
    pub fn with_defaults<P: AsRef<Path>>(root: P) -> Self {
        Self::new(root, &DirectoriesConfig::default())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn dir(&self, stage: Stage) -> &Path {
        match stage {
            Stage::Staging => &self.staging,
            Stage::Queued => &self.queue,
            Stage::Processing => &self.processing,
            Stage::ArchivedSuccess => &self.success,
            Stage::ArchivedFailure => &self.failure,
        }
    }

    pub fn job_dir(&self, stage: Stage, id: &JobId) -> PathBuf {
        self.dir(stage).join(id.as_str())
    }

    /// Creates every stage directory that does not exist yet.
    pub fn ensure_directories(&self) -> Result<(), StorageError> {
        for stage in Stage::ALL {
            filesystem::ensure_directory(self.dir(stage))?;
        }
        Ok(())
    }

    /// Names of the job directories in `stage`, sorted ascending.
    ///
    /// Since ids embed their creation time, ascending order is oldest first.
    /// A missing stage directory yields an empty list.
    pub fn list_job_ids(&self, stage: Stage) -> Vec<String> {
        let Ok(entries) = std::fs::read_dir(self.dir(stage)) else {
            return Vec::new();
        };
        let mut ids: Vec<String> = entries
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
            .filter_map(|e| e.file_name().to_str().map(str::to_string))
            .filter(|name| !name.starts_with('.'))
            .collect();
        ids.sort();
        ids
    }

    pub fn count_jobs(&self, stage: Stage) -> usize {
        self.list_job_ids(stage).len()
    }

    /// Resolves an existing job directory strictly inside `stage`.
    ///
    /// The canonical parent of the resolved directory must be the canonical
    /// stage directory itself; anything escaping it is reported as missing.
    pub fn resolve_job_dir(&self, stage: Stage, id: &JobId) -> Result<PathBuf, QueueError> {
        let not_found = || QueueError::JobNotFound {
            job_id: id.to_string(),
            stage: stage.to_string(),
        };

        let candidate = self.job_dir(stage, id);
        let stage_dir = self.dir(stage).canonicalize().map_err(|_| not_found())?;
        let resolved = candidate.canonicalize().map_err(|_| not_found())?;

        if resolved.parent() != Some(stage_dir.as_path()) || !resolved.is_dir() {
            return Err(not_found());
        }
        Ok(resolved)
    }

    /// Moves a job directory from one stage to another in one rename.
    pub fn transition(&self, id: &JobId, from: Stage, to: Stage) -> Result<PathBuf, StorageError> {
        let src = self.job_dir(from, id);
        let dst = self.job_dir(to, id);
        filesystem::rename_dir(&src, &dst)?;
        log::debug!("Job {} moved {} -> {}", id, from, to);
        Ok(dst)
    }
}
