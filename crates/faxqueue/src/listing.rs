//! Read-only views of the jobs still in flight.
//!
//! A job's presence is taken from its directory; its record only adds
//! detail. Nothing here writes to the spool, so these functions are safe to
//! call from any number of pollers.

use serde::Serialize;
use serde_json::Value;

use crate::job::record::{now_iso, value_as_string};
use crate::job::{LiveProgress, Stage, StageLayout, RECORD_FILE};
use crate::storage::read_json;

/// Worker progress of a processing job, flattened for display.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveSummary {
    pub progress_sent: Option<u64>,
    pub progress_total: Option<u64>,
    pub dials_done: Option<u64>,
    pub dials_max: Option<u64>,
    pub state: Option<String>,
    pub faxstat_status: Option<String>,
    pub updated_at: Option<String>,
}

impl From<LiveProgress> for LiveSummary {
    fn from(live: LiveProgress) -> Self {
        let progress = live.progress.unwrap_or_default();
        let dials = live.dials.unwrap_or_default();
        Self {
            progress_sent: progress.sent,
            progress_total: progress.total,
            dials_done: dials.sent,
            dials_max: dials.total,
            state: live.state,
            faxstat_status: live.faxstat_status,
            updated_at: live.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveJob {
    pub job_id: String,
    pub stage: Stage,
    pub status: Option<String>,
    pub recipient_name: Option<String>,
    pub recipient_number: Option<String>,
    pub created_at: Option<String>,
    pub submitted_at: Option<String>,
    pub started_at: Option<String>,
    pub cancel_requested: bool,
    pub cancel_handled: bool,
    pub live: Option<LiveSummary>,
    /// False when `job.json` is missing or not a JSON object.
    pub metadata_readable: bool,
}

impl ActiveJob {
    fn unknown(job_id: String, stage: Stage) -> Self {
        Self {
            job_id,
            stage,
            status: None,
            recipient_name: None,
            recipient_number: None,
            created_at: None,
            submitted_at: None,
            started_at: None,
            cancel_requested: false,
            cancel_handled: false,
            live: None,
            metadata_readable: false,
        }
    }

    fn load(layout: &StageLayout, stage: Stage, job_id: String) -> Self {
        let path = layout.dir(stage).join(&job_id).join(RECORD_FILE);
        let record = match read_json::<Value>(&path) {
            Ok(record @ Value::Object(_)) => record,
            Ok(_) => return Self::unknown(job_id, stage),
            Err(e) => {
                log::debug!("Metadata of {} unavailable: {}", job_id, e);
                return Self::unknown(job_id, stage);
            }
        };

        let text = |pointer: &str| record.pointer(pointer).and_then(value_as_string);
        let live = record
            .get("live")
            .filter(|v| v.is_object())
            .and_then(|v| serde_json::from_value::<LiveProgress>(v.clone()).ok())
            .map(LiveSummary::from);

        Self {
            stage,
            status: text("/status"),
            recipient_name: text("/recipient/name"),
            recipient_number: text("/recipient/number"),
            created_at: text("/created_at"),
            submitted_at: text("/submitted_at"),
            started_at: text("/started_at"),
            cancel_requested: matches!(
                record.pointer("/cancel/requested"),
                Some(Value::Bool(true))
            ),
            cancel_handled: text("/cancel/handled_at").is_some_and(|s| !s.trim().is_empty()),
            live,
            metadata_readable: true,
            job_id,
        }
    }
}

/// Processing jobs, newest first, then queued jobs, newest first. Each
/// stage contributes at most `limit` entries.
pub fn active_jobs(layout: &StageLayout, limit: usize) -> Vec<ActiveJob> {
    [Stage::Processing, Stage::Queued]
        .into_iter()
        .flat_map(move |stage| {
            layout
                .list_job_ids(stage)
                .into_iter()
                .rev()
                .take(limit)
                .map(move |job_id| ActiveJob::load(layout, stage, job_id))
        })
        .collect()
}

/// Polling payload: stage counts plus the active job preview.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    pub queued: usize,
    pub processing: usize,
    pub failed: usize,
    pub generated_at: String,
    pub active: Vec<ActiveJob>,
}

/// Number of outcome records (`*.json`) in the failure archive.
pub fn count_failures(layout: &StageLayout) -> usize {
    let Ok(entries) = std::fs::read_dir(layout.dir(Stage::ArchivedFailure)) else {
        return 0;
    };
    entries
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
        .filter(|e| {
            e.file_name()
                .to_str()
                .map(|n| !n.starts_with('.') && n.to_ascii_lowercase().ends_with(".json"))
                .unwrap_or(false)
        })
        .count()
}

pub fn status_snapshot(layout: &StageLayout, limit: usize) -> StatusSnapshot {
    StatusSnapshot {
        queued: layout.count_jobs(Stage::Queued),
        processing: layout.count_jobs(Stage::Processing),
        failed: count_failures(layout),
        generated_at: now_iso(),
        active: active_jobs(layout, limit),
    }
}
