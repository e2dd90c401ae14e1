//! Producer side of the spool: creating jobs and flagging them for
//! cancellation.
//!
//! A job is assembled in `staging/<id>` and published with one directory
//! rename into `queue/<id>`, so the worker never sees a half-built job.
//! After publication the producer only ever touches the `cancel` field of
//! the record.

use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::Serialize;

use crate::addressbook::AddressBook;
use crate::config::Config;
use crate::error::{QueueError, SourceError, StorageError};
use crate::job::{
    normalize_fax_number, CancelRequest, JobId, JobOptions, JobRecord, JobSource, Recipient,
    Resolution, Stage, StageLayout, DOCUMENT_FILE, RECORD_FILE, SOURCE_FILE,
};
use crate::notice::Notices;
use crate::sanitize::{redact_number, redact_path};
use crate::sources::{DocumentSource, SourceRegistry};
use crate::storage::{filesystem, read_json_object, write_json_atomic};

/// Fresh ids tried before a job creation gives up.
pub const MAX_ID_ATTEMPTS: usize = 5;

/// One job for one source document.
#[derive(Debug, Clone)]
pub struct CreateJob {
    pub src: String,
    pub file: String,
    pub recipient: Recipient,
    pub options: JobOptions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedJob {
    pub job_id: JobId,
    /// False when the original stayed in its bucket.
    pub source_relocated: bool,
}

/// A batch submission as entered on the send form.
#[derive(Debug, Clone, Default)]
pub struct SubmitRequest {
    pub src: String,
    pub files: Vec<String>,
    pub recipient_name: String,
    pub recipient_number: String,
    /// Address book entry used to fill an empty name or number.
    pub contact_id: Option<i64>,
    pub ecm: bool,
    pub resolution: String,
    pub save_contact: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmitItem {
    pub file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<JobId>,
    pub source_relocated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SubmitReport {
    pub items: Vec<SubmitItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_id: Option<i64>,
    pub notices: Notices,
}

impl SubmitReport {
    pub fn created(&self) -> usize {
        self.items.iter().filter(|i| i.job_id.is_some()).count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CancelReceipt {
    pub job_id: JobId,
    pub stage: Stage,
    pub requested_at: String,
}

/// Job creation and cancellation over one spool layout.
#[derive(Debug, Clone)]
pub struct JobQueue {
    layout: StageLayout,
    sources: SourceRegistry,
    country_code: String,
}

impl JobQueue {
    pub fn new(
        layout: StageLayout,
        sources: SourceRegistry,
        country_code: impl Into<String>,
    ) -> Self {
        Self {
            layout,
            sources,
            country_code: country_code.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            StageLayout::new(config.base_path(), &config.directories),
            SourceRegistry::from_config(config),
            config.country_code.clone(),
        )
    }

    pub fn layout(&self) -> &StageLayout {
        &self.layout
    }

    pub fn sources(&self) -> &SourceRegistry {
        &self.sources
    }

    /// Creates one queued job from one source file.
    ///
    /// The recipient number is normalized before it is recorded. Any failure
    /// before publication removes the staging directory. A failed
    /// publication leaves the complete job in staging and is reported as
    /// [`QueueError::StrandedInStaging`].
    pub fn create(&self, job: &CreateJob) -> Result<CreatedJob, QueueError> {
        self.create_with(job, JobId::generate)
    }

    fn create_with(
        &self,
        job: &CreateJob,
        next_id: impl FnMut() -> JobId,
    ) -> Result<CreatedJob, QueueError> {
        let _span = tracing::info_span!(
            "queue.create",
            src = %job.src,
            file = %job.file,
            number = %redact_number(&job.recipient.number),
        )
        .entered();

        let source_path = self.resolve_source(&job.src, &job.file)?;
        if job.recipient.name.trim().is_empty() {
            return Err(QueueError::MissingField("recipient.name"));
        }
        let number = normalize_fax_number(&job.recipient.number, &self.country_code);
        if number.is_empty() {
            return Err(QueueError::MissingField("recipient.number"));
        }
        let recipient = Recipient {
            name: job.recipient.name.trim().to_string(),
            number,
        };

        filesystem::ensure_directory(self.layout.dir(Stage::Staging))?;
        filesystem::ensure_directory(self.layout.dir(Stage::Queued))?;

        let (job_id, staging_dir) = self.allocate_staging_dir(next_id)?;

        let record = JobRecord::new(
            job_id.clone(),
            JobSource {
                src: job.src.clone(),
                filename_original: job.file.clone(),
            },
            recipient,
            job.options,
        );
        if let Err(e) = populate_staging(&staging_dir, &source_path, &record) {
            discard_staging(&staging_dir);
            return Err(e.into());
        }

        let queue_dir = self
            .layout
            .transition(&job_id, Stage::Staging, Stage::Queued)
            .map_err(|source| QueueError::StrandedInStaging {
                job_id: job_id.to_string(),
                source,
            })?;

        let source_relocated = relocate_source(&source_path, &queue_dir);

        info!(
            "Queued job {} for {} from {}/{}",
            job_id,
            redact_number(&record.recipient.number),
            job.src,
            job.file
        );
        Ok(CreatedJob {
            job_id,
            source_relocated,
        })
    }

    /// Validates a form submission and creates one job per selected file.
    ///
    /// Nothing is written when validation fails. Each file is then handled
    /// independently. The recipient is saved to `book` only when every job
    /// was created, and a failing save never undoes created jobs.
    pub fn submit(&self, request: &SubmitRequest, book: Option<&dyn AddressBook>) -> SubmitReport {
        self.submit_with(request, book, JobId::generate)
    }

    fn submit_with(
        &self,
        request: &SubmitRequest,
        book: Option<&dyn AddressBook>,
        mut next_id: impl FnMut() -> JobId,
    ) -> SubmitReport {
        let _span = tracing::info_span!(
            "queue.submit",
            src = %request.src,
            files = request.files.len()
        )
        .entered();

        let mut report = SubmitReport::default();
        let notices = &mut report.notices;

        if !self.sources.contains(&request.src) {
            notices.err(format!("Unknown source '{}'.", request.src));
            return report;
        }

        let mut name = request.recipient_name.trim().to_string();
        let mut number = request.recipient_number.trim().to_string();

        if let Some(contact_id) = request.contact_id {
            match book.map(|b| b.get(contact_id)) {
                Some(Ok(Some(contact))) => {
                    if name.is_empty() {
                        name = contact.name;
                    }
                    if number.is_empty() {
                        number = contact.number;
                    }
                }
                Some(Ok(None)) => notices.err(format!("Contact {} not found.", contact_id)),
                Some(Err(e)) => notices.err(format!("Address book error: {}", e)),
                None => notices.err("No address book available."),
            }
        }

        let normalized = normalize_fax_number(&number, &self.country_code);
        if name.is_empty() {
            notices.err("Recipient name missing.");
        }
        if normalized.is_empty() {
            notices.err("Fax number missing or invalid.");
        }

        let files = self.selectable_files(&request.src, &request.files);
        if files.is_empty() {
            notices.err("No valid PDFs selected.");
        }

        if notices.has_errors() {
            warn!("Submission rejected: {}", notices.err.join(" "));
            return report;
        }

        let recipient = Recipient {
            name: name.clone(),
            number: normalized.clone(),
        };
        let options = JobOptions {
            ecm: request.ecm,
            resolution: Resolution::parse_or_default(&request.resolution),
        };

        let mut relocated = 0;
        for file in files {
            let job = CreateJob {
                src: request.src.clone(),
                file: file.clone(),
                recipient: recipient.clone(),
                options,
            };
            match self.create_with(&job, &mut next_id) {
                Ok(created) => {
                    if created.source_relocated {
                        relocated += 1;
                    }
                    report.items.push(SubmitItem {
                        file,
                        job_id: Some(created.job_id),
                        source_relocated: created.source_relocated,
                        error: None,
                    });
                }
                Err(e) => {
                    warn!("Failed to queue {}: {}", file, e);
                    report.notices.err(format!("Could not queue {}: {}", file, e));
                    report.items.push(SubmitItem {
                        file,
                        job_id: None,
                        source_relocated: false,
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        if request.save_contact && !report.notices.has_errors() {
            match book {
                Some(book) => match book.upsert(request.contact_id, &name, &normalized, "") {
                    Ok(id) => {
                        report.contact_id = Some(id);
                        report.notices.ok("Recipient saved to the address book.");
                    }
                    Err(e) => report.notices.err(format!("Address book error: {}", e)),
                },
                None => report.notices.err("No address book available."),
            }
        }

        let created = report.created();
        if created > 0 {
            report.notices.ok(format!("Queued {} job(s).", created));
            if relocated > 0 {
                report
                    .notices
                    .ok(format!("Moved {} source file(s) into their jobs.", relocated));
            } else {
                report
                    .notices
                    .ok("Source files stayed in place; the queue directory may not be writable.");
            }
        }

        report
    }

    /// Sets the cancellation flag of a queued or processing job.
    ///
    /// Every other field of the record is preserved. Repeating the call
    /// only refreshes `cancel.requested_at`.
    pub fn request_cancel(&self, job_id: &str, stage: &str) -> Result<CancelReceipt, QueueError> {
        let _span = tracing::info_span!("queue.cancel", job_id = %job_id, stage = %stage).entered();

        let job_id = JobId::parse(job_id)?;
        let stage = Stage::parse_cancellable(stage)?;
        let job_dir = self.layout.resolve_job_dir(stage, &job_id)?;
        let record_path = job_dir.join(RECORD_FILE);

        let mut record = read_json_object(&record_path).map_err(|e| match e {
            e if e.is_not_found() => QueueError::RecordMissing {
                job_id: job_id.to_string(),
            },
            StorageError::ParseRecord { source, .. } => QueueError::RecordUnreadable {
                job_id: job_id.to_string(),
                reason: source.to_string(),
            },
            other => QueueError::Storage(other),
        })?;

        let cancel = CancelRequest::now();
        let requested_at = cancel.requested_at.clone().unwrap_or_default();
        let cancel = serde_json::to_value(&cancel).map_err(|e| StorageError::Serialize {
            path: record_path.clone(),
            source: e,
        })?;
        record.insert("cancel".to_string(), cancel);

        write_json_atomic(&record_path, &record)?;

        info!(
            "Cancellation requested for job {} in {} ({})",
            job_id,
            stage,
            redact_path(&job_dir)
        );
        Ok(CancelReceipt {
            job_id,
            stage,
            requested_at,
        })
    }

    fn resolve_source(&self, src: &str, file: &str) -> Result<PathBuf, QueueError> {
        self.sources.resolve(src, file).map_err(|e| match e {
            SourceError::UnknownBucket(name) => QueueError::UnknownSource(name),
            SourceError::NotSendable { file, reason } => QueueError::InvalidFile { file, reason },
            SourceError::NotFound { file, .. } => QueueError::InvalidFile {
                file,
                reason: "no such file".to_string(),
            },
            SourceError::List { bucket, .. } => QueueError::UnknownSource(bucket),
            SourceError::Storage(e) => QueueError::Storage(e),
        })
    }

    /// Trimmed, de-duplicated selection restricted to sendable files that
    /// exist in the bucket.
    fn selectable_files(&self, src: &str, selected: &[String]) -> Vec<String> {
        let mut files: Vec<String> = Vec::new();
        for file in selected.iter().map(|f| f.trim()) {
            if file.is_empty() || files.iter().any(|f| f == file) {
                continue;
            }
            match self.sources.resolve(src, file) {
                Ok(_) => files.push(file.to_string()),
                Err(e) => debug!("Skipping selection '{}': {}", file, e),
            }
        }
        files
    }

    /// Exclusively creates `staging/<id>` for an id not used in any stage.
    fn allocate_staging_dir(
        &self,
        mut next_id: impl FnMut() -> JobId,
    ) -> Result<(JobId, PathBuf), QueueError> {
        for attempt in 1..=MAX_ID_ATTEMPTS {
            let job_id = next_id();
            if Stage::ALL
                .iter()
                .any(|stage| self.layout.job_dir(*stage, &job_id).exists())
            {
                debug!("Job id {} already in use (attempt {})", job_id, attempt);
                continue;
            }

            let dir = self.layout.job_dir(Stage::Staging, &job_id);
            match std::fs::create_dir(&dir) {
                Ok(()) => return Ok((job_id, dir)),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    debug!("Job id {} already in use (attempt {})", job_id, attempt);
                }
                Err(e) => {
                    return Err(StorageError::CreateDirectory {
                        path: dir,
                        source: e,
                    }
                    .into())
                }
            }
        }
        Err(QueueError::IdExhausted {
            attempts: MAX_ID_ATTEMPTS,
        })
    }
}

fn populate_staging(
    staging_dir: &Path,
    source_path: &Path,
    record: &JobRecord,
) -> Result<(), StorageError> {
    filesystem::copy_file(source_path, &staging_dir.join(DOCUMENT_FILE))?;
    write_json_atomic(&staging_dir.join(RECORD_FILE), record)
}

fn discard_staging(staging_dir: &Path) {
    if let Err(e) = std::fs::remove_dir_all(staging_dir) {
        warn!(
            "Could not remove staging directory {}: {}",
            redact_path(staging_dir),
            e
        );
    }
}

/// Moves the original next to its job as `source.pdf`. Best effort: the
/// job is already published, so a failure only leaves the original behind.
fn relocate_source(source_path: &Path, queue_dir: &Path) -> bool {
    let target = queue_dir.join(SOURCE_FILE);
    if target.exists() {
        return false;
    }
    match filesystem::move_file(source_path, &target) {
        Ok(()) => true,
        Err(e) => {
            warn!(
                "Original {} stays in its bucket: {}",
                redact_path(source_path),
                e
            );
            false
        }
    }
}
