//! Test harness for isolated spool tests.
//!
//! The `TestHarness` owns a temporary base directory laid out like a real
//! installation: stage directories, source buckets (`inbox` plus the
//! defaults) and an in-memory address book.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use serde_json::Value;
use tempfile::TempDir;

use faxqueue::job::{JobId, Stage, RECORD_FILE};
use faxqueue::outcome::{Archive, ArchiveKind};
use faxqueue::{Config, Database, JobQueue, SqliteAddressBook, StageLayout};

pub struct TestHarness {
    temp_dir: TempDir,
    pub config: Config,
    pub queue: JobQueue,
    pub archive: Archive,
}

impl TestHarness {
    /// Default configuration plus an `inbox` bucket, all under a temp dir.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let mut config = Config::with_base_directory(temp_dir.path());
        config
            .sources
            .insert("inbox".to_string(), "incoming/inbox".to_string());

        let queue = JobQueue::from_config(&config);
        queue
            .layout()
            .ensure_directories()
            .expect("Failed to create stage directories");
        queue
            .sources()
            .ensure_directories()
            .expect("Failed to create bucket directories");
        let archive = Archive::new(queue.layout());

        Self {
            temp_dir,
            config,
            queue,
            archive,
        }
    }

    pub fn base(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn layout(&self) -> &StageLayout {
        self.queue.layout()
    }

    pub fn address_book(&self) -> SqliteAddressBook {
        let db = Database::open_in_memory().expect("Failed to open in-memory database");
        SqliteAddressBook::new(db, self.config.country_code.clone())
    }

    /// Writes a document into a source bucket.
    pub fn write_source(&self, bucket: &str, filename: &str, content: &[u8]) -> PathBuf {
        let dir = self.base().join(&self.config.sources[bucket]);
        let path = dir.join(filename);
        std::fs::write(&path, content).expect("Failed to write source file");
        path
    }

    pub fn job_ids(&self, stage: Stage) -> Vec<String> {
        self.layout().list_job_ids(stage)
    }

    pub fn record_path(&self, stage: Stage, job_id: &JobId) -> PathBuf {
        self.layout().job_dir(stage, job_id).join(RECORD_FILE)
    }

    pub fn read_record(&self, stage: Stage, job_id: &JobId) -> Value {
        let raw = std::fs::read(self.record_path(stage, job_id)).expect("Failed to read job.json");
        serde_json::from_slice(&raw).expect("job.json is not valid JSON")
    }

    /// Simulates the worker claiming a queued job.
    pub fn worker_claim(&self, job_id: &JobId) {
        self.layout()
            .transition(job_id, Stage::Queued, Stage::Processing)
            .expect("Failed to move job to processing");
    }

    /// Writes an outcome record (and optionally its artifact) into an archive.
    pub fn write_outcome(
        &self,
        kind: ArchiveKind,
        name: &str,
        record: &Value,
        with_artifact: bool,
    ) -> PathBuf {
        let dir = self.archive.dir(kind);
        let path = dir.join(name);
        std::fs::write(&path, serde_json::to_vec_pretty(record).unwrap())
            .expect("Failed to write outcome record");
        if with_artifact {
            let artifact = kind.artifact_name(name).expect("record name ends in .json");
            std::fs::write(dir.join(artifact), b"%PDF-1.4").expect("Failed to write artifact");
        }
        path
    }

    pub fn archive_files(&self, kind: ArchiveKind) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.archive.dir(kind))
            .expect("archive directory exists")
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
