use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FaxQueueError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),

    #[error("Address book error: {0}")]
    AddressBook(#[from] crate::addressbook::AddressBookError),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Invalid source bucket '{name}': {reason}")]
    InvalidSource { name: String, reason: String },
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to copy file from '{from}' to '{to}': {source}")]
    CopyFile {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to move '{from}' to '{to}': {source}")]
    MoveFile {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to remove '{path}': {source}")]
    RemoveFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize record for '{path}': {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Record '{path}' is not valid JSON: {source}")]
    ParseRecord {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("File already exists: {0}")]
    FileExists(PathBuf),
}

impl StorageError {
    /// True when the underlying cause is a missing file or directory.
    pub fn is_not_found(&self) -> bool {
        let source = match self {
            StorageError::ReadFile { source, .. }
            | StorageError::MoveFile { source, .. }
            | StorageError::RemoveFile { source, .. }
            | StorageError::CopyFile { source, .. } => source,
            _ => return false,
        };
        source.kind() == std::io::ErrorKind::NotFound
    }
}

#[derive(Error, Debug)]
pub enum QueueError {
    #[error("Invalid job id '{0}'")]
    InvalidJobId(String),

    #[error("Invalid stage '{0}': expected 'queue' or 'processing'")]
    InvalidStage(String),

    #[error("Unknown source bucket '{0}'")]
    UnknownSource(String),

    #[error("File '{file}' is not a sendable document: {reason}")]
    InvalidFile { file: String, reason: String },

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Job {job_id} not found in {stage}")]
    JobNotFound { job_id: String, stage: String },

    #[error("Job record missing for {job_id}")]
    RecordMissing { job_id: String },

    #[error("Job record unreadable for {job_id}: {reason}")]
    RecordUnreadable { job_id: String, reason: String },

    #[error("Could not allocate a unique job id after {attempts} attempts")]
    IdExhausted { attempts: usize },

    #[error("Job {job_id} is stranded in staging: {source}")]
    StrandedInStaging {
        job_id: String,
        #[source]
        source: StorageError,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl QueueError {
    /// Validation errors are raised before any file-system mutation.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            QueueError::InvalidJobId(_)
                | QueueError::InvalidStage(_)
                | QueueError::UnknownSource(_)
                | QueueError::InvalidFile { .. }
                | QueueError::MissingField(_)
        )
    }

    /// Consistency errors cannot be fixed by retrying the same request.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            QueueError::Storage(_) | QueueError::IdExhausted { .. }
        )
    }
}

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Unknown source bucket '{0}'")]
    UnknownBucket(String),

    #[error("File '{file}' is not a sendable document: {reason}")]
    NotSendable { file: String, reason: String },

    #[error("File '{file}' not found in bucket '{bucket}'")]
    NotFound { bucket: String, file: String },

    #[error("Failed to list bucket '{bucket}': {source}")]
    List {
        bucket: String,
        #[source]
        source: walkdir::Error,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("Invalid archive entry name '{0}'")]
    InvalidName(String),

    #[error("Archive entry '{0}' not found")]
    NotFound(String),

    #[error("Could not find a free name for '{0}' in the success archive")]
    NoFreeName(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
