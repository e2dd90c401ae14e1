pub mod addressbook;
pub mod config;
pub mod db;
pub mod error;
pub mod job;
pub mod listing;
pub mod notice;
pub mod outcome;
pub mod queue;
pub mod sanitize;
pub mod sources;
pub mod storage;

pub use addressbook::{AddressBook, AddressBookError, Contact, SqliteAddressBook};
pub use config::{load_config, resolve_config_path, Config};
pub use db::{Database, DatabaseError};
pub use error::{ArchiveError, ConfigError, FaxQueueError, QueueError, SourceError, StorageError};
pub use job::{JobId, Stage, StageLayout};
pub use listing::{active_jobs, status_snapshot, ActiveJob, LiveSummary, StatusSnapshot};
pub use notice::Notices;
pub use outcome::{Archive, ArchiveKind, CleanupReport, Outcome, PageCount};
pub use queue::{CancelReceipt, CreateJob, CreatedJob, JobQueue, SubmitReport, SubmitRequest};
pub use sources::{DocumentSource, SourceRegistry};
