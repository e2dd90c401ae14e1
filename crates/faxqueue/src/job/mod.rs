pub mod id;
pub mod record;
pub mod stage;

pub use id::JobId;
pub use record::{
    normalize_fax_number, CancelRequest, Counter, JobOptions, JobRecord, JobSource, LiveProgress,
    Recipient, Resolution,
};
pub use stage::{Stage, StageLayout, DOCUMENT_FILE, RECORD_FILE, SOURCE_FILE};
