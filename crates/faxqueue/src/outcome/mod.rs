pub mod archive;
pub mod classify;

pub use archive::{Archive, ArchiveKind, CleanupItem, CleanupReport, CleanupResult, TerminalEntry};
pub use classify::{
    classify, duration, error_text, finished_at, format_duration, is_aborted, is_success,
    page_count, started_at, Outcome, PageCount, ABORT_STATUS_CODE,
};
