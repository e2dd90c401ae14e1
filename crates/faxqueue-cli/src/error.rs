use thiserror::Error;

use faxqueue::FaxQueueError;

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    FaxQueue(#[from] FaxQueueError),

    #[error("Failed to initialize logging: {0}")]
    Logging(String),

    #[error("Failed to write output: {0}")]
    Output(#[from] serde_json::Error),

    #[error("{0}")]
    Usage(String),

    /// The command ran but reported errors; its report was already printed.
    #[error("{0}")]
    Reported(String),
}

impl CliError {
    /// Wraps any library error.
    pub fn lib(e: impl Into<FaxQueueError>) -> Self {
        CliError::FaxQueue(e.into())
    }
}

pub type Result<T> = std::result::Result<T, CliError>;
