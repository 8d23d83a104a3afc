//! Background job error types

use crate::ErrorKind;
use thiserror::Error;

/// Job control errors
#[derive(Debug, Error)]
pub enum JobError {
    /// A job is already running
    #[error("Another job is already running")]
    Busy,

    /// The job was cancelled before it produced a result
    #[error("Job cancelled")]
    Cancelled,

    /// The worker thread could not be started
    #[error("Cannot start worker thread: {0}")]
    Spawn(#[source] std::io::Error),

    /// The worker thread panicked
    #[error("Worker thread panicked: {0}")]
    Panicked(String),
}

impl JobError {
    /// Classify this error
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Busy => ErrorKind::Busy,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Spawn(_) => ErrorKind::Io,
            Self::Panicked(_) => ErrorKind::Internal,
        }
    }
}
