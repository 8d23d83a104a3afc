//! Search-specific error types
//!
//! Per-album failures during a search are not errors of the search itself;
//! they are collected as [`crate::ItemFailure`]s in the summary. These
//! variants cover building a query and running it as a background job.
//!
//! # Error Types
//!
//! - **`InvalidDate`**: A date bound could not be parsed
//! - **`Job`**: The background search could not be started or died

use crate::ErrorKind;
use crate::jobs::JobError;
use thiserror::Error;

/// Search-specific errors
#[derive(Debug, Error)]
pub enum SearchError {
    /// A date bound is not a valid date
    #[error("Invalid date '{0}', expected yyyy-MM-dd")]
    InvalidDate(String),

    /// Background job failure
    #[error(transparent)]
    Job(#[from] JobError),
}

impl SearchError {
    /// Classify this error
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidDate(_) => ErrorKind::Input,
            Self::Job(e) => e.kind(),
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod error_tests;
