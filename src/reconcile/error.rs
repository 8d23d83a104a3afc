//! Reconciliation error types
//!
//! Only directory-level and index-level failures abort a reconciliation.
//! Problems with individual archives are reported as
//! [`crate::ItemFailure`]s in the report.

use crate::ErrorKind;
use crate::index::IndexError;
use std::path::PathBuf;
use thiserror::Error;

/// Reconciliation errors
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The work or data directory cannot be created or listed
    #[error("Cannot access directory {}: {source}", path.display())]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The new index could not be written
    #[error(transparent)]
    Index(#[from] IndexError),
}

impl ReconcileError {
    /// Classify this error
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Directory { .. } => ErrorKind::Io,
            Self::Index(e) => e.kind(),
        }
    }
}
