//! Archive-specific error types
//!
//! Errors raised while opening an album archive or reading entries from it.
//!
//! # Error Types
//!
//! - **`Io`**: The archive file could not be opened or an entry could not be copied out
//! - **`Zip`**: The file is not a readable zip container
//! - **`EntryNotFound`**: A required entry is absent from the archive

use crate::ErrorKind;
use std::path::PathBuf;
use thiserror::Error;

/// Archive access errors
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// The archive file could not be read
    #[error("Cannot read archive {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not a valid zip container
    #[error("Invalid archive {}: {source}", path.display())]
    Zip {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    /// An expected entry is missing
    #[error("Entry not found in archive: {0}")]
    EntryNotFound(String),
}

impl ArchiveError {
    /// Classify this error
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Io { .. } => ErrorKind::Io,
            Self::Zip { .. } => ErrorKind::Format,
            Self::EntryNotFound(_) => ErrorKind::NotFound,
        }
    }
}
