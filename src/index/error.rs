//! Index-specific error types
//!
//! # Error Types
//!
//! - **`Io`**: The index file could not be read or written
//! - **`Xml`**: The index file is not well-formed, or could not be serialized
//! - **`InvalidRoot`**: The document root is not the expected element

use crate::ErrorKind;
use std::path::PathBuf;
use thiserror::Error;

/// Persisted index errors
#[derive(Debug, Error)]
pub enum IndexError {
    /// Reading or writing the index file failed
    #[error("Index file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed index document
    #[error("Malformed index: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Unexpected root element
    #[error("Unexpected index root element '{0}'")]
    InvalidRoot(String),
}

impl IndexError {
    /// Classify this error
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Io { .. } => ErrorKind::Io,
            Self::Xml(_) | Self::InvalidRoot(_) => ErrorKind::Format,
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod error_tests;
