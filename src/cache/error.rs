//! Extraction cache error types

use crate::ErrorKind;
use crate::archive::ArchiveError;
use std::path::PathBuf;
use thiserror::Error;

/// Extraction cache errors
#[derive(Debug, Error)]
pub enum CacheError {
    /// Reading from the album archive failed
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    /// Creating or deleting cache files failed
    #[error("Cache path {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No unit with this position in the table of contents
    #[error("Chapter {index} does not exist (album has {count})")]
    ChapterOutOfRange { index: usize, count: usize },

    /// No photo with this name in the chapter
    #[error("Photo '{name}' not found in chapter '{chapter}'")]
    PhotoNotFound { chapter: String, name: String },

    /// The album identifier cannot name a cache directory
    #[error("Album identifier '{0}' cannot be used as a cache directory")]
    InvalidIdentifier(String),

    /// A chapter directory or photo name would leave the cache directory
    #[error("Archive name '{0}' cannot be used as a cache path")]
    UnsafeName(String),
}

impl CacheError {
    /// Classify this error
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Archive(e) => e.kind(),
            Self::Io { .. } => ErrorKind::Io,
            Self::ChapterOutOfRange { .. } | Self::PhotoNotFound { .. } => ErrorKind::NotFound,
            Self::InvalidIdentifier(_) | Self::UnsafeName(_) => ErrorKind::Format,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
