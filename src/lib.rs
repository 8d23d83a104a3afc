//! Albumr - keeps an index of photo album archives and searches their content
//!
//! An album library is a directory of `*.album.epub` archives. This crate
//! keeps a lightweight on-disk index of those archives in sync with the
//! directory (re-deriving only files that changed) and runs cancellable,
//! incremental full-content searches over the indexed albums.

use thiserror::Error;

pub mod archive;
pub mod cache;
pub mod cli;
pub mod commands;
pub mod config;
pub mod index;
pub mod jobs;
pub mod library;
pub mod metadata;
pub mod model;
pub mod output;
pub mod reconcile;
pub mod search;
pub mod xml;

#[cfg(test)]
pub mod testing;

/// Broad classification shared by every error in the crate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Missing or locked file, permission problem
    Io,
    /// Malformed metadata document or image
    Format,
    /// Expected archive entry or album absent
    NotFound,
    /// Cooperative abort
    Cancelled,
    /// Another job is already running
    Busy,
    /// Bad user input or configuration
    Input,
    /// A worker thread died
    Internal,
}

/// Error enum, contains all failure states of the program
#[derive(Debug, Error)]
pub enum AlbumrError {
    /// Archive access error
    #[error("Archive error: {0}")]
    Archive(#[from] archive::ArchiveError),
    /// Metadata extraction error
    #[error("Metadata error: {0}")]
    Metadata(#[from] metadata::MetadataError),
    /// Persisted index error
    #[error("Index error: {0}")]
    Index(#[from] index::IndexError),
    /// Reconciliation error
    #[error("Scan failed: {0}")]
    Reconcile(#[from] reconcile::ReconcileError),
    /// Search error
    #[error("Search error: {0}")]
    Search(#[from] search::SearchError),
    /// Background job error
    #[error("Job error: {0}")]
    Job(#[from] jobs::JobError),
    /// Extraction cache error
    #[error("Cache error: {0}")]
    Cache(#[from] cache::CacheError),
    /// Represents a configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),
    /// Represents an I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Invalid input error
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl AlbumrError {
    /// Classify this error
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Archive(e) => e.kind(),
            Self::Metadata(e) => e.kind(),
            Self::Index(e) => e.kind(),
            Self::Reconcile(e) => e.kind(),
            Self::Search(e) => e.kind(),
            Self::Job(e) => e.kind(),
            Self::Cache(e) => e.kind(),
            Self::Config(_) | Self::InvalidInput(_) => ErrorKind::Input,
            Self::Io(_) => ErrorKind::Io,
        }
    }
}

/// One item of a batch that could not be processed
///
/// Batches record these and carry on; the item is retried from scratch on the
/// next run.
#[derive(Debug)]
pub struct ItemFailure {
    pub file_name: String,
    pub error: metadata::MetadataError,
}

impl ItemFailure {
    #[must_use]
    pub fn new(file_name: impl Into<String>, error: metadata::MetadataError) -> Self {
        Self {
            file_name: file_name.into(),
            error,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.error.kind()
    }
}

impl std::fmt::Display for ItemFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.file_name, self.error)
    }
}
