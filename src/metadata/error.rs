//! Metadata extraction error types
//!
//! Errors raised while turning an archive's metadata documents and cover image
//! into album structures.
//!
//! # Error Types
//!
//! - **`Archive`**: The archive itself could not be read
//! - **`NotAnAlbum`**: The archive has no top-level metadata document
//! - **`Xml`**: A metadata document is not well-formed XML
//! - **`InvalidDate`**: A required date could not be parsed
//! - **`Image`**: The cover image could not be decoded or encoded
//! - **`Io`**: A derived file could not be written

use crate::ErrorKind;
use crate::archive::ArchiveError;
use std::path::PathBuf;
use thiserror::Error;

/// Metadata extraction errors
#[derive(Debug, Error)]
pub enum MetadataError {
    /// Archive access failed
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    /// The archive is not an album (no top-level metadata document)
    #[error("Not an album archive: {}", .0.display())]
    NotAnAlbum(PathBuf),

    /// Malformed XML in a metadata document
    #[error("Malformed {document}: {source}")]
    Xml {
        document: String,
        #[source]
        source: quick_xml::Error,
    },

    /// A date value could not be parsed
    #[error("Invalid date in {field}: '{value}'")]
    InvalidDate { field: String, value: String },

    /// Cover image decode or encode failure
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Cover image has no usable pixels
    #[error("Image has invalid dimensions {width}x{height}")]
    EmptyImage { width: u32, height: u32 },

    /// Writing a derived file failed
    #[error("Cannot write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl MetadataError {
    /// Classify this error
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Archive(inner) => inner.kind(),
            Self::NotAnAlbum(_) => ErrorKind::NotFound,
            Self::Xml { .. }
            | Self::InvalidDate { .. }
            | Self::Image(_)
            | Self::EmptyImage { .. } => ErrorKind::Format,
            Self::Io { .. } => ErrorKind::Io,
        }
    }

    pub(crate) fn xml(document: impl Into<String>, source: quick_xml::Error) -> Self {
        Self::Xml {
            document: document.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_delegates_to_archive_error() {
        let error: MetadataError = ArchiveError::EntryNotFound("EPUB/x".into()).into();
        assert_eq!(error.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_invalid_date_display() {
        let error = MetadataError::InvalidDate {
            field: "firstdate".into(),
            value: "soon".into(),
        };
        assert_eq!(error.to_string(), "Invalid date in firstdate: 'soon'");
        assert_eq!(error.kind(), ErrorKind::Format);
    }

    #[test]
    fn test_xml_error_kind() {
        let error = MetadataError::xml("album.xml", quick_xml::Error::UnexpectedEof("root".into()));
        assert_eq!(error.kind(), ErrorKind::Format);
        assert!(error.to_string().starts_with("Malformed album.xml"));
    }
}
