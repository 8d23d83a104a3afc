//! Read-only access to album archives
//!
//! An album archive is a zip container. Everything the rest of the crate needs
//! from it is "open by path, fetch an entry by its logical path, get the bytes".
//! The handle is meant to live for the duration of one unit of work and be
//! dropped before the next cancellation check.

pub mod error;
pub mod layout;

pub use error::ArchiveError;

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use zip::ZipArchive;
use zip::result::ZipError;

/// An open album archive
pub struct AlbumArchive {
    path: PathBuf,
    zip: ZipArchive<File>,
}

impl AlbumArchive {
    /// Open the archive at `path`
    ///
    /// # Errors
    ///
    /// Returns `ArchiveError::Io` if the file cannot be opened and
    /// `ArchiveError::Zip` if it is not a zip container.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ArchiveError> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|source| ArchiveError::Io {
            path: path.clone(),
            source,
        })?;
        let zip = ZipArchive::new(file).map_err(|source| ArchiveError::Zip {
            path: path.clone(),
            source,
        })?;
        Ok(Self { path, zip })
    }

    /// Path of the underlying archive file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check whether the archive has an entry with this logical path
    #[must_use]
    pub fn contains(&self, entry: &str) -> bool {
        self.zip.index_for_name(entry).is_some()
    }

    /// Read an entry fully into memory
    ///
    /// Returns `Ok(None)` when the entry does not exist.
    ///
    /// # Errors
    ///
    /// Returns `ArchiveError` if the entry exists but cannot be decompressed.
    pub fn read_entry(&mut self, entry: &str) -> Result<Option<Vec<u8>>, ArchiveError> {
        let mut file = match self.zip.by_name(entry) {
            Ok(file) => file,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(source) => {
                return Err(ArchiveError::Zip {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let capacity = usize::try_from(file.size()).unwrap_or_default();
        let mut bytes = Vec::with_capacity(capacity);
        file.read_to_end(&mut bytes).map_err(|source| ArchiveError::Io {
            path: self.path.clone(),
            source,
        })?;
        Ok(Some(bytes))
    }

    /// Read an entry that must exist
    ///
    /// # Errors
    ///
    /// Returns `ArchiveError::EntryNotFound` if the entry is absent.
    pub fn require_entry(&mut self, entry: &str) -> Result<Vec<u8>, ArchiveError> {
        self.read_entry(entry)?
            .ok_or_else(|| ArchiveError::EntryNotFound(entry.to_string()))
    }

    /// Copy an entry out to `dest`, overwriting any existing file
    ///
    /// Returns `Ok(false)` when the entry does not exist.
    ///
    /// # Errors
    ///
    /// Returns `ArchiveError` if decompression or writing the destination fails.
    pub fn extract_entry(&mut self, entry: &str, dest: &Path) -> Result<bool, ArchiveError> {
        let mut file = match self.zip.by_name(entry) {
            Ok(file) => file,
            Err(ZipError::FileNotFound) => return Ok(false),
            Err(source) => {
                return Err(ArchiveError::Zip {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let io_error = |source: io::Error| ArchiveError::Io {
            path: dest.to_path_buf(),
            source,
        };
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
        let mut out = File::create(dest).map_err(io_error)?;
        io::copy(&mut file, &mut out).map_err(io_error)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::AlbumFixture;
    use tempfile::TempDir;

    #[test]
    fn test_open_and_read_metadata_entry() {
        let dir = TempDir::new().unwrap();
        let path = AlbumFixture::new("a1", "Spring").write_to(dir.path(), "spring.album.epub");

        let mut archive = AlbumArchive::open(&path).unwrap();
        assert!(archive.contains(layout::ALBUM_METADATA));
        let bytes = archive.read_entry(layout::ALBUM_METADATA).unwrap().unwrap();
        assert!(String::from_utf8(bytes).unwrap().contains("Spring"));
    }

    #[test]
    fn test_missing_entry_is_none() {
        let dir = TempDir::new().unwrap();
        let path = AlbumFixture::new("a1", "Spring").write_to(dir.path(), "spring.album.epub");

        let mut archive = AlbumArchive::open(&path).unwrap();
        assert!(archive.read_entry("EPUB/nope.xml").unwrap().is_none());
        assert!(matches!(
            archive.require_entry("EPUB/nope.xml"),
            Err(ArchiveError::EntryNotFound(_))
        ));
    }

    #[test]
    fn test_open_non_zip_fails_with_format_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.album.epub");
        fs::write(&path, b"definitely not a zip").unwrap();

        let err = AlbumArchive::open(&path).err().unwrap();
        assert_eq!(err.kind(), crate::ErrorKind::Format);
    }

    #[test]
    fn test_open_missing_file_fails_with_io_error() {
        let dir = TempDir::new().unwrap();
        let err = AlbumArchive::open(dir.path().join("absent.album.epub")).err().unwrap();
        assert_eq!(err.kind(), crate::ErrorKind::Io);
    }

    #[test]
    fn test_extract_entry_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = AlbumFixture::new("a1", "Spring").write_to(dir.path(), "spring.album.epub");
        let dest = dir.path().join("out").join("nested").join("album.xml");

        let mut archive = AlbumArchive::open(&path).unwrap();
        assert!(archive.extract_entry(layout::ALBUM_METADATA, &dest).unwrap());
        assert!(dest.exists());
        assert!(!archive.extract_entry("EPUB/nope", &dir.path().join("x")).unwrap());
    }
}
