//! Library directories and derived artifact locations
//!
//! A library pairs a work directory of `*.album.epub` archives with a data
//! directory holding everything derived from them:
//!
//! ```text
//! <data_dir>/
//!   albums.xml            persisted index
//!   thumbs/<id>.jpg       cover thumbnails
//!   <id>/                 per-album extraction cache
//! ```

use crate::index::{IndexFile, LibraryIndex};
use crate::metadata::ThumbnailSpec;
use glob::{MatchOptions, Pattern};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// File name suffix of album archives
pub const ARCHIVE_SUFFIX: &str = ".album.epub";

/// Naming convention of album archives inside a work directory
pub const ARCHIVE_PATTERN: &str = "*.album.epub";

/// Index file name inside the data directory
pub const INDEX_FILE_NAME: &str = "albums.xml";

/// Cover thumbnail directory name inside the data directory
pub const THUMBS_DIR_NAME: &str = "thumbs";

/// Whether `identifier` can name artifacts inside the data directory
///
/// Rejects empty values, path separators, dot segments and the names the
/// data directory itself uses.
#[must_use]
pub fn is_valid_identifier(identifier: &str) -> bool {
    !identifier.trim().is_empty()
        && !identifier.contains(['/', '\\'])
        && identifier != "."
        && identifier != ".."
        && identifier != THUMBS_DIR_NAME
        && identifier != INDEX_FILE_NAME
}

/// An archive file found in the work directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveFile {
    pub file_name: String,
    pub size: u64,
}

/// One album library
#[derive(Debug, Clone)]
pub struct Library {
    pub name: String,
    pub work_dir: PathBuf,
    pub data_dir: PathBuf,
    pub thumbnail: ThumbnailSpec,
}

impl Library {
    #[must_use]
    pub fn new(name: impl Into<String>, work_dir: impl Into<PathBuf>, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            work_dir: work_dir.into(),
            data_dir: data_dir.into(),
            thumbnail: ThumbnailSpec::default(),
        }
    }

    #[must_use]
    pub const fn with_thumbnail(mut self, thumbnail: ThumbnailSpec) -> Self {
        self.thumbnail = thumbnail;
        self
    }

    #[must_use]
    pub fn index_file(&self) -> IndexFile {
        IndexFile::new(self.data_dir.join(INDEX_FILE_NAME))
    }

    #[must_use]
    pub fn thumbs_dir(&self) -> PathBuf {
        self.data_dir.join(THUMBS_DIR_NAME)
    }

    /// Cover thumbnail of the album with `identifier`
    #[must_use]
    pub fn thumbnail_path(&self, identifier: &str) -> PathBuf {
        self.thumbs_dir().join(format!("{identifier}.jpg"))
    }

    /// Extraction cache directory of the album with `identifier`
    #[must_use]
    pub fn cache_dir(&self, identifier: &str) -> PathBuf {
        self.data_dir.join(identifier)
    }

    /// Whether `path` is an archive directly inside the work directory
    #[must_use]
    pub fn contains_archive(&self, path: &Path) -> bool {
        path.parent().is_some_and(|parent| same_dir(parent, &self.work_dir))
    }

    /// Create the work, data and thumbnail directories if they are missing
    ///
    /// # Errors
    ///
    /// Returns the first `io::Error` hit while creating a directory.
    pub fn ensure_dirs(&self) -> io::Result<()> {
        fs::create_dir_all(&self.work_dir)?;
        fs::create_dir_all(&self.data_dir)?;
        fs::create_dir_all(self.thumbs_dir())
    }

    /// List the album archives in the work directory, sorted by file name
    ///
    /// Names are matched against [`ARCHIVE_PATTERN`] case-insensitively;
    /// subdirectories and non-UTF-8 names are ignored.
    ///
    /// # Errors
    ///
    /// Returns `io::Error` if the directory cannot be enumerated.
    pub fn scan_directory(&self) -> io::Result<Vec<ArchiveFile>> {
        let pattern =
            Pattern::new(ARCHIVE_PATTERN).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        let options = MatchOptions {
            case_sensitive: false,
            ..MatchOptions::new()
        };

        let mut found = Vec::new();
        for entry in fs::read_dir(&self.work_dir)? {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(dir = %self.work_dir.display(), error = %e, "directory entry skipped");
                    continue;
                }
            };
            let Ok(file_name) = entry.file_name().into_string() else {
                continue;
            };
            if !pattern.matches_with(&file_name, options) {
                continue;
            }
            // Follows symlinks; a file removed since the listing is skipped
            let metadata = match fs::metadata(entry.path()) {
                Ok(metadata) => metadata,
                Err(e) => {
                    tracing::warn!(file = %file_name, error = %e, "archive skipped");
                    continue;
                }
            };
            if metadata.is_file() {
                found.push(ArchiveFile {
                    file_name,
                    size: metadata.len(),
                });
            }
        }

        found.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        Ok(found)
    }

    /// Load the persisted index, or an empty one if it is missing or corrupt
    #[must_use]
    pub fn load_index(&self) -> LibraryIndex {
        LibraryIndex::new(&self.work_dir, self.index_file().load_or_empty())
    }
}

fn same_dir(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
