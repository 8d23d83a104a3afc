//! Per-album extraction cache
//!
//! Viewing a chapter needs only a handful of archive entries on disk: the
//! shared stylesheet, the preface page, the chapter page and the chapter's
//! photo thumbnails. They are extracted on demand into
//! `<data_dir>/<identifier>/`, mirroring the archive layout below `EPUB/`.

pub mod error;

pub use error::CacheError;

use crate::archive::{AlbumArchive, layout};
use crate::jobs::{CancellationToken, JobOutcome};
use crate::library::{INDEX_FILE_NAME, Library, is_valid_identifier};
use crate::model::AlbumDocument;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const STYLESHEET_FILE: &str = "style.css";

/// Files of one chapter made available on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedChapter {
    pub cache_dir: PathBuf,
    /// Extracted page of the chapter
    pub page: PathBuf,
    /// Entries extracted by this call
    pub extracted: usize,
}

/// Outcome of clearing the cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClearReport {
    pub removed: usize,
    pub failed: usize,
    pub outcome: JobOutcome,
}

/// Extraction cache of one library
pub struct ExtractionCache<'a> {
    library: &'a Library,
}

impl<'a> ExtractionCache<'a> {
    #[must_use]
    pub const fn new(library: &'a Library) -> Self {
        Self { library }
    }

    /// Cache directory for an album
    ///
    /// # Errors
    ///
    /// Returns `CacheError::InvalidIdentifier` if `identifier` cannot name a
    /// directory.
    pub fn album_dir(&self, identifier: &str) -> Result<PathBuf, CacheError> {
        if is_valid_identifier(identifier) {
            Ok(self.library.cache_dir(identifier))
        } else {
            Err(CacheError::InvalidIdentifier(identifier.to_string()))
        }
    }

    /// Extract everything needed to view unit `chapter` of `document`
    ///
    /// The stylesheet and preface page are extracted once per cache. The unit
    /// page and, for real chapters, its photo thumbnails are extracted when the
    /// page is not cached yet. Albums that do not live in the library's work
    /// directory get a fresh cache on every call.
    ///
    /// # Errors
    ///
    /// Returns `CacheError` if the unit does not exist, the archive cannot be
    /// read, or cache files cannot be written.
    pub fn prepare_chapter(
        &self,
        document: &AlbumDocument,
        identifier: &str,
        chapter: usize,
    ) -> Result<PreparedChapter, CacheError> {
        let unit = document.chapters.get(chapter).ok_or(CacheError::ChapterOutOfRange {
            index: chapter,
            count: document.chapters.len(),
        })?;
        let cache_dir = self.album_dir(identifier)?;
        if unit.is_chapter {
            let photos = unit.paragraphs.iter().flat_map(|p| &p.photos);
            for name in std::iter::once(&unit.directory).chain(photos.map(|photo| &photo.file_name)) {
                if !layout::is_plain_name(name) {
                    return Err(CacheError::UnsafeName(name.clone()));
                }
            }
        }

        if !self.library.contains_archive(&document.path) && cache_dir.exists() {
            tracing::debug!(dir = %cache_dir.display(), "external album, discarding old cache");
            fs::remove_dir_all(&cache_dir).map_err(|e| CacheError::io(&cache_dir, e))?;
        }
        fs::create_dir_all(&cache_dir).map_err(|e| CacheError::io(&cache_dir, e))?;

        let page = cache_dir.join(unit.html_file_name());
        let stylesheet = cache_dir.join(STYLESHEET_FILE);
        let mut extracted = 0;

        if stylesheet.exists() && page.exists() {
            return Ok(PreparedChapter {
                cache_dir,
                page,
                extracted,
            });
        }

        let mut archive = AlbumArchive::open(&document.path)?;

        if !stylesheet.exists() {
            extracted += usize::from(archive.extract_entry(layout::STYLESHEET, &stylesheet)?);
            let preface = layout::content(layout::PREFACE_PAGE);
            extracted += usize::from(archive.extract_entry(&preface, &cache_dir.join(layout::PREFACE_PAGE))?);
        }

        if !page.exists() {
            extracted += usize::from(archive.extract_entry(&layout::content(&unit.html_file_name()), &page)?);

            if unit.is_chapter {
                let thumbs = cache_dir.join(&unit.directory).join(layout::THUMBS_DIR);
                fs::create_dir_all(&thumbs).map_err(|e| CacheError::io(&thumbs, e))?;
                for photo in unit.paragraphs.iter().flat_map(|p| &p.photos) {
                    let dest = thumbs.join(&photo.file_name);
                    extracted += usize::from(archive.extract_entry(&unit.thumbnail_entry(photo), &dest)?);
                }
            }
        }

        tracing::debug!(album = %document.title, chapter, extracted, "chapter prepared");
        Ok(PreparedChapter {
            cache_dir,
            page,
            extracted,
        })
    }

    /// Extract the full-size photo `name` of unit `chapter` to `dest`
    ///
    /// `name` is matched against the photo file name, then against the name
    /// without extension.
    ///
    /// # Errors
    ///
    /// Returns `CacheError` if the unit or photo does not exist or the entry
    /// cannot be extracted.
    pub fn export_photo(
        &self,
        document: &AlbumDocument,
        chapter: usize,
        name: &str,
        dest: &Path,
    ) -> Result<(), CacheError> {
        let unit = document.chapters.get(chapter).ok_or(CacheError::ChapterOutOfRange {
            index: chapter,
            count: document.chapters.len(),
        })?;
        let photo = unit
            .paragraphs
            .iter()
            .flat_map(|p| &p.photos)
            .find(|photo| photo.file_name == name)
            .or_else(|| unit.find_photo(name))
            .ok_or_else(|| CacheError::PhotoNotFound {
                chapter: unit.title.clone(),
                name: name.to_string(),
            })?;

        let entry = unit.photo_entry(photo);
        let mut archive = AlbumArchive::open(&document.path)?;
        if !archive.extract_entry(&entry, dest)? {
            return Err(crate::archive::ArchiveError::EntryNotFound(entry).into());
        }
        tracing::info!(entry = %entry, dest = %dest.display(), "photo exported");
        Ok(())
    }

    /// Delete extraction caches
    ///
    /// Every subdirectory of the data directory except the thumbnail
    /// directory is removed. With `all`, the index file and every cover
    /// thumbnail are removed too. Deletion is best-effort; failures are
    /// counted and logged.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Io` if the data directory exists but cannot be
    /// listed.
    pub fn clear(&self, all: bool, token: &CancellationToken) -> Result<ClearReport, CacheError> {
        let data_dir = &self.library.data_dir;
        let thumbs_dir = self.library.thumbs_dir();
        let mut report = ClearReport {
            removed: 0,
            failed: 0,
            outcome: JobOutcome::Completed,
        };

        let mut targets: Vec<PathBuf> = Vec::new();
        if all {
            targets.push(data_dir.join(INDEX_FILE_NAME));
            targets.extend(list_dir(&thumbs_dir)?);
        }
        targets.extend(
            list_dir(data_dir)?
                .into_iter()
                .filter(|path| path.is_dir() && *path != thumbs_dir),
        );

        for target in targets {
            if token.is_cancelled() {
                report.outcome = JobOutcome::Cancelled;
                break;
            }
            let result = if target.is_dir() {
                fs::remove_dir_all(&target)
            } else {
                fs::remove_file(&target)
            };
            match result {
                Ok(()) => report.removed += 1,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(path = %target.display(), error = %e, "cannot remove cache entry");
                    report.failed += 1;
                }
            }
        }

        tracing::info!(removed = report.removed, failed = report.failed, all, "cache cleared");
        Ok(report)
    }
}

fn list_dir(dir: &Path) -> Result<Vec<PathBuf>, CacheError> {
    match fs::read_dir(dir) {
        Ok(entries) => entries
            .map(|entry| entry.map(|e| e.path()).map_err(|e| CacheError::io(dir, e)))
            .collect(),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(CacheError::io(dir, e)),
    }
}
