//! Album data model
//!
//! Two levels of detail are kept for every album:
//!
//! - [`IndexRecord`]: the lightweight, persisted summary used for listing and
//!   for cheap search filtering.
//! - [`AlbumDocument`]: the full parse (chapters, paragraphs, photos), built on
//!   demand and cached in a once-only cell owned by the record.
//!
//! Chapters, paragraphs and photos never point back at their owners. Code that
//! needs the owner passes it alongside, or uses a [`ParagraphRef`] to look it up
//! through the index.

use crate::archive::layout;
use crate::metadata::{self, MetadataError};
use chrono::NaiveDate;
use once_cell::sync::OnceCell;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Title of the synthetic first unit of every album
pub const PREFACE_TITLE: &str = "Preface";

/// Title used when an album does not provide one
pub const UNTITLED: &str = "(Untitled)";

/// Persisted summary of one album archive
#[derive(Debug, Clone)]
pub struct IndexRecord {
    pub identifier: String,
    pub file_name: String,
    pub file_size: u64,
    pub title: String,
    pub author: String,
    pub location: String,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    /// Path of the cover image relative to `EPUB/`, empty when there is none
    pub cover_file_name: String,
    document: OnceCell<AlbumDocument>,
}

impl IndexRecord {
    /// Create an empty record for a file on disk
    #[must_use]
    pub fn new(file_name: impl Into<String>, file_size: u64, date: NaiveDate) -> Self {
        Self {
            identifier: String::new(),
            file_name: file_name.into(),
            file_size,
            title: UNTITLED.to_string(),
            author: String::new(),
            location: String::new(),
            first_date: date,
            last_date: date,
            cover_file_name: String::new(),
            document: OnceCell::new(),
        }
    }

    /// Derive a record from a freshly parsed album
    #[must_use]
    pub fn from_document(file_name: impl Into<String>, file_size: u64, document: &AlbumDocument) -> Self {
        Self {
            identifier: document.identifier.clone(),
            file_name: file_name.into(),
            file_size,
            title: document.title.clone(),
            author: document.author.clone(),
            location: document.location.clone(),
            first_date: document.first_date,
            last_date: document.last_date,
            cover_file_name: document.cover_file_name.clone(),
            document: OnceCell::new(),
        }
    }

    /// Whether `[first_date, last_date]` overlaps `[begin, end]`
    #[must_use]
    pub fn overlaps(&self, begin: NaiveDate, end: NaiveDate) -> bool {
        self.first_date <= end && self.last_date >= begin
    }

    /// Whether a cover image is referenced
    #[must_use]
    pub fn has_cover(&self) -> bool {
        !self.cover_file_name.trim().is_empty()
    }

    /// Full parse of this album, loading it from `work_dir` on first use
    ///
    /// The parse happens at most once per record; later calls return the
    /// cached document.
    ///
    /// # Errors
    ///
    /// Returns `MetadataError` if the archive cannot be opened or its metadata
    /// document is missing or malformed. A failed load leaves the cell empty so
    /// a later call can retry.
    pub fn document(&self, work_dir: &Path) -> Result<&AlbumDocument, MetadataError> {
        self.document
            .get_or_try_init(|| AlbumDocument::load(&work_dir.join(&self.file_name)))
    }

    /// The cached full parse, if it has been loaded
    #[must_use]
    pub fn cached_document(&self) -> Option<&AlbumDocument> {
        self.document.get()
    }

    /// Attach an already parsed document
    ///
    /// Returns `false` when a document was already cached.
    pub fn attach_document(&self, document: AlbumDocument) -> bool {
        self.document.set(document).is_ok()
    }
}

impl PartialEq for IndexRecord {
    fn eq(&self, other: &Self) -> bool {
        self.identifier == other.identifier
            && self.file_name == other.file_name
            && self.file_size == other.file_size
            && self.title == other.title
            && self.author == other.author
            && self.location == other.location
            && self.first_date == other.first_date
            && self.last_date == other.last_date
            && self.cover_file_name == other.cover_file_name
    }
}

impl Eq for IndexRecord {}

/// Full parse of an album archive
#[derive(Debug, Clone)]
pub struct AlbumDocument {
    /// Archive the document was parsed from
    pub path: PathBuf,
    pub identifier: String,
    pub title: String,
    pub author: String,
    pub location: String,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub cover_file_name: String,
    /// Table of contents; the first unit is always the preface
    pub chapters: Vec<Chapter>,
}

impl AlbumDocument {
    /// Parse the album archive at `path`
    ///
    /// # Errors
    ///
    /// See [`metadata::load_document`].
    pub fn load(path: &Path) -> Result<Self, MetadataError> {
        metadata::load_document(path)
    }

    /// Position of the unit whose page is `html_file_name`
    #[must_use]
    pub fn index_of_html_file(&self, html_file_name: &str) -> Option<usize> {
        self.chapters
            .iter()
            .position(|chapter| chapter.html_file_name() == html_file_name)
    }

    /// Units that are real chapters (the preface excluded)
    pub fn real_chapters(&self) -> impl Iterator<Item = (usize, &Chapter)> {
        self.chapters
            .iter()
            .enumerate()
            .filter(|(_, chapter)| chapter.is_chapter)
    }

    /// Total number of paragraphs across all chapters
    #[must_use]
    pub fn paragraph_count(&self) -> usize {
        self.chapters.iter().map(|c| c.paragraphs.len()).sum()
    }
}

/// One unit of the table of contents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    /// Subdirectory inside `EPUB/`; empty for the preface
    pub directory: String,
    pub title: String,
    pub is_chapter: bool,
    pub paragraphs: Vec<Paragraph>,
}

impl Chapter {
    /// The synthetic preface unit
    #[must_use]
    pub fn preface() -> Self {
        Self {
            directory: String::new(),
            title: PREFACE_TITLE.to_string(),
            is_chapter: false,
            paragraphs: Vec::new(),
        }
    }

    /// A real chapter stored in `directory`
    #[must_use]
    pub fn new(directory: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            title: title.into(),
            is_chapter: true,
            paragraphs: Vec::new(),
        }
    }

    /// Page file name of this unit (relative to `EPUB/`)
    #[must_use]
    pub fn html_file_name(&self) -> String {
        if self.is_chapter {
            layout::chapter_page(&self.directory)
        } else {
            layout::PREFACE_PAGE.to_string()
        }
    }

    /// Find a photo by its file name without extension
    #[must_use]
    pub fn find_photo(&self, file_stem: &str) -> Option<&Photo> {
        self.paragraphs
            .iter()
            .flat_map(|p| p.photos.iter())
            .find(|photo| {
                Path::new(&photo.file_name)
                    .file_stem()
                    .is_some_and(|stem| stem == file_stem)
            })
    }

    /// Archive entry of a photo in this chapter
    #[must_use]
    pub fn photo_entry(&self, photo: &Photo) -> String {
        layout::photo(&self.directory, &photo.file_name)
    }

    /// Archive entry of a photo's pre-baked thumbnail
    #[must_use]
    pub fn thumbnail_entry(&self, photo: &Photo) -> String {
        layout::photo_thumbnail(&self.directory, &photo.file_name)
    }
}

/// Smallest unit of narrative content
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Paragraph {
    pub title: Option<String>,
    /// Free text body
    pub context: String,
    pub date: Option<NaiveDate>,
    pub date_visible: bool,
    pub location: Option<String>,
    pub location_visible: bool,
    pub photos: Vec<Photo>,
}

impl Paragraph {
    /// The date, if it is both present and marked visible
    #[must_use]
    pub fn visible_date(&self) -> Option<NaiveDate> {
        self.date.filter(|_| self.date_visible)
    }

    /// The location, if it is both present and marked visible
    #[must_use]
    pub fn visible_location(&self) -> Option<&str> {
        self.location
            .as_deref()
            .filter(|_| self.location_visible)
    }

    /// Append a photo, numbering it within this paragraph
    pub fn push_photo(&mut self, file_name: impl Into<String>, description: impl Into<String>) {
        let index = self.photos.len();
        self.photos.push(Photo::new(file_name, description, index));
    }
}

/// Photo reference inside a paragraph
#[derive(Debug, Clone)]
pub struct Photo {
    pub file_name: String,
    pub description: String,
    /// Position within the owning paragraph
    pub index: usize,
    thumbnail: OnceCell<Vec<u8>>,
}

impl Photo {
    #[must_use]
    pub fn new(file_name: impl Into<String>, description: impl Into<String>, index: usize) -> Self {
        Self {
            file_name: file_name.into(),
            description: description.into(),
            index,
            thumbnail: OnceCell::new(),
        }
    }

    /// Encoded thumbnail bytes, if they have been preloaded
    #[must_use]
    pub fn thumbnail_bytes(&self) -> Option<&[u8]> {
        self.thumbnail.get().map(Vec::as_slice)
    }

    /// Store preloaded thumbnail bytes; returns `false` if already loaded
    pub fn set_thumbnail_bytes(&self, bytes: Vec<u8>) -> bool {
        self.thumbnail.set(bytes).is_ok()
    }
}

impl PartialEq for Photo {
    fn eq(&self, other: &Self) -> bool {
        self.file_name == other.file_name
            && self.description == other.description
            && self.index == other.index
    }
}

impl Eq for Photo {}

/// Lookup-only reference to a paragraph inside a [`crate::index::LibraryIndex`]
///
/// Positions are stable for the lifetime of the index the reference was
/// produced from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ParagraphRef {
    /// Position of the record in the index
    pub record: usize,
    /// Position of the unit in the album's table of contents
    pub chapter: usize,
    /// Position of the paragraph within the chapter
    pub paragraph: usize,
}

impl ParagraphRef {
    #[must_use]
    pub const fn new(record: usize, chapter: usize, paragraph: usize) -> Self {
        Self {
            record,
            chapter,
            paragraph,
        }
    }
}

impl fmt::Display for ParagraphRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.record, self.chapter, self.paragraph)
    }
}
