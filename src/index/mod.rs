//! In-memory album index
//!
//! [`LibraryIndex`] holds the records of one library sorted by file name with
//! at most one record per name. Lookups by file name use binary search, and
//! [`ParagraphRef`]s produced by searches are resolved back to their content
//! through it.

pub mod error;
pub mod file;

pub use error::IndexError;
pub use file::IndexFile;

use crate::model::{AlbumDocument, Chapter, IndexRecord, Paragraph, ParagraphRef};
use std::path::{Path, PathBuf};

/// Sort records by file name and drop duplicate names, keeping the first
pub fn normalize(records: &mut Vec<IndexRecord>) {
    records.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    records.dedup_by(|later, earlier| later.file_name == earlier.file_name);
}

/// A resolved search match
#[derive(Debug, Clone, Copy)]
pub struct ResolvedParagraph<'a> {
    pub record: &'a IndexRecord,
    pub document: &'a AlbumDocument,
    pub chapter: &'a Chapter,
    pub paragraph: &'a Paragraph,
}

/// Sorted records of one library directory
#[derive(Debug, Clone)]
pub struct LibraryIndex {
    work_dir: PathBuf,
    records: Vec<IndexRecord>,
}

impl LibraryIndex {
    /// Build an index over `records`, sorting and de-duplicating them
    #[must_use]
    pub fn new(work_dir: impl Into<PathBuf>, mut records: Vec<IndexRecord>) -> Self {
        normalize(&mut records);
        Self {
            work_dir: work_dir.into(),
            records,
        }
    }

    #[must_use]
    pub fn empty(work_dir: impl Into<PathBuf>) -> Self {
        Self::new(work_dir, Vec::new())
    }

    /// Directory holding the album archives
    #[must_use]
    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    #[must_use]
    pub fn records(&self) -> &[IndexRecord] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn get(&self, position: usize) -> Option<&IndexRecord> {
        self.records.get(position)
    }

    /// Position of the record for `file_name`
    #[must_use]
    pub fn position(&self, file_name: &str) -> Option<usize> {
        self.records
            .binary_search_by(|r| r.file_name.as_str().cmp(file_name))
            .ok()
    }

    /// Record for `file_name`
    #[must_use]
    pub fn find(&self, file_name: &str) -> Option<&IndexRecord> {
        self.position(file_name).map(|i| &self.records[i])
    }

    /// Find a record by file name, file stem or identifier
    ///
    /// Matches are tried in that order so an exact file name always wins.
    #[must_use]
    pub fn lookup(&self, key: &str) -> Option<&IndexRecord> {
        self.find(key)
            .or_else(|| {
                self.records
                    .iter()
                    .find(|r| r.file_name.strip_suffix(crate::library::ARCHIVE_SUFFIX) == Some(key))
            })
            .or_else(|| self.records.iter().find(|r| !r.identifier.is_empty() && r.identifier == key))
    }

    /// Full path of a record's archive
    #[must_use]
    pub fn archive_path(&self, record: &IndexRecord) -> PathBuf {
        self.work_dir.join(&record.file_name)
    }

    /// Resolve a paragraph reference produced against this index
    ///
    /// Returns `None` if the reference is out of range or the album's full
    /// parse has not been loaded.
    #[must_use]
    pub fn resolve(&self, reference: ParagraphRef) -> Option<ResolvedParagraph<'_>> {
        let record = self.records.get(reference.record)?;
        let document = record.cached_document()?;
        let chapter = document.chapters.get(reference.chapter)?;
        let paragraph = chapter.paragraphs.get(reference.paragraph)?;
        Some(ResolvedParagraph {
            record,
            document,
            chapter,
            paragraph,
        })
    }

    pub fn iter(&self) -> std::slice::Iter<'_, IndexRecord> {
        self.records.iter()
    }

    #[must_use]
    pub fn into_records(self) -> Vec<IndexRecord> {
        self.records
    }
}

impl<'a> IntoIterator for &'a LibraryIndex {
    type Item = &'a IndexRecord;
    type IntoIter = std::slice::Iter<'a, IndexRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
