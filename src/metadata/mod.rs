//! Metadata extraction
//!
//! Maps the XML documents inside an album archive onto the data model:
//!
//! - `EPUB/album.xml` → [`AlbumHeader`] (album-level fields and chapter list)
//! - `EPUB/<dir>/chapter.xml` → ordered [`Paragraph`]s
//!
//! The cover thumbnail transform lives in [`thumbnail`].

pub mod error;
pub mod thumbnail;

pub use error::MetadataError;
pub use thumbnail::{CropRect, ThumbnailSpec, crop_to_fill};

use crate::archive::{AlbumArchive, layout};
use crate::model::{AlbumDocument, Chapter, Paragraph, UNTITLED};
use crate::xml::{self, Element};
use chrono::{Local, NaiveDate, NaiveDateTime};
use std::path::Path;

/// Date format used by every document this crate writes
pub const DATE_FORMAT: &str = "%Y-%m-%d";

const DATE_FORMATS: &[&str] = &[DATE_FORMAT, "%Y/%m/%d", "%Y.%m.%d"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y/%m/%d %H:%M:%S"];

/// Parse a date as written in album documents
///
/// Accepts `yyyy-MM-dd` (the canonical form), slash or dot separated dates,
/// and date-times whose time part is discarded.
#[must_use]
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
                .map(|dt| dt.date())
        })
}

fn require_date(field: &str, value: &str) -> Result<NaiveDate, MetadataError> {
    parse_date(value).ok_or_else(|| MetadataError::InvalidDate {
        field: field.to_string(),
        value: value.to_string(),
    })
}

/// Chapter entry from the album-level document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterEntry {
    pub directory: String,
    pub title: String,
}

/// Album-level fields from `EPUB/album.xml`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumHeader {
    pub identifier: String,
    pub title: String,
    pub author: String,
    pub location: String,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub cover_file_name: String,
    pub chapters: Vec<ChapterEntry>,
}

/// Parse the album-level metadata document
///
/// A missing `firstdate` defaults to today; a missing `lastdate` defaults to
/// `firstdate`. A `lastdate` earlier than `firstdate` is clamped up to it.
///
/// # Errors
///
/// Returns `MetadataError::Xml` for malformed markup and
/// `MetadataError::InvalidDate` when a present date cannot be parsed.
pub fn parse_album_header(bytes: &[u8]) -> Result<AlbumHeader, MetadataError> {
    let root = xml::parse(bytes).map_err(|e| MetadataError::xml("album.xml", e))?;

    let text_of = |name: &str| root.child(name).map(|e| e.inner_text().trim().to_string());

    let first_date = match text_of("firstdate") {
        Some(value) => require_date("firstdate", &value)?,
        None => Local::now().date_naive(),
    };
    let last_date = match text_of("lastdate") {
        Some(value) => require_date("lastdate", &value)?.max(first_date),
        None => first_date,
    };

    let chapters = root
        .child("chapters")
        .map(|list| {
            list.children
                .iter()
                .filter_map(|entry| {
                    let directory = entry.attr("dir").unwrap_or_default().trim();
                    if directory.is_empty() {
                        tracing::warn!(title = %entry.inner_text(), "chapter entry without a directory ignored");
                        return None;
                    }
                    if !layout::is_plain_name(directory) {
                        tracing::warn!(dir = %directory, "chapter entry with an unsafe directory ignored");
                        return None;
                    }
                    Some(ChapterEntry {
                        directory: directory.to_string(),
                        title: entry.inner_text(),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(AlbumHeader {
        identifier: root.attr("identifier").unwrap_or_default().trim().to_string(),
        title: text_of("title")
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| UNTITLED.to_string()),
        author: text_of("author").unwrap_or_default(),
        location: text_of("location").unwrap_or_default(),
        first_date,
        last_date,
        cover_file_name: text_of("cover").unwrap_or_default(),
        chapters,
    })
}

/// Parse a chapter metadata document into its ordered paragraphs
///
/// An unparsable paragraph date leaves that paragraph without a date.
///
/// # Errors
///
/// Returns `MetadataError::Xml` for malformed markup.
pub fn parse_chapter(bytes: &[u8]) -> Result<Vec<Paragraph>, MetadataError> {
    let root = xml::parse(bytes).map_err(|e| MetadataError::xml("chapter.xml", e))?;
    Ok(root.children_named("paragraph").map(parse_paragraph).collect())
}

fn parse_paragraph(element: &Element) -> Paragraph {
    let mut paragraph = Paragraph::default();

    for child in &element.children {
        match child.name.as_str() {
            "title" => paragraph.title = Some(child.inner_text()),
            "context" => paragraph.context = child.inner_text(),
            "date" => {
                paragraph.date_visible = child.attr("visible") == Some("true");
                let value = child.inner_text();
                paragraph.date = parse_date(&value);
                if paragraph.date.is_none() {
                    tracing::warn!(value = %value, "unparsable paragraph date ignored");
                }
            }
            "location" => {
                paragraph.location_visible = child.attr("visible") == Some("true");
                paragraph.location = Some(child.inner_text());
            }
            "photo" => {
                let file_name = child.attr("file").unwrap_or_default().trim();
                if layout::is_plain_name(file_name) {
                    paragraph.push_photo(file_name, child.inner_text());
                } else {
                    tracing::warn!(file = %file_name, "photo with an unsafe file name ignored");
                }
            }
            _ => {}
        }
    }

    paragraph
}

/// Read the album header from an open archive
///
/// Returns `Ok(None)` when the archive has no `EPUB/album.xml`, i.e. it is not
/// an album.
///
/// # Errors
///
/// Returns `MetadataError` if the document cannot be read or parsed.
pub fn read_header(archive: &mut AlbumArchive) -> Result<Option<AlbumHeader>, MetadataError> {
    match archive.read_entry(layout::ALBUM_METADATA)? {
        Some(bytes) => parse_album_header(&bytes).map(Some),
        None => Ok(None),
    }
}

/// Fully parse an open album archive
///
/// Returns `Ok(None)` when the archive is not an album. Chapters whose
/// metadata document is missing or malformed are kept with no paragraphs.
///
/// # Errors
///
/// Returns `MetadataError` if the album document is unreadable or malformed.
pub fn read_document(archive: &mut AlbumArchive) -> Result<Option<AlbumDocument>, MetadataError> {
    let Some(header) = read_header(archive)? else {
        return Ok(None);
    };

    let mut chapters = Vec::with_capacity(header.chapters.len() + 1);
    chapters.push(Chapter::preface());

    for entry in &header.chapters {
        let mut chapter = Chapter::new(&entry.directory, &entry.title);
        let entry_path = layout::chapter_metadata(&entry.directory);
        match archive.read_entry(&entry_path) {
            Ok(Some(bytes)) => match parse_chapter(&bytes) {
                Ok(paragraphs) => chapter.paragraphs = paragraphs,
                Err(e) => tracing::warn!(entry = %entry_path, error = %e, "chapter skipped"),
            },
            Ok(None) => tracing::warn!(entry = %entry_path, "chapter document not found"),
            Err(e) => tracing::warn!(entry = %entry_path, error = %e, "chapter unreadable"),
        }
        chapters.push(chapter);
    }

    tracing::debug!(title = %header.title, units = chapters.len(), "album parsed");

    Ok(Some(AlbumDocument {
        path: archive.path().to_path_buf(),
        identifier: header.identifier,
        title: header.title,
        author: header.author,
        location: header.location,
        first_date: header.first_date,
        last_date: header.last_date,
        cover_file_name: header.cover_file_name,
        chapters,
    }))
}

/// Fully parse the album archive at `path`
///
/// The archive handle is closed before this returns.
///
/// # Errors
///
/// Returns `MetadataError::NotAnAlbum` if the archive has no album document,
/// or another `MetadataError` if the archive or album document is unreadable.
pub fn load_document(path: &Path) -> Result<AlbumDocument, MetadataError> {
    tracing::debug!(path = %path.display(), "parsing album");
    let mut archive = AlbumArchive::open(path)?;
    read_document(&mut archive)?.ok_or_else(|| MetadataError::NotAnAlbum(path.to_path_buf()))
}
