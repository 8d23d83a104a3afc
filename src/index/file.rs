//! Persisted index file (`albums.xml`)
//!
//! ```xml
//! <?xml version="1.0" encoding="utf-8"?>
//! <albums>
//!   <album identifier="..." file="trip.album.epub" size="123456">
//!     <title>Trip</title>
//!     <firstdate>2024-05-01</firstdate>
//!     <lastdate>2024-05-03</lastdate>
//!     <location>Kyoto</location>
//!     <author>Mei</author>
//!     <cover>cover.jpg</cover>
//!   </album>
//! </albums>
//! ```
//!
//! `lastdate` is omitted when it equals `firstdate`; `location`, `author` and
//! `cover` are omitted when empty.

use super::IndexError;
use crate::metadata::{DATE_FORMAT, parse_date};
use crate::model::IndexRecord;
use crate::xml::{self, Element};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const ROOT: &str = "albums";
const ALBUM: &str = "album";

/// Handle on the index file of one library
#[derive(Debug, Clone)]
pub struct IndexFile {
    path: PathBuf,
}

impl IndexFile {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Read and parse the index file
    ///
    /// Records are returned in file order; callers sort them.
    ///
    /// # Errors
    ///
    /// Returns `IndexError::Io` if the file cannot be read and
    /// `IndexError::Xml`/`InvalidRoot` if it is not a valid index document.
    pub fn load(&self) -> Result<Vec<IndexRecord>, IndexError> {
        let bytes = fs::read(&self.path).map_err(|source| IndexError::Io {
            path: self.path.clone(),
            source,
        })?;
        parse_index(&bytes)
    }

    /// Load the index, treating a missing or unparsable file as empty
    #[must_use]
    pub fn load_or_empty(&self) -> Vec<IndexRecord> {
        match self.load() {
            Ok(records) => records,
            Err(IndexError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no index file yet");
                Vec::new()
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "index unreadable, rebuilding");
                Vec::new()
            }
        }
    }

    /// Write `records` as the new index
    ///
    /// The document is written to a sibling temporary file first and then
    /// renamed over the old index.
    ///
    /// # Errors
    ///
    /// Returns `IndexError::Io` if the file cannot be written.
    pub fn save(&self, records: &[IndexRecord]) -> Result<(), IndexError> {
        let bytes = render_index(records)?;
        let io_error = |source| IndexError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
        let tmp = self.path.with_extension("xml.tmp");
        fs::write(&tmp, bytes).map_err(io_error)?;
        fs::rename(&tmp, &self.path).map_err(io_error)?;

        tracing::debug!(path = %self.path.display(), records = records.len(), "index written");
        Ok(())
    }

    /// Delete the index file
    ///
    /// Returns `Ok(false)` when there was nothing to delete.
    ///
    /// # Errors
    ///
    /// Returns `IndexError::Io` if the file exists but cannot be removed.
    pub fn remove(&self) -> Result<bool, IndexError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(IndexError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

/// Parse an index document
///
/// Album elements that lack a file name, size or first date are skipped with
/// a warning; their files will be re-derived on the next reconciliation.
///
/// # Errors
///
/// Returns `IndexError` if the document is malformed or has the wrong root.
pub fn parse_index(bytes: &[u8]) -> Result<Vec<IndexRecord>, IndexError> {
    let root = xml::parse(bytes)?;
    if root.name != ROOT {
        return Err(IndexError::InvalidRoot(root.name));
    }
    Ok(root.children_named(ALBUM).filter_map(parse_record).collect())
}

fn parse_record(element: &Element) -> Option<IndexRecord> {
    let file_name = element.attr("file").map(str::trim).filter(|f| !f.is_empty());
    let Some(file_name) = file_name else {
        tracing::warn!("index entry without a file name ignored");
        return None;
    };
    let Some(file_size) = element.attr("size").and_then(|s| s.trim().parse::<u64>().ok()) else {
        tracing::warn!(file = file_name, "index entry without a valid size ignored");
        return None;
    };

    let text_of = |name: &str| element.child(name).map(Element::inner_text);
    let Some(first_date) = text_of("firstdate").as_deref().and_then(parse_date) else {
        tracing::warn!(file = file_name, "index entry without a valid first date ignored");
        return None;
    };

    let mut record = IndexRecord::new(file_name, file_size, first_date);
    record.identifier = element.attr("identifier").unwrap_or_default().to_string();
    if let Some(title) = text_of("title") {
        record.title = title;
    }
    record.last_date = text_of("lastdate")
        .as_deref()
        .and_then(parse_date)
        .map_or(first_date, |d| d.max(first_date));
    record.location = text_of("location").unwrap_or_default();
    record.author = text_of("author").unwrap_or_default();
    record.cover_file_name = text_of("cover").unwrap_or_default();
    Some(record)
}

/// Serialize records into an index document
///
/// # Errors
///
/// Returns `IndexError::Xml` if serialization fails.
pub fn render_index(records: &[IndexRecord]) -> Result<Vec<u8>, IndexError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
    writer.write_event(Event::Start(BytesStart::new(ROOT)))?;

    for record in records {
        let size = record.file_size.to_string();
        let mut start = BytesStart::new(ALBUM);
        start.push_attribute(("identifier", record.identifier.as_str()));
        start.push_attribute(("file", record.file_name.as_str()));
        start.push_attribute(("size", size.as_str()));
        writer.write_event(Event::Start(start))?;

        write_text_element(&mut writer, "title", &record.title)?;
        let first = record.first_date.format(DATE_FORMAT).to_string();
        write_text_element(&mut writer, "firstdate", &first)?;
        if record.last_date != record.first_date {
            let last = record.last_date.format(DATE_FORMAT).to_string();
            write_text_element(&mut writer, "lastdate", &last)?;
        }
        for (name, value) in [
            ("location", &record.location),
            ("author", &record.author),
            ("cover", &record.cover_file_name),
        ] {
            if !value.trim().is_empty() {
                write_text_element(&mut writer, name, value)?;
            }
        }

        writer.write_event(Event::End(BytesEnd::new(ALBUM)))?;
    }

    writer.write_event(Event::End(BytesEnd::new(ROOT)))?;
    Ok(writer.into_inner())
}

fn write_text_element(writer: &mut Writer<Vec<u8>>, name: &str, text: &str) -> Result<(), quick_xml::Error> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}
