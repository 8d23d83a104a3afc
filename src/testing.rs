//! Testing utilities for albumr
//!
//! Builders for real album archives (`AlbumFixture`) and a temporary library
//! with its own work and data directories (`TestLibrary`).
//!
//! Only available when compiled with `cfg(test)`.

use crate::index::LibraryIndex;
use crate::library::Library;
use crate::reconcile::{ReconcileReport, Reconciler};
use crate::jobs::CancellationToken;
use chrono::NaiveDate;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use quick_xml::escape::escape;
use std::fmt::Write as _;
use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

/// Encode a solid-color PNG of the given size
///
/// # Panics
/// Panics if encoding fails.
#[must_use]
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    image_bytes(width, height, ImageFormat::Png)
}

/// Encode a solid test image in `format`
#[must_use]
pub fn image_bytes(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let image = RgbaImage::from_pixel(width, height, Rgba([200, 120, 40, 255]));
    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(image)
        .write_to(&mut Cursor::new(&mut bytes), format)
        .expect("Failed to encode test image");
    bytes
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid test date")
}

/// One paragraph of a fixture chapter
#[derive(Debug, Clone)]
pub struct ParagraphFixture {
    context: String,
    title: Option<String>,
    date: Option<(String, bool)>,
    location: Option<(String, bool)>,
    photos: Vec<(String, String)>,
}

impl ParagraphFixture {
    #[must_use]
    pub fn new(context: &str) -> Self {
        Self {
            context: context.to_string(),
            title: None,
            date: None,
            location: None,
            photos: Vec::new(),
        }
    }

    #[must_use]
    pub fn title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    #[must_use]
    pub fn date(mut self, value: &str, visible: bool) -> Self {
        self.date = Some((value.to_string(), visible));
        self
    }

    #[must_use]
    pub fn location(mut self, value: &str, visible: bool) -> Self {
        self.location = Some((value.to_string(), visible));
        self
    }

    #[must_use]
    pub fn photo(mut self, file_name: &str, description: &str) -> Self {
        self.photos.push((file_name.to_string(), description.to_string()));
        self
    }

    fn write_xml(&self, out: &mut String) {
        out.push_str("  <paragraph>\n");
        if let Some(title) = &self.title {
            let _ = writeln!(out, "    <title>{}</title>", escape(title));
        }
        let _ = writeln!(out, "    <context>{}</context>", escape(&self.context));
        if let Some((value, visible)) = &self.date {
            let _ = writeln!(out, "    <date visible=\"{visible}\">{}</date>", escape(value));
        }
        if let Some((value, visible)) = &self.location {
            let _ = writeln!(out, "    <location visible=\"{visible}\">{}</location>", escape(value));
        }
        for (file, description) in &self.photos {
            let _ = writeln!(out, "    <photo file=\"{}\">{}</photo>", escape(file), escape(description));
        }
        out.push_str("  </paragraph>\n");
    }
}

/// One chapter of a fixture album
#[derive(Debug, Clone)]
pub struct ChapterFixture {
    directory: String,
    title: String,
    paragraphs: Vec<ParagraphFixture>,
    with_document: bool,
}

impl ChapterFixture {
    #[must_use]
    pub fn new(directory: &str, title: &str) -> Self {
        Self {
            directory: directory.to_string(),
            title: title.to_string(),
            paragraphs: Vec::new(),
            with_document: true,
        }
    }

    #[must_use]
    pub fn paragraph(mut self, paragraph: ParagraphFixture) -> Self {
        self.paragraphs.push(paragraph);
        self
    }

    /// Leave out `chapter.xml`
    #[must_use]
    pub const fn without_document(mut self) -> Self {
        self.with_document = false;
        self
    }

    fn document(&self) -> String {
        let mut out = String::from("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<chapter>\n");
        for paragraph in &self.paragraphs {
            paragraph.write_xml(&mut out);
        }
        out.push_str("</chapter>\n");
        out
    }
}

#[derive(Debug, Clone)]
enum MetadataFixture {
    Generated,
    Raw(String),
    Absent,
}

/// Builder for a complete album archive
///
/// Besides the metadata documents, the archive holds a stylesheet, a preface
/// page, one page per chapter, and a photo plus a pre-baked thumbnail for
/// every photo reference.
#[derive(Debug, Clone)]
pub struct AlbumFixture {
    identifier: String,
    title: String,
    author: String,
    location: String,
    first_date: NaiveDate,
    last_date: NaiveDate,
    cover: bool,
    chapters: Vec<ChapterFixture>,
    metadata: MetadataFixture,
}

impl AlbumFixture {
    #[must_use]
    pub fn new(identifier: &str, title: &str) -> Self {
        Self {
            identifier: identifier.to_string(),
            title: title.to_string(),
            author: String::new(),
            location: String::new(),
            first_date: date(2024, 5, 1),
            last_date: date(2024, 5, 3),
            cover: false,
            chapters: Vec::new(),
            metadata: MetadataFixture::Generated,
        }
    }

    #[must_use]
    pub fn author(mut self, author: &str) -> Self {
        self.author = author.to_string();
        self
    }

    #[must_use]
    pub fn location(mut self, location: &str) -> Self {
        self.location = location.to_string();
        self
    }

    #[must_use]
    pub const fn dates(mut self, first: NaiveDate, last: NaiveDate) -> Self {
        self.first_date = first;
        self.last_date = last;
        self
    }

    /// Include `EPUB/cover.png` and reference it
    #[must_use]
    pub const fn with_cover(mut self) -> Self {
        self.cover = true;
        self
    }

    #[must_use]
    pub fn chapter(mut self, chapter: ChapterFixture) -> Self {
        self.chapters.push(chapter);
        self
    }

    /// Leave out `EPUB/album.xml`, making the archive a non-album
    #[must_use]
    pub fn without_metadata(mut self) -> Self {
        self.metadata = MetadataFixture::Absent;
        self
    }

    /// Use `xml` verbatim as `EPUB/album.xml`
    #[must_use]
    pub fn with_raw_metadata(mut self, xml: &str) -> Self {
        self.metadata = MetadataFixture::Raw(xml.to_string());
        self
    }

    fn album_document(&self) -> String {
        let mut out = String::from("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
        let _ = writeln!(out, "<album identifier=\"{}\">", escape(&self.identifier));
        let _ = writeln!(out, "  <title>{}</title>", escape(&self.title));
        let _ = writeln!(out, "  <firstdate>{}</firstdate>", self.first_date.format("%Y-%m-%d"));
        let _ = writeln!(out, "  <lastdate>{}</lastdate>", self.last_date.format("%Y-%m-%d"));
        if !self.location.is_empty() {
            let _ = writeln!(out, "  <location>{}</location>", escape(&self.location));
        }
        if !self.author.is_empty() {
            let _ = writeln!(out, "  <author>{}</author>", escape(&self.author));
        }
        if self.cover {
            out.push_str("  <cover>cover.png</cover>\n");
        }
        out.push_str("  <chapters>\n");
        for chapter in &self.chapters {
            let _ = writeln!(
                out,
                "    <chapter dir=\"{}\">{}</chapter>",
                escape(&chapter.directory),
                escape(&chapter.title)
            );
        }
        out.push_str("  </chapters>\n</album>\n");
        out
    }

    /// Encode the archive
    ///
    /// # Panics
    /// Panics if writing the zip fails.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buffer = Vec::new();
        {
            let mut zip = zip::ZipWriter::new(Cursor::new(&mut buffer));
            let options =
                SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
            let mut add = |name: &str, bytes: &[u8]| {
                zip.start_file(name, options).expect("Failed to start zip entry");
                zip.write_all(bytes).expect("Failed to write zip entry");
            };

            add("mimetype", b"application/epub+zip");
            match &self.metadata {
                MetadataFixture::Generated => add("EPUB/album.xml", self.album_document().as_bytes()),
                MetadataFixture::Raw(xml) => add("EPUB/album.xml", xml.as_bytes()),
                MetadataFixture::Absent => {}
            }
            add("EPUB/style.css", b"body { margin: 0; }");
            add("EPUB/title.xhtml", b"<html><body>Preface</body></html>");
            if self.cover {
                add("EPUB/cover.png", &png_bytes(40, 30));
            }

            let photo = png_bytes(4, 3);
            for chapter in &self.chapters {
                let page = format!("<html><body>{}</body></html>", escape(&chapter.title));
                add(&format!("EPUB/{}.xhtml", chapter.directory), page.as_bytes());
                if chapter.with_document {
                    add(&format!("EPUB/{}/chapter.xml", chapter.directory), chapter.document().as_bytes());
                }
                for (file, _) in chapter.paragraphs.iter().flat_map(|p| &p.photos) {
                    add(&format!("EPUB/{}/{file}", chapter.directory), &photo);
                    add(&format!("EPUB/{}/thumbs/{file}", chapter.directory), &photo);
                }
            }

            zip.finish().expect("Failed to finish zip");
        }
        buffer
    }

    /// Write the archive to `dir/file_name` and return its path
    ///
    /// # Panics
    /// Panics if the file cannot be written.
    pub fn write_to(&self, dir: &Path, file_name: &str) -> PathBuf {
        let path = dir.join(file_name);
        fs::write(&path, self.to_bytes()).expect("Failed to write album fixture");
        path
    }
}

/// A library rooted in a temporary directory
///
/// The work directory and data directory are removed when the value is
/// dropped.
pub struct TestLibrary {
    _root: TempDir,
    library: Library,
}

impl TestLibrary {
    /// # Panics
    /// Panics if the temporary directories cannot be created.
    #[must_use]
    pub fn new() -> Self {
        let root = TempDir::new().expect("Failed to create temp dir");
        let library = Library::new("test", root.path().join("albums"), root.path().join("data"));
        library.ensure_dirs().expect("Failed to create library dirs");
        Self { _root: root, library }
    }

    #[must_use]
    pub const fn library(&self) -> &Library {
        &self.library
    }

    #[must_use]
    pub fn work_dir(&self) -> &Path {
        &self.library.work_dir
    }

    /// Write an album archive into the work directory
    pub fn add_album(&self, file_name: &str, album: AlbumFixture) -> PathBuf {
        album.write_to(&self.library.work_dir, file_name)
    }

    #[must_use]
    pub const fn reconciler(&self) -> Reconciler<'_> {
        Reconciler::new(&self.library)
    }

    /// Run a full reconciliation
    ///
    /// # Panics
    /// Panics if reconciliation fails.
    pub fn reconcile(&self) -> ReconcileReport {
        self.reconciler()
            .run(&CancellationToken::new(), &mut ())
            .expect("Reconciliation failed")
    }

    /// Reconcile, then load the persisted index fresh from disk
    ///
    /// The returned records have no parsed documents attached yet.
    pub fn reconciled_index(&self) -> LibraryIndex {
        self.reconcile();
        self.library.load_index()
    }
}
