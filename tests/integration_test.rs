//! Integration tests for albumr
//!
//! These tests build real album archives in temporary directories and run the
//! reconcile and search workflows end to end through the public API.

use albumr::jobs::{self, CancellationToken, JobControl, JobOutcome};
use albumr::library::Library;
use albumr::model::ParagraphRef;
use albumr::search::{SearchEngine, SearchObserver, SearchProgress, SearchQuery};
use albumr::reconcile::Reconciler;
use albumr::cache::ExtractionCache;
use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

/// Paragraph contexts per chapter directory
type Chapters<'a> = &'a [(&'a str, &'a str, &'a [&'a str])];

/// Build an album archive with a cover and the given chapters
fn album_bytes(identifier: &str, title: &str, first_date: &str, chapters: Chapters<'_>) -> Vec<u8> {
    let mut buffer = Vec::new();
    {
        let mut zip = zip::ZipWriter::new(Cursor::new(&mut buffer));
        let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        let mut album = format!(
            "<album identifier=\"{identifier}\"><title>{title}</title>\
             <firstdate>{first_date}</firstdate><cover>cover.png</cover><chapters>"
        );
        for (dir, chapter_title, _) in chapters {
            album.push_str(&format!("<chapter dir=\"{dir}\">{chapter_title}</chapter>"));
        }
        album.push_str("</chapters></album>");

        zip.start_file("EPUB/album.xml", options).unwrap();
        zip.write_all(album.as_bytes()).unwrap();
        zip.start_file("EPUB/style.css", options).unwrap();
        zip.write_all(b"body {}").unwrap();
        zip.start_file("EPUB/title.xhtml", options).unwrap();
        zip.write_all(b"<html/>").unwrap();
        zip.start_file("EPUB/cover.png", options).unwrap();
        zip.write_all(&png(60, 40)).unwrap();

        for (dir, _, contexts) in chapters {
            let mut chapter = String::from("<chapter>");
            for context in *contexts {
                chapter.push_str(&format!("<paragraph><context>{context}</context></paragraph>"));
            }
            chapter.push_str("</chapter>");
            zip.start_file(format!("EPUB/{dir}/chapter.xml"), options).unwrap();
            zip.write_all(chapter.as_bytes()).unwrap();
            zip.start_file(format!("EPUB/{dir}.xhtml"), options).unwrap();
            zip.write_all(b"<html/>").unwrap();
        }

        zip.finish().unwrap();
    }
    buffer
}

fn png(width: u32, height: u32) -> Vec<u8> {
    let image = image::RgbImage::from_pixel(width, height, image::Rgb([10, 90, 200]));
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgb8(image)
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}

/// Temporary library with helpers to add and remove archives
struct Fixture {
    _root: TempDir,
    library: Library,
}

impl Fixture {
    fn new() -> Self {
        let root = TempDir::new().unwrap();
        let library = Library::new("it", root.path().join("albums"), root.path().join("data"));
        library.ensure_dirs().unwrap();
        Self { _root: root, library }
    }

    fn add(&self, file_name: &str, bytes: &[u8]) -> PathBuf {
        let path = self.library.work_dir.join(file_name);
        fs::write(&path, bytes).unwrap();
        path
    }

    fn add_simple(&self, file_name: &str, identifier: &str, title: &str) -> PathBuf {
        self.add(
            file_name,
            &album_bytes(identifier, title, "2024-05-01", &[("day1", "Day 1", &["sunny morning"])]),
        )
    }

    fn reconcile(&self) -> albumr::reconcile::ReconcileReport {
        Reconciler::new(&self.library)
            .run(&CancellationToken::new(), &mut ())
            .unwrap()
    }

    fn index_mtime(&self) -> std::time::SystemTime {
        fs::metadata(self.library.index_file().path()).unwrap().modified().unwrap()
    }
}

fn file_names(library: &Library) -> Vec<String> {
    library.load_index().iter().map(|r| r.file_name.clone()).collect()
}

#[test]
fn test_reconcile_keeps_unchanged_drops_deleted_derives_new() {
    let fixture = Fixture::new();
    fixture.add_simple("a.album.epub", "id-a", "Alpha");
    let b = fixture.add_simple("b.album.epub", "id-b", "Bravo");
    fixture.reconcile();

    // a cache directory for b, as if a chapter had been viewed
    let b_cache = fixture.library.cache_dir("id-b");
    fs::create_dir_all(b_cache.join("day1")).unwrap();
    fs::write(b_cache.join("style.css"), b"x").unwrap();
    assert!(fixture.library.thumbnail_path("id-b").exists());

    let a_before = fixture.library.load_index().find("a.album.epub").cloned().unwrap();

    fs::remove_file(b).unwrap();
    fixture.add_simple("c.album.epub", "id-c", "Charlie");
    let report = fixture.reconcile();

    assert_eq!(report.kept, 1);
    assert_eq!(report.added, ["c.album.epub"]);
    assert_eq!(report.removed, ["b.album.epub"]);
    assert!(report.persisted);

    assert_eq!(file_names(&fixture.library), ["a.album.epub", "c.album.epub"]);
    let a_after = fixture.library.load_index().find("a.album.epub").cloned().unwrap();
    assert_eq!(a_before, a_after);
    assert_eq!(fixture.library.load_index().find("c.album.epub").unwrap().title, "Charlie");

    assert!(!fixture.library.thumbnail_path("id-b").exists());
    assert!(!b_cache.exists());
    assert!(fixture.library.thumbnail_path("id-c").exists());
}

#[test]
fn test_second_run_without_changes_writes_nothing() {
    let fixture = Fixture::new();
    fixture.add_simple("a.album.epub", "id-a", "Alpha");
    fixture.add_simple("b.album.epub", "id-b", "Bravo");

    let first = fixture.reconcile();
    assert!(first.persisted);
    let written = fs::read(fixture.library.index_file().path()).unwrap();
    let mtime = fixture.index_mtime();

    let second = fixture.reconcile();
    assert!(!second.persisted);
    assert!(!second.is_modified());
    assert_eq!(second.kept, 2);
    assert_eq!(fs::read(fixture.library.index_file().path()).unwrap(), written);
    assert_eq!(fixture.index_mtime(), mtime);
}

#[test]
fn test_size_change_rederives_record() {
    let fixture = Fixture::new();
    fixture.add_simple("a.album.epub", "id-a", "Alpha");
    fixture.reconcile();

    let cache_dir = fixture.library.cache_dir("id-a");
    fs::create_dir_all(cache_dir.join("day1/thumbs")).unwrap();
    fs::write(cache_dir.join("day1.xhtml"), b"old page").unwrap();
    let thumbnail = fixture.library.thumbnail_path("id-a");
    fs::write(&thumbnail, b"old thumbnail").unwrap();

    let bigger = album_bytes(
        "id-a",
        "Alpha Revised",
        "2024-06-01",
        &[("day1", "Day 1", &["sunny morning", "rainy evening"]), ("day2", "Day 2", &["home"])],
    );
    fixture.add("a.album.epub", &bigger);
    let report = fixture.reconcile();

    assert_eq!(report.added, ["a.album.epub"]);
    let index = fixture.library.load_index();
    let record = index.find("a.album.epub").unwrap();
    assert_eq!(record.title, "Alpha Revised");
    assert_eq!(record.file_size, bigger.len() as u64);
    assert!(!cache_dir.exists());
    assert_ne!(fs::read(&thumbnail).unwrap(), b"old thumbnail");
}

#[test]
fn test_persisted_index_is_sorted_and_unique() {
    let fixture = Fixture::new();
    for name in ["m", "b", "z", "a", "k"] {
        fixture.add_simple(&format!("{name}.album.epub"), &format!("id-{name}"), name);
    }
    fixture.add("notes.album.epub", b"not a zip at all");
    let report = fixture.reconcile();

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].file_name, "notes.album.epub");

    let names = file_names(&fixture.library);
    assert_eq!(names, ["a", "b", "k", "m", "z"].map(|n| format!("{n}.album.epub")));

    // the failed file is retried on the next run
    let again = fixture.reconcile();
    assert_eq!(again.failures.len(), 1);
}

#[test]
fn test_search_finds_text_across_albums() {
    let fixture = Fixture::new();
    fixture.add(
        "a.album.epub",
        &album_bytes("id-a", "Coast", "2024-05-01", &[("d1", "Beach day", &["Sun and sand", "Dinner"])]),
    );
    fixture.add(
        "b.album.epub",
        &album_bytes("id-b", "Hills", "2024-07-01", &[("d1", "Hike", &["Sunrise hike", "Rain"])]),
    );
    let index = fixture.library.load_index();
    assert!(index.is_empty());
    let index = fixture.reconcile().index;

    let summary = SearchEngine::new(&index).run(&SearchQuery::new().text("SUN"), &CancellationToken::new(), &mut ());
    assert_eq!(summary.outcome, JobOutcome::Completed);
    // preface is unit 0, the chapter unit 1
    assert_eq!(summary.matches, [ParagraphRef::new(0, 1, 0), ParagraphRef::new(1, 1, 0)]);

    let dated = SearchQuery::new().text("sun").between(
        chrono::NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        chrono::NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
    );
    let summary = SearchEngine::new(&index).run(&dated, &CancellationToken::new(), &mut ());
    assert_eq!(summary.candidates, 1);
    assert_eq!(summary.matches, [ParagraphRef::new(1, 1, 0)]);
}

#[test]
fn test_chapter_title_selects_every_paragraph() {
    let fixture = Fixture::new();
    fixture.add(
        "a.album.epub",
        &album_bytes("id-a", "Coast", "2024-05-01", &[("d1", "Lighthouse walk", &["Wind", "Gulls", ""])]),
    );
    let index = fixture.reconcile().index;

    let summary = SearchEngine::new(&index).run(
        &SearchQuery::new().text("lighthouse"),
        &CancellationToken::new(),
        &mut (),
    );
    assert_eq!(
        summary.matches,
        [ParagraphRef::new(0, 1, 0), ParagraphRef::new(0, 1, 1), ParagraphRef::new(0, 1, 2)]
    );
}

/// Cancels its token after a fixed number of progress reports
struct CancelAfter {
    token: CancellationToken,
    remaining: usize,
    reports: Vec<SearchProgress>,
}

impl SearchObserver for CancelAfter {
    fn on_progress(&mut self, progress: &SearchProgress, _matches: &[ParagraphRef]) {
        self.reports.push(*progress);
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.token.cancel();
        }
    }
}

#[test]
fn test_cancel_after_n_candidates_keeps_exactly_their_matches() {
    let fixture = Fixture::new();
    for (i, name) in ["a", "b", "c", "d", "e"].iter().enumerate() {
        let contexts: &[&str] = if i % 2 == 0 { &["sun one", "sun two"] } else { &["sun only"] };
        fixture.add(
            &format!("{name}.album.epub"),
            &album_bytes(&format!("id-{name}"), name, "2024-05-01", &[("d1", "Day", contexts)]),
        );
    }
    let index = fixture.reconcile().index;
    let query = SearchQuery::new().text("sun");

    let full = SearchEngine::new(&index).run(&query, &CancellationToken::new(), &mut ());
    assert_eq!(full.candidates, 5);

    let token = CancellationToken::new();
    let mut observer = CancelAfter {
        token: token.clone(),
        remaining: 2,
        reports: Vec::new(),
    };
    let partial = SearchEngine::new(&index).run(&query, &token, &mut observer);

    assert_eq!(partial.outcome, JobOutcome::Cancelled);
    assert_eq!(partial.completed, 2);
    let expected: Vec<_> = full.matches.iter().copied().filter(|m| m.record < 2).collect();
    assert_eq!(partial.matches, expected);
    assert_eq!(observer.reports.last().map(SearchProgress::percent), Some(40));
}

#[test]
fn test_background_search_streams_and_blocks_second_job() {
    let fixture = Fixture::new();
    fixture.add_simple("a.album.epub", "id-a", "Alpha");
    fixture.add_simple("b.album.epub", "id-b", "Bravo");
    let index = Arc::new(fixture.reconcile().index);

    let control = JobControl::new();
    let job = jobs::spawn_search(&control, Arc::clone(&index), SearchQuery::new().text("sunny")).unwrap();
    let events: Vec<_> = job.events().iter().collect();
    let summary = job.join().unwrap();

    assert_eq!(events.len(), 2);
    assert_eq!(events.last().unwrap().progress.percent(), 100);
    let streamed: Vec<_> = events.iter().flat_map(|e| e.matches.iter().copied()).collect();
    assert_eq!(streamed, summary.matches);
    for reference in &summary.matches {
        let resolved = index.resolve(*reference).unwrap();
        assert_eq!(resolved.paragraph.context, "sunny morning");
    }
    assert!(!control.is_busy());
}

#[test]
fn test_open_chapter_then_clear_cache() {
    let fixture = Fixture::new();
    fixture.add_simple("a.album.epub", "id-a", "Alpha");
    let index = fixture.reconcile().index;
    let record = index.find("a.album.epub").unwrap();
    let document = record.document(index.work_dir()).unwrap();

    let cache = ExtractionCache::new(&fixture.library);
    let prepared = cache.prepare_chapter(document, &record.identifier, 1).unwrap();
    assert!(prepared.page.ends_with(Path::new("day1.xhtml")));
    assert!(prepared.page.exists());

    let report = cache.clear(true, &CancellationToken::new()).unwrap();
    assert_eq!(report.outcome, JobOutcome::Completed);
    assert!(!prepared.cache_dir.exists());
    assert!(!fixture.library.index_file().path().exists());
    assert!(!fixture.library.thumbnail_path("id-a").exists());

    // everything is derived again on the next scan
    assert_eq!(fixture.reconcile().added, ["a.album.epub"]);
}
