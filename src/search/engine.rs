//! Two-stage incremental search
//!
//! Stage 1 picks candidate records from the index without touching any
//! archive. Stage 2 parses each candidate (once per process, cached on the
//! record), scans its chapters, and reports the new matches after every
//! candidate. Cancellation is polled before each candidate, after its parse,
//! and after every paragraph.

use super::query::{QueryMatcher, SearchQuery};
use crate::ItemFailure;
use crate::archive::AlbumArchive;
use crate::index::LibraryIndex;
use crate::jobs::{CancellationToken, JobOutcome};
use crate::model::{AlbumDocument, ParagraphRef};
use crossbeam_channel::Sender;
use serde::Serialize;

/// Candidates processed so far
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SearchProgress {
    pub completed: usize,
    pub total: usize,
}

impl SearchProgress {
    /// Completion in whole percent
    #[must_use]
    pub const fn percent(&self) -> usize {
        if self.total == 0 {
            100
        } else {
            self.completed * 100 / self.total
        }
    }
}

/// Receives matches as the search advances
///
/// `matches` holds exactly the matches appended since the previous call, in
/// result order.
pub trait SearchObserver {
    fn on_progress(&mut self, progress: &SearchProgress, matches: &[ParagraphRef]);
}

impl SearchObserver for () {
    fn on_progress(&mut self, _progress: &SearchProgress, _matches: &[ParagraphRef]) {}
}

/// One progress report sent over a channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchEvent {
    pub progress: SearchProgress,
    pub matches: Vec<ParagraphRef>,
}

impl SearchObserver for Vec<SearchEvent> {
    fn on_progress(&mut self, progress: &SearchProgress, matches: &[ParagraphRef]) {
        self.push(SearchEvent {
            progress: *progress,
            matches: matches.to_vec(),
        });
    }
}

impl SearchObserver for Sender<SearchEvent> {
    fn on_progress(&mut self, progress: &SearchProgress, matches: &[ParagraphRef]) {
        let event = SearchEvent {
            progress: *progress,
            matches: matches.to_vec(),
        };
        if self.send(event).is_err() {
            tracing::debug!("search consumer went away");
        }
    }
}

/// Result of one search run
#[derive(Debug)]
pub struct SearchSummary {
    /// Every match in delivery order
    pub matches: Vec<ParagraphRef>,
    /// Number of stage-1 candidates
    pub candidates: usize,
    /// Candidates fully processed
    pub completed: usize,
    /// Candidates that could not be parsed
    pub failures: Vec<ItemFailure>,
    pub outcome: JobOutcome,
}

/// Searches the albums of one index
pub struct SearchEngine<'a> {
    index: &'a LibraryIndex,
}

impl<'a> SearchEngine<'a> {
    #[must_use]
    pub const fn new(index: &'a LibraryIndex) -> Self {
        Self { index }
    }

    /// Positions of the records passing stage 1, in index order
    #[must_use]
    pub fn candidates(&self, matcher: &QueryMatcher) -> Vec<usize> {
        self.index
            .iter()
            .enumerate()
            .filter(|(_, record)| matcher.is_candidate(record))
            .map(|(position, _)| position)
            .collect()
    }

    /// Run `query`, reporting to `observer` after each candidate
    ///
    /// A candidate whose archive cannot be parsed is recorded as a failure
    /// and reported with no matches. On cancellation the matches found so
    /// far, including those of an interrupted candidate, are delivered and
    /// kept in the summary.
    pub fn run<O>(&self, query: &SearchQuery, token: &CancellationToken, observer: &mut O) -> SearchSummary
    where
        O: SearchObserver + ?Sized,
    {
        let matcher = QueryMatcher::new(query);
        let candidates = self.candidates(&matcher);
        let total = candidates.len();
        tracing::info!(candidates = total, records = self.index.len(), "search started");

        let mut matches = Vec::new();
        let mut failures = Vec::new();
        let mut completed = 0;

        for &position in &candidates {
            if token.is_cancelled() {
                break;
            }
            let record = &self.index.records()[position];
            let start = matches.len();

            let document = match record.document(self.index.work_dir()) {
                Ok(document) => Some(document),
                Err(error) => {
                    tracing::warn!(file = %record.file_name, error = %error, "search candidate skipped");
                    failures.push(ItemFailure::new(record.file_name.clone(), error));
                    None
                }
            };

            if let Some(document) = document {
                if token.is_cancelled() {
                    break;
                }
                let interrupted = scan_document(position, document, &matcher, token, &mut matches);
                preload_thumbnails(document, &matches[start..]);
                if interrupted {
                    observer.on_progress(&SearchProgress { completed, total }, &matches[start..]);
                    break;
                }
            }

            completed += 1;
            observer.on_progress(&SearchProgress { completed, total }, &matches[start..]);
        }

        let outcome = if completed < total {
            JobOutcome::Cancelled
        } else {
            JobOutcome::Completed
        };
        tracing::info!(matches = matches.len(), completed, total, ?outcome, "search finished");

        SearchSummary {
            matches,
            candidates: total,
            completed,
            failures,
            outcome,
        }
    }
}

/// Append the matches of one album; returns `true` if cancelled midway
fn scan_document(
    record: usize,
    document: &AlbumDocument,
    matcher: &QueryMatcher,
    token: &CancellationToken,
    out: &mut Vec<ParagraphRef>,
) -> bool {
    for (chapter_index, chapter) in document.real_chapters() {
        if matcher.selects_whole_chapter(chapter) {
            out.extend((0..chapter.paragraphs.len()).map(|p| ParagraphRef::new(record, chapter_index, p)));
            continue;
        }

        for (paragraph_index, paragraph) in chapter.paragraphs.iter().enumerate() {
            if matcher.matches_paragraph(paragraph) {
                out.push(ParagraphRef::new(record, chapter_index, paragraph_index));
            }
            if token.is_cancelled() {
                return true;
            }
        }
    }
    false
}

/// Load the pre-baked thumbnails of every photo in `matches`
///
/// The archive is opened once and closed before returning. Missing
/// thumbnails are left unloaded.
fn preload_thumbnails(document: &AlbumDocument, matches: &[ParagraphRef]) {
    let pending: Vec<_> = matches
        .iter()
        .filter_map(|r| {
            let chapter = document.chapters.get(r.chapter)?;
            Some((chapter, chapter.paragraphs.get(r.paragraph)?))
        })
        .flat_map(|(chapter, paragraph)| {
            paragraph
                .photos
                .iter()
                .filter(|photo| photo.thumbnail_bytes().is_none())
                .map(move |photo| (chapter, photo))
        })
        .collect();
    if pending.is_empty() {
        return;
    }

    let mut archive = match AlbumArchive::open(&document.path) {
        Ok(archive) => archive,
        Err(e) => {
            tracing::warn!(path = %document.path.display(), error = %e, "thumbnails not preloaded");
            return;
        }
    };

    for (chapter, photo) in pending {
        let entry = chapter.thumbnail_entry(photo);
        match archive.read_entry(&entry) {
            Ok(Some(bytes)) => {
                photo.set_thumbnail_bytes(bytes);
            }
            Ok(None) => tracing::debug!(entry = %entry, "no thumbnail"),
            Err(e) => tracing::warn!(entry = %entry, error = %e, "thumbnail unreadable"),
        }
    }
}
