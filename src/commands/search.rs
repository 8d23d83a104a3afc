//! Search command - stream matching paragraphs

use crate::{
    AlbumrError,
    index::LibraryIndex,
    jobs::{self, JobControl, JobOutcome},
    library::Library,
    output::{self, MatchJson},
    search::{SearchEvent, SearchQuery},
};
use colored::Colorize;
use std::sync::Arc;

type Result<T> = std::result::Result<T, AlbumrError>;

/// Execute the search command
///
/// Matches are printed as the background search reports them, one album at
/// a time. With `json`, each match is one JSON object per line.
///
/// # Errors
/// Returns an error if the job cannot start or a match cannot be serialized.
pub fn execute(library: &Library, query: SearchQuery, json: bool, quiet: bool) -> Result<()> {
    let index = Arc::new(library.load_index());
    if index.is_empty() && !quiet {
        eprintln!("No albums indexed in library '{}'. Run 'albumr scan' first.", library.name);
    }

    let control = JobControl::new();
    let job = jobs::spawn_search(&control, Arc::clone(&index), query)?;

    let mut printed = 0;
    for event in job.events() {
        printed += print_event(&index, &event, json, quiet)?;
    }

    let summary = job.join()?;
    for failure in &summary.failures {
        eprintln!("{} {failure}", "Warning:".yellow());
    }
    if !quiet {
        let suffix = if summary.outcome == JobOutcome::Cancelled { " (cancelled)" } else { "" };
        eprintln!(
            "{printed} match(es) in {}/{} album(s){suffix}",
            summary.completed, summary.candidates
        );
    }
    Ok(())
}

fn print_event(index: &LibraryIndex, event: &SearchEvent, json: bool, quiet: bool) -> Result<usize> {
    let mut printed = 0;
    for &reference in &event.matches {
        let Some(resolved) = index.resolve(reference) else {
            tracing::warn!(%reference, "match could not be resolved");
            continue;
        };
        if json {
            let line = serde_json::to_string(&MatchJson::new(reference, &resolved))
                .map_err(|e| AlbumrError::InvalidInput(format!("Failed to serialize match: {e}")))?;
            println!("{line}");
        } else {
            println!("{}", output::match_line(&resolved, quiet));
        }
        printed += 1;
    }
    tracing::debug!(percent = event.progress.percent(), "search progress");
    Ok(printed)
}
