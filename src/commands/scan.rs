//! Scan command - reconcile the index with the album directory

use crate::{
    AlbumrError,
    jobs::{self, JobControl, JobOutcome},
    library::Library,
    reconcile::{DeriveStatus, ReconcileEvent},
};
use colored::Colorize;

type Result<T> = std::result::Result<T, AlbumrError>;

/// Execute the scan command
///
/// Reconciliation runs as a background job; its events are printed as they
/// arrive.
///
/// # Errors
/// Returns an error if the job cannot start, the directory cannot be read, or
/// the index cannot be written.
pub fn execute(library: Library, quiet: bool) -> Result<()> {
    let control = JobControl::new();
    let name = library.name.clone();
    let job = jobs::spawn_reconcile(&control, library)?;

    for event in job.events() {
        if !quiet {
            print_event(&event);
        }
    }

    let report = job.join()??;

    for failure in &report.failures {
        eprintln!("{} {failure}", "Warning:".yellow());
    }

    if report.outcome == JobOutcome::Cancelled {
        eprintln!("Scan of '{name}' was cancelled; the index was left unchanged.");
        return Ok(());
    }

    if !quiet {
        println!(
            "Library '{name}': {} album(s) indexed ({} kept, {} added, {} removed, {} skipped, {} failed){}",
            report.index.len(),
            report.kept,
            report.added.len(),
            report.removed.len(),
            report.skipped.len(),
            report.failures.len(),
            if report.persisted { "" } else { ", no changes" }
        );
    }
    Ok(())
}

fn print_event(event: &ReconcileEvent) {
    match event {
        ReconcileEvent::Listed { found, indexed } => {
            println!("Found {found} archive(s), {indexed} indexed record(s)");
        }
        ReconcileEvent::Removed { file_name } => {
            println!("  {} {file_name}", "-".red());
        }
        ReconcileEvent::Derived {
            file_name,
            status,
            completed,
            total,
        } => {
            let marker = match status {
                DeriveStatus::Added => "+".green().to_string(),
                DeriveStatus::Skipped => "~".dimmed().to_string(),
                DeriveStatus::Failed(_) => "!".red().to_string(),
            };
            println!("  [{completed}/{total}] {marker} {file_name}");
        }
    }
}
