//! Index reconciliation
//!
//! Brings a library's persisted index in line with the archives actually
//! present in its work directory:
//!
//! 1. Load the persisted index (missing or corrupt means empty)
//! 2. List the `*.album.epub` files in the work directory
//! 3. Keep records whose file name and size both match
//! 4. Drop records whose file vanished or changed, deleting their
//!    thumbnail and extraction cache
//! 5. Derive fresh records for new and changed files
//! 6. Write the index only if steps 4 or 5 changed anything
//!
//! A cancelled run never writes the index. Whatever it already deleted is
//! gone, and the next run re-derives anything the stale index still lacks.

pub mod error;

pub use error::ReconcileError;

use crate::ItemFailure;
use crate::archive::{AlbumArchive, layout};
use crate::index::{self, LibraryIndex};
use crate::jobs::{CancellationToken, JobOutcome};
use crate::library::{ArchiveFile, Library, is_valid_identifier};
use crate::metadata::{self, MetadataError, thumbnail};
use crate::model::IndexRecord;
use crossbeam_channel::Sender;
use rayon::prelude::*;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use uuid::Uuid;

/// How a new or changed file was handled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeriveStatus {
    Added,
    /// Not an album archive
    Skipped,
    Failed(String),
}

/// Progress notification from a reconciliation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileEvent {
    /// Directory listed and index loaded
    Listed { found: usize, indexed: usize },
    /// A stale record was dropped
    Removed { file_name: String },
    /// A new or changed file was processed
    Derived {
        file_name: String,
        status: DeriveStatus,
        completed: usize,
        total: usize,
    },
}

/// Receives reconciliation events
pub trait ReconcileObserver {
    fn on_event(&mut self, event: ReconcileEvent);
}

impl ReconcileObserver for () {
    fn on_event(&mut self, _event: ReconcileEvent) {}
}

impl ReconcileObserver for Vec<ReconcileEvent> {
    fn on_event(&mut self, event: ReconcileEvent) {
        self.push(event);
    }
}

impl ReconcileObserver for Sender<ReconcileEvent> {
    fn on_event(&mut self, event: ReconcileEvent) {
        if self.send(event).is_err() {
            tracing::debug!("reconcile consumer went away");
        }
    }
}

/// Result of one reconciliation run
#[derive(Debug)]
pub struct ReconcileReport {
    /// The up-to-date index (partial when cancelled)
    pub index: LibraryIndex,
    /// Records carried over unchanged
    pub kept: usize,
    /// Files given a freshly derived record
    pub added: Vec<String>,
    /// Records dropped because their file vanished or changed
    pub removed: Vec<String>,
    /// Files that are not albums
    pub skipped: Vec<String>,
    pub failures: Vec<ItemFailure>,
    /// Whether the index file was rewritten
    pub persisted: bool,
    pub outcome: JobOutcome,
}

impl ReconcileReport {
    /// Whether the run changed the set of records
    #[must_use]
    pub fn is_modified(&self) -> bool {
        !self.added.is_empty() || !self.removed.is_empty()
    }
}

enum Derivation {
    Added(IndexRecord),
    NotAnAlbum,
    Failed(ItemFailure),
    Cancelled,
}

/// Reconciles one library
pub struct Reconciler<'a> {
    library: &'a Library,
}

impl<'a> Reconciler<'a> {
    #[must_use]
    pub const fn new(library: &'a Library) -> Self {
        Self { library }
    }

    /// Run a reconciliation
    ///
    /// Cancellation is polled once per listed file, once per stale record,
    /// and once per file to derive.
    ///
    /// # Errors
    ///
    /// Returns `ReconcileError::Directory` if the work or data directories
    /// cannot be created or listed, and `ReconcileError::Index` if the new
    /// index cannot be written. Per-file problems are reported in
    /// `ReconcileReport::failures` instead.
    pub fn run<O>(&self, token: &CancellationToken, observer: &mut O) -> Result<ReconcileReport, ReconcileError>
    where
        O: ReconcileObserver + ?Sized,
    {
        let library = self.library;
        create_dir(&library.work_dir)?;
        create_dir(&library.thumbs_dir())?;

        let mut loaded = library.index_file().load_or_empty();
        index::normalize(&mut loaded);
        let found = library
            .scan_directory()
            .map_err(|source| ReconcileError::Directory {
                path: library.work_dir.clone(),
                source,
            })?;
        tracing::info!(library = %library.name, found = found.len(), indexed = loaded.len(), "reconciling");
        observer.on_event(ReconcileEvent::Listed {
            found: found.len(),
            indexed: loaded.len(),
        });

        // match listed files against the loaded records
        let mut kept = Vec::with_capacity(found.len());
        let mut pending = Vec::new();
        for file in found {
            if token.is_cancelled() {
                break;
            }
            match loaded.binary_search_by(|r| r.file_name.as_str().cmp(&file.file_name)) {
                Ok(position) if loaded[position].file_size == file.size => kept.push(loaded.remove(position)),
                Ok(_) => {
                    tracing::debug!(file = %file.file_name, size = file.size, "size changed, re-deriving");
                    pending.push(file);
                }
                Err(_) => pending.push(file),
            }
        }
        let kept_count = kept.len();

        // whatever is left in `loaded` is stale
        let in_use: HashSet<String> = kept.iter().map(|r| r.identifier.clone()).collect();
        let mut removed = Vec::new();
        for record in loaded {
            if token.is_cancelled() {
                break;
            }
            if !in_use.contains(&record.identifier) {
                self.remove_artifacts(&record.identifier);
            }
            tracing::debug!(file = %record.file_name, "stale record dropped");
            observer.on_event(ReconcileEvent::Removed {
                file_name: record.file_name.clone(),
            });
            removed.push(record.file_name);
        }

        let derived = if token.is_cancelled() {
            Vec::new()
        } else {
            self.derive_all(&pending, token, observer)
        };

        let mut added = Vec::new();
        let mut skipped = Vec::new();
        let mut failures = Vec::new();
        for (file, derivation) in pending.iter().zip(derived) {
            match derivation {
                Derivation::Added(record) => {
                    kept.push(record);
                    added.push(file.file_name.clone());
                }
                Derivation::NotAnAlbum => skipped.push(file.file_name.clone()),
                Derivation::Failed(failure) => failures.push(failure),
                Derivation::Cancelled => {}
            }
        }

        let outcome = JobOutcome::from_token(token);
        let modified = !added.is_empty() || !removed.is_empty();
        index::normalize(&mut kept);

        let persisted = if modified && outcome == JobOutcome::Completed {
            library.index_file().save(&kept)?;
            true
        } else {
            false
        };

        tracing::info!(
            library = %library.name,
            kept = kept_count,
            added = added.len(),
            removed = removed.len(),
            skipped = skipped.len(),
            failed = failures.len(),
            persisted,
            ?outcome,
            "reconcile finished"
        );

        Ok(ReconcileReport {
            index: LibraryIndex::new(&library.work_dir, kept),
            kept: kept_count,
            added,
            removed,
            skipped,
            failures,
            persisted,
            outcome,
        })
    }

    /// Derive records for `pending` in parallel, forwarding progress to
    /// `observer` from the calling thread
    fn derive_all<O>(&self, pending: &[ArchiveFile], token: &CancellationToken, observer: &mut O) -> Vec<Derivation>
    where
        O: ReconcileObserver + ?Sized,
    {
        let total = pending.len();
        let completed = AtomicUsize::new(0);
        let (sender, receiver) = crossbeam_channel::unbounded();

        thread::scope(|scope| {
            let completed = &completed;
            let worker = scope.spawn(move || {
                pending
                    .par_iter()
                    .map_with(sender, |sender, file| {
                        if token.is_cancelled() {
                            return Derivation::Cancelled;
                        }
                        let derivation = self.derive(file);
                        let status = match &derivation {
                            Derivation::Added(_) => Some(DeriveStatus::Added),
                            Derivation::NotAnAlbum => Some(DeriveStatus::Skipped),
                            Derivation::Failed(failure) => Some(DeriveStatus::Failed(failure.error.to_string())),
                            Derivation::Cancelled => None,
                        };
                        if let Some(status) = status {
                            let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                            let _ = sender.send(ReconcileEvent::Derived {
                                file_name: file.file_name.clone(),
                                status,
                                completed: done,
                                total,
                            });
                        }
                        derivation
                    })
                    .collect::<Vec<_>>()
            });

            for event in &receiver {
                observer.on_event(event);
            }
            worker
                .join()
                .unwrap_or_else(|payload| std::panic::resume_unwind(payload))
        })
    }

    fn derive(&self, file: &ArchiveFile) -> Derivation {
        match self.derive_record(file) {
            Ok(Some(record)) => Derivation::Added(record),
            Ok(None) => {
                tracing::debug!(file = %file.file_name, "not an album, skipped");
                Derivation::NotAnAlbum
            }
            Err(error) => {
                tracing::warn!(file = %file.file_name, error = %error, "album skipped");
                Derivation::Failed(ItemFailure::new(file.file_name.clone(), error))
            }
        }
    }

    /// Parse a new or changed archive and render its cover thumbnail
    fn derive_record(&self, file: &ArchiveFile) -> Result<Option<IndexRecord>, MetadataError> {
        tracing::debug!(file = %file.file_name, "deriving record");
        let mut archive = AlbumArchive::open(self.library.work_dir.join(&file.file_name))?;
        let Some(mut document) = metadata::read_document(&mut archive)? else {
            return Ok(None);
        };

        if !is_valid_identifier(&document.identifier) {
            let generated = Uuid::new_v4().to_string();
            tracing::warn!(
                file = %file.file_name,
                identifier = %document.identifier,
                generated = %generated,
                "album identifier unusable, generated one"
            );
            document.identifier = generated;
        }

        let cover = document.cover_file_name.trim();
        if !cover.is_empty() {
            let entry = layout::content(cover);
            match archive.read_entry(&entry)? {
                Some(bytes) => thumbnail::write_cover_thumbnail(
                    &bytes,
                    &self.library.thumbnail,
                    &self.library.thumbnail_path(&document.identifier),
                )?,
                None => tracing::warn!(file = %file.file_name, entry = %entry, "cover image not found"),
            }
        }
        drop(archive);

        let record = IndexRecord::from_document(&file.file_name, file.size, &document);
        record.attach_document(document);
        Ok(Some(record))
    }

    /// Best-effort removal of a dropped album's thumbnail and cache
    fn remove_artifacts(&self, identifier: &str) {
        if !is_valid_identifier(identifier) {
            return;
        }
        remove_quietly(&self.library.thumbnail_path(identifier), |path| fs::remove_file(path));
        remove_quietly(&self.library.cache_dir(identifier), |path| fs::remove_dir_all(path));
    }
}

fn remove_quietly(path: &Path, remove: impl Fn(&Path) -> io::Result<()>) {
    match remove(path) {
        Ok(()) => tracing::debug!(path = %path.display(), "artifact removed"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "cannot remove artifact"),
    }
}

fn create_dir(path: &Path) -> Result<(), ReconcileError> {
    fs::create_dir_all(path).map_err(|source| ReconcileError::Directory {
        path: path.to_path_buf(),
        source,
    })
}
