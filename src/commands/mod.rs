//! Command implementations
//!
//! Each command is a module with an execute function that takes parsed CLI args
//! and runs the operation against one library.

pub mod clear_cache;
pub mod config;
pub mod export;
pub mod lib;
pub mod list;
pub mod open;
pub mod scan;
pub mod search;
pub mod show;

// Re-export execute functions for convenience
pub use clear_cache::execute as clear_cache;
pub use config::execute as config;
pub use export::execute as export;
pub use lib::execute as lib;
pub use list::execute as list;
pub use open::execute as open;
pub use scan::execute as scan;
pub use search::execute as search;
pub use show::execute as show;

use crate::AlbumrError;
use crate::library::{Library, is_valid_identifier};
use crate::model::AlbumDocument;
use std::path::Path;

type Result<T> = std::result::Result<T, AlbumrError>;

/// An album picked on the command line
#[derive(Debug)]
pub struct AlbumTarget {
    pub document: AlbumDocument,
    /// Name of the album's extraction cache
    pub identifier: String,
}

/// Find an album by indexed file name, file stem, identifier or path
///
/// Paths outside the library's work directory are parsed directly and never
/// enter the index.
///
/// # Errors
///
/// Returns `AlbumrError::InvalidInput` if nothing matches `key`, or the
/// metadata error of an archive that cannot be parsed.
pub fn resolve_album(library: &Library, key: &str) -> Result<AlbumTarget> {
    let path = Path::new(key);
    let index = library.load_index();

    let indexed_key = if path.is_file() && library.contains_archive(path) {
        path.file_name().and_then(|name| name.to_str()).unwrap_or(key)
    } else {
        key
    };
    if let Some(record) = index.lookup(indexed_key) {
        let document = record.document(index.work_dir())?.clone();
        return Ok(AlbumTarget {
            document,
            identifier: record.identifier.clone(),
        });
    }

    if path.is_file() {
        let document = AlbumDocument::load(path)?;
        let identifier = if is_valid_identifier(&document.identifier) {
            document.identifier.clone()
        } else {
            uuid::Uuid::new_v4().to_string()
        };
        return Ok(AlbumTarget { document, identifier });
    }

    Err(AlbumrError::InvalidInput(format!(
        "Album '{key}' not found in library '{}'. Run 'albumr scan' if it was added recently.",
        library.name
    )))
}
