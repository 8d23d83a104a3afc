//! Export command - extract a full-size photo

use super::resolve_album;
use crate::{AlbumrError, cache::ExtractionCache, config::PathFormat, library::Library, output};
use std::path::Path;

type Result<T> = std::result::Result<T, AlbumrError>;

/// Execute the export command
///
/// # Errors
/// Returns an error if the album, chapter or photo cannot be found, or the
/// destination cannot be written.
pub fn execute(
    library: &Library,
    album: &str,
    chapter: usize,
    photo: &str,
    dest: &Path,
    path_format: PathFormat,
    quiet: bool,
) -> Result<()> {
    let target = resolve_album(library, album)?;
    ExtractionCache::new(library).export_photo(&target.document, chapter, photo, dest)?;

    if !quiet {
        println!("Exported {photo} to {}", output::format_path(dest, path_format));
    }
    Ok(())
}
