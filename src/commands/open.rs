//! Open command - extract a chapter for reading

use super::resolve_album;
use crate::{AlbumrError, cache::ExtractionCache, config::PathFormat, library::Library, output};

type Result<T> = std::result::Result<T, AlbumrError>;

/// Execute the open command
///
/// Prints the path of the extracted chapter page.
///
/// # Errors
/// Returns an error if the album cannot be found, the chapter does not exist,
/// or extraction fails.
pub fn execute(library: &Library, album: &str, chapter: usize, path_format: PathFormat, quiet: bool) -> Result<()> {
    let target = resolve_album(library, album)?;
    let prepared = ExtractionCache::new(library).prepare_chapter(&target.document, &target.identifier, chapter)?;

    if !quiet && prepared.extracted > 0 {
        eprintln!("Extracted {} file(s) to {}", prepared.extracted, output::format_path(&prepared.cache_dir, path_format));
    }
    println!("{}", output::format_path(&prepared.page, path_format));
    Ok(())
}
