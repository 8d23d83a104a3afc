//! Clear-cache command - delete derived data of a library

use crate::{
    AlbumrError,
    cache::ExtractionCache,
    jobs::CancellationToken,
    library::Library,
};
use dialoguer::Confirm;

type Result<T> = std::result::Result<T, AlbumrError>;

/// Execute the clear-cache command
///
/// With `all`, the index and cover thumbnails go too, so the next scan
/// re-derives every album. That case asks for confirmation unless `quiet`.
///
/// # Errors
/// Returns an error if the data directory cannot be listed or the prompt fails.
pub fn execute(library: &Library, all: bool, quiet: bool) -> Result<()> {
    if all && !quiet {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Delete the index and all thumbnails of library '{}'?",
                library.name
            ))
            .default(false)
            .interact()
            .map_err(|e| AlbumrError::InvalidInput(format!("Failed to read input: {e}")))?;
        if !confirmed {
            println!("Nothing deleted.");
            return Ok(());
        }
    }

    let report = ExtractionCache::new(library).clear(all, &CancellationToken::new())?;

    if report.failed > 0 {
        eprintln!("Warning: {} item(s) could not be deleted", report.failed);
    }
    if !quiet {
        println!("Removed {} item(s) from {}", report.removed, library.data_dir.display());
    }
    Ok(())
}
