//! List command - list the albums in the index

use crate::{AlbumrError, library::Library, output};

type Result<T> = std::result::Result<T, AlbumrError>;

/// Execute the list command
///
/// Reads the persisted index only; run `scan` first to pick up changes.
///
/// # Errors
/// Currently infallible; a missing or corrupt index lists as empty.
pub fn execute(library: &Library, quiet: bool) -> Result<()> {
    let index = library.load_index();

    if index.is_empty() {
        if !quiet {
            println!("No albums indexed in library '{}'.", library.name);
            println!("Run 'albumr scan' to index {}", library.work_dir.display());
        }
        return Ok(());
    }

    if !quiet {
        println!("Albums in library '{}':", library.name);
    }
    for record in &index {
        println!("{}", output::album_line(record, quiet));
    }
    Ok(())
}
