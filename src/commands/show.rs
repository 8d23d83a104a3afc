//! Show command - print an album's table of contents

use super::resolve_album;
use crate::{AlbumrError, library::Library, output};
use colored::Colorize;

type Result<T> = std::result::Result<T, AlbumrError>;

/// Execute the show command
///
/// # Errors
/// Returns an error if the album cannot be found or parsed.
pub fn execute(library: &Library, album: &str, quiet: bool) -> Result<()> {
    let target = resolve_album(library, album)?;
    let document = &target.document;

    if !quiet {
        println!("{}", document.title.bold());
        println!("  {}", output::date_range(document.first_date, document.last_date).cyan());
        if !document.author.is_empty() {
            println!("  by {}", document.author);
        }
        if !document.location.is_empty() {
            println!("  @ {}", document.location.green());
        }
        println!();
    }

    for (position, chapter) in document.chapters.iter().enumerate() {
        let photos: usize = chapter.paragraphs.iter().map(|p| p.photos.len()).sum();
        if quiet {
            println!("{position}\t{}\t{}\t{photos}", chapter.title, chapter.paragraphs.len());
        } else {
            println!(
                "  {position:>3}  {}  ({} paragraph(s), {photos} photo(s))",
                chapter.title.yellow(),
                chapter.paragraphs.len()
            );
        }
    }
    Ok(())
}
