//! Entry paths inside an album archive
//!
//! All content lives under the `EPUB/` prefix. Each chapter has its own
//! subdirectory holding `chapter.xml`, the photos, and a `thumbs/` directory of
//! pre-baked thumbnails. The chapter page sits next to the directory as
//! `<dir>.xhtml`.

/// Prefix shared by every album entry
pub const ROOT: &str = "EPUB";

/// Top-level album metadata document
pub const ALBUM_METADATA: &str = "EPUB/album.xml";

/// Shared stylesheet used by every content page
pub const STYLESHEET: &str = "EPUB/style.css";

/// Preface page file name (relative to `EPUB/`)
pub const PREFACE_PAGE: &str = "title.xhtml";

/// Name of the per-chapter thumbnail directory
pub const THUMBS_DIR: &str = "thumbs";

/// Path of an entry given relative to `EPUB/`
#[must_use]
pub fn content(relative: &str) -> String {
    format!("{ROOT}/{relative}")
}

/// `EPUB/<dir>/chapter.xml`
#[must_use]
pub fn chapter_metadata(directory: &str) -> String {
    format!("{ROOT}/{directory}/chapter.xml")
}

/// `EPUB/<dir>/<file>`
#[must_use]
pub fn photo(directory: &str, file_name: &str) -> String {
    format!("{ROOT}/{directory}/{file_name}")
}

/// `EPUB/<dir>/thumbs/<file>`
#[must_use]
pub fn photo_thumbnail(directory: &str, file_name: &str) -> String {
    format!("{ROOT}/{directory}/{THUMBS_DIR}/{file_name}")
}

/// Page file name for a chapter directory
#[must_use]
pub fn chapter_page(directory: &str) -> String {
    format!("{directory}.xhtml")
}

/// Whether `name` is a single path component safe to join onto a directory
///
/// Chapter directories and photo file names come from the album documents and
/// end up in extraction-cache paths, so separators, dot segments, drive
/// prefixes and control characters are refused.
#[must_use]
pub fn is_plain_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', ':'])
        && !name.chars().any(char::is_control)
}
