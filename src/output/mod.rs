//! Output formatting for CLI display
//!
//! Path display, album date ranges, human file sizes and the one-line
//! renderings of albums and search matches.

use crate::config::PathFormat;
use crate::index::ResolvedParagraph;
use crate::model::{IndexRecord, ParagraphRef};
use byte_unit::{Byte, UnitType};
use chrono::NaiveDate;
use colored::Colorize;
use serde::Serialize;
use std::path::Path;

/// Display format of album dates
pub const DISPLAY_DATE_FORMAT: &str = "%b %d, %Y";

/// Format a path according to the display mode
#[must_use]
pub fn format_path(path: &Path, format: PathFormat) -> String {
    match format {
        PathFormat::Absolute => path.display().to_string(),
        PathFormat::Relative => {
            if let Ok(cwd) = std::env::current_dir()
                && let Ok(rel_path) = path.strip_prefix(&cwd)
            {
                return rel_path.display().to_string();
            }
            // Fallback to absolute if relative path cannot be computed
            path.display().to_string()
        }
    }
}

/// `"May 07, 2024"`, or `"May 07, 2024 - May 09, 2024"` when the days differ
#[must_use]
pub fn date_range(first: NaiveDate, last: NaiveDate) -> String {
    let start = first.format(DISPLAY_DATE_FORMAT).to_string();
    if first == last {
        start
    } else {
        format!("{start} - {}", last.format(DISPLAY_DATE_FORMAT))
    }
}

/// File size with a binary unit, e.g. `"2.50 MiB"`
#[must_use]
pub fn human_size(bytes: u64) -> String {
    let adjusted = Byte::from_u64(bytes).get_appropriate_unit(UnitType::Binary);
    format!("{adjusted:.2}")
}

/// One-line summary of an indexed album
#[must_use]
pub fn album_line(record: &IndexRecord, quiet: bool) -> String {
    if quiet {
        return record.file_name.clone();
    }

    let mut line = format!(
        "  {}  {}  {}",
        record.title.bold(),
        date_range(record.first_date, record.last_date).cyan(),
        human_size(record.file_size).dimmed()
    );
    if !record.author.is_empty() {
        line.push_str(&format!("  by {}", record.author));
    }
    if !record.location.is_empty() {
        line.push_str(&format!("  @ {}", record.location.green()));
    }
    line.push_str(&format!("\n    {}", record.file_name.dimmed()));
    line
}

/// One-line rendering of a search match
#[must_use]
pub fn match_line(resolved: &ResolvedParagraph<'_>, quiet: bool) -> String {
    let paragraph = resolved.paragraph;
    let chapter = resolved.chapter;
    if quiet {
        return format!(
            "{}\t{}\t{}",
            resolved.record.file_name,
            chapter.title,
            paragraph.title.as_deref().unwrap_or_default()
        );
    }

    let heading = match paragraph.title.as_deref() {
        Some(title) if !title.is_empty() => format!("{} / {title}", chapter.title),
        _ => chapter.title.clone(),
    };
    let mut line = format!("  {}  {}", resolved.record.title.bold(), heading.yellow());
    if let Some(date) = paragraph.visible_date() {
        line.push_str(&format!("  {}", date.format(DISPLAY_DATE_FORMAT).to_string().cyan()));
    }
    if let Some(location) = paragraph.visible_location() {
        line.push_str(&format!("  @ {}", location.green()));
    }
    let context = excerpt(&paragraph.context, 80);
    if !context.is_empty() {
        line.push_str(&format!("\n    {}", context.dimmed()));
    }
    line
}

/// First `max_chars` characters of the first line of `text`
#[must_use]
pub fn excerpt(text: &str, max_chars: usize) -> String {
    let line = text.trim().lines().next().unwrap_or_default().trim();
    if line.chars().count() <= max_chars {
        return line.to_string();
    }
    let mut cut: String = line.chars().take(max_chars).collect();
    cut.push_str("...");
    cut
}

/// Search match as emitted by `search --json`
#[derive(Debug, Serialize)]
pub struct MatchJson<'a> {
    pub reference: String,
    pub file: &'a str,
    pub album: &'a str,
    pub chapter: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<&'a str>,
    pub context: &'a str,
    pub photos: Vec<&'a str>,
}

impl<'a> MatchJson<'a> {
    #[must_use]
    pub fn new(reference: ParagraphRef, resolved: &ResolvedParagraph<'a>) -> Self {
        let paragraph = resolved.paragraph;
        Self {
            reference: reference.to_string(),
            file: &resolved.record.file_name,
            album: &resolved.record.title,
            chapter: &resolved.chapter.title,
            title: paragraph.title.as_deref(),
            date: paragraph.visible_date(),
            location: paragraph.visible_location(),
            context: &paragraph.context,
            photos: paragraph.photos.iter().map(|p| p.file_name.as_str()).collect(),
        }
    }
}
