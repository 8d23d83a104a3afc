//! Search queries and their predicates
//!
//! A [`SearchQuery`] is the user-facing description; a [`QueryMatcher`] is the
//! normalized, lower-cased form the engine evaluates. Every substring is
//! matched case-insensitively and an empty substring matches anything.

use super::SearchError;
use crate::metadata::parse_date;
use crate::model::{Chapter, IndexRecord, Paragraph};
use chrono::NaiveDate;
use serde::Serialize;

/// Search parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchQuery {
    pub begin: NaiveDate,
    pub end: NaiveDate,
    pub title: String,
    pub author: String,
    pub location: String,
    pub text: String,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            begin: NaiveDate::MIN,
            end: NaiveDate::MAX,
            title: String::new(),
            author: String::new(),
            location: String::new(),
            text: String::new(),
        }
    }
}

impl SearchQuery {
    /// A query that matches everything
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn between(mut self, begin: NaiveDate, end: NaiveDate) -> Self {
        self.begin = begin;
        self.end = end;
        self
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    #[must_use]
    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    #[must_use]
    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Trim every substring and clamp `end` up to `begin` when it is earlier
    #[must_use]
    pub fn normalized(&self) -> Self {
        Self {
            begin: self.begin,
            end: self.end.max(self.begin),
            title: self.title.trim().to_string(),
            author: self.author.trim().to_string(),
            location: self.location.trim().to_string(),
            text: self.text.trim().to_string(),
        }
    }
}

/// Parse a date bound given on the command line
///
/// # Errors
///
/// Returns `SearchError::InvalidDate` if `value` is not a date.
pub fn parse_date_bound(value: &str) -> Result<NaiveDate, SearchError> {
    parse_date(value).ok_or_else(|| SearchError::InvalidDate(value.to_string()))
}

/// Compiled predicates of a query
#[derive(Debug, Clone)]
pub struct QueryMatcher {
    begin: NaiveDate,
    end: NaiveDate,
    title: Option<String>,
    author: Option<String>,
    location: Option<String>,
    text: Option<String>,
}

fn needle(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_lowercase())
}

fn contains(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

impl QueryMatcher {
    #[must_use]
    pub fn new(query: &SearchQuery) -> Self {
        let query = query.normalized();
        Self {
            begin: query.begin,
            end: query.end,
            title: needle(&query.title),
            author: needle(&query.author),
            location: needle(&query.location),
            text: needle(&query.text),
        }
    }

    /// Stage 1: cheap filtering over the index record
    #[must_use]
    pub fn is_candidate(&self, record: &IndexRecord) -> bool {
        record.overlaps(self.begin, self.end)
            && self.title.as_deref().is_none_or(|t| contains(&record.title, t))
            && self.author.as_deref().is_none_or(|a| contains(&record.author, a))
    }

    /// Whether a real chapter's title matches the text, selecting all of its
    /// paragraphs regardless of their own predicates
    #[must_use]
    pub fn selects_whole_chapter(&self, chapter: &Chapter) -> bool {
        chapter.is_chapter
            && self
                .text
                .as_deref()
                .is_some_and(|text| contains(&chapter.title, text))
    }

    /// Stage 2: date, location and text predicates of one paragraph
    #[must_use]
    pub fn matches_paragraph(&self, paragraph: &Paragraph) -> bool {
        self.date_matches(paragraph) && self.location_matches(paragraph) && self.text_matches(paragraph)
    }

    fn date_matches(&self, paragraph: &Paragraph) -> bool {
        paragraph
            .visible_date()
            .is_none_or(|date| self.begin <= date && date <= self.end)
    }

    fn location_matches(&self, paragraph: &Paragraph) -> bool {
        self.location.as_deref().is_none_or(|location| {
            paragraph
                .visible_location()
                .is_some_and(|visible| contains(visible, location))
        })
    }

    fn text_matches(&self, paragraph: &Paragraph) -> bool {
        self.text.as_deref().is_none_or(|text| {
            (!paragraph.context.is_empty() && contains(&paragraph.context, text))
                || paragraph.title.as_deref().is_some_and(|title| contains(title, text))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(title: &str, author: &str, first: NaiveDate, last: NaiveDate) -> IndexRecord {
        let mut record = IndexRecord::new("x.album.epub", 1, first);
        record.title = title.into();
        record.author = author.into();
        record.last_date = last;
        record
    }

    fn paragraph(context: &str) -> Paragraph {
        Paragraph {
            context: context.into(),
            ..Paragraph::default()
        }
    }

    #[test]
    fn test_normalized_trims_and_clamps() {
        let query = SearchQuery::new()
            .between(date(2024, 5, 10), date(2024, 5, 1))
            .title("  Kyoto ")
            .text("\ttemple\n");
        let normalized = query.normalized();
        assert_eq!(normalized.end, date(2024, 5, 10));
        assert_eq!(normalized.title, "Kyoto");
        assert_eq!(normalized.text, "temple");
    }

    #[test]
    fn test_stage_one_filters_on_dates_title_and_author() {
        let matcher = QueryMatcher::new(
            &SearchQuery::new()
                .between(date(2024, 5, 1), date(2024, 5, 31))
                .title("kyoto")
                .author("MEI"),
        );

        assert!(matcher.is_candidate(&record("Kyoto Spring", "Mei", date(2024, 4, 28), date(2024, 5, 2))));
        assert!(!matcher.is_candidate(&record("Kyoto Spring", "Mei", date(2024, 6, 1), date(2024, 6, 2))));
        assert!(!matcher.is_candidate(&record("Osaka", "Mei", date(2024, 5, 1), date(2024, 5, 2))));
        assert!(!matcher.is_candidate(&record("Kyoto", "Jun", date(2024, 5, 1), date(2024, 5, 2))));
    }

    #[test]
    fn test_hidden_date_is_not_filtered() {
        let matcher = QueryMatcher::new(&SearchQuery::new().between(date(2024, 5, 1), date(2024, 5, 2)));
        let mut p = paragraph("x");
        p.date = Some(date(2020, 1, 1));
        assert!(matcher.matches_paragraph(&p));

        p.date_visible = true;
        assert!(!matcher.matches_paragraph(&p));

        p.date = Some(date(2024, 5, 2));
        assert!(matcher.matches_paragraph(&p));
    }

    #[test]
    fn test_location_requires_visible_match() {
        let matcher = QueryMatcher::new(&SearchQuery::new().location("fushimi"));
        let mut p = paragraph("x");
        assert!(!matcher.matches_paragraph(&p));

        p.location = Some("Fushimi Inari".into());
        assert!(!matcher.matches_paragraph(&p));

        p.location_visible = true;
        assert!(matcher.matches_paragraph(&p));
    }

    #[test]
    fn test_text_matches_context_or_title() {
        let matcher = QueryMatcher::new(&SearchQuery::new().text("Shrine"));
        assert!(matcher.matches_paragraph(&paragraph("walked to the shrine")));
        assert!(!matcher.matches_paragraph(&paragraph("lunch")));

        let mut titled = paragraph("");
        titled.title = Some("Shrine visit".into());
        assert!(matcher.matches_paragraph(&titled));

        titled.title = Some("Lunch".into());
        assert!(!matcher.matches_paragraph(&titled));
    }

    #[test]
    fn test_chapter_title_selection() {
        let matcher = QueryMatcher::new(&SearchQuery::new().text("temple"));
        assert!(matcher.selects_whole_chapter(&Chapter::new("d2", "Temples day")));
        assert!(!matcher.selects_whole_chapter(&Chapter::new("d3", "Markets")));

        let mut preface = Chapter::preface();
        preface.title = "Temple preface".into();
        assert!(!matcher.selects_whole_chapter(&preface));

        let empty = QueryMatcher::new(&SearchQuery::new());
        assert!(!empty.selects_whole_chapter(&Chapter::new("d2", "Temples day")));
    }

    #[test]
    fn test_empty_query_matches_everything() {
        let matcher = QueryMatcher::new(&SearchQuery::new());
        assert!(matcher.matches_paragraph(&Paragraph::default()));
        assert!(matcher.is_candidate(&record("", "", date(1900, 1, 1), date(1900, 1, 1))));
    }

    #[test]
    fn test_parse_date_bound() {
        assert_eq!(parse_date_bound("2024-05-07").unwrap(), date(2024, 5, 7));
        assert!(matches!(parse_date_bound("tomorrow"), Err(SearchError::InvalidDate(_))));
    }
}
