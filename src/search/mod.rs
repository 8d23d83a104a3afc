//! Content search over an album index
//!
//! Filters index records cheaply first, then deep-parses the surviving
//! candidates and streams matching paragraphs with progress reports.

pub mod engine;
pub mod error;
pub mod query;

pub use engine::{SearchEngine, SearchEvent, SearchObserver, SearchProgress, SearchSummary};
pub use error::SearchError;
pub use query::{QueryMatcher, SearchQuery, parse_date_bound};
