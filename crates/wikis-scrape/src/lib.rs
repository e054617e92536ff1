//! Upstream scraping for the wikis loader.
//!
//! - [`ContentSource`]: the ranking page plus per-article contents
//! - [`WikiFetcher`]: MediaWiki implementation over reqwest with retry
//! - [`extract_entries`]: ranking tables to ordered per-category entries
//! - [`MockContentSource`]: canned source for tests

pub mod error;
pub mod extractor;
pub mod fetcher;
pub mod mock;

pub use error::ScrapeError;
pub use extractor::{extract_entries, CategoryTable};
pub use fetcher::{ContentSource, FetcherConfig, WikiFetcher};
pub use mock::MockContentSource;
