//! Scrape error types.

use thiserror::Error;

/// Errors that can occur while fetching or parsing upstream pages.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// HTTP request failed before a response arrived
    #[error("Request failed: {0}")]
    Request(String),

    /// Upstream answered with a non-success status
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// The page-content API reported an error for a title
    #[error("API error for '{title}': {code}: {info}")]
    Api {
        title: String,
        code: String,
        info: String,
    },

    /// Response or page did not have the expected shape
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// The ranking page has fewer tables than there are categories
    #[error("Ranking page has {found} tables, expected at least {expected}")]
    MissingTable { expected: usize, found: usize },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl ScrapeError {
    /// Whether retrying the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ScrapeError::Request(_) | ScrapeError::RateLimitExceeded => true,
            ScrapeError::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }
}
