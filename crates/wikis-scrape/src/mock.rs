//! Mock content source for testing.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::ScrapeError;
use crate::fetcher::ContentSource;

/// Content source serving a fixed ranking page and generated article bodies.
///
/// Article bodies default to `<p>{title}</p>` unless overridden. Every
/// fetched title is recorded.
pub struct MockContentSource {
    ranking_page: String,
    contents: HashMap<String, String>,
    missing: Vec<String>,
    fetched: Mutex<Vec<String>>,
    ranking_fetches: Mutex<usize>,
}

impl MockContentSource {
    pub fn new(ranking_page: impl Into<String>) -> Self {
        Self {
            ranking_page: ranking_page.into(),
            contents: HashMap::new(),
            missing: Vec::new(),
            fetched: Mutex::new(Vec::new()),
            ranking_fetches: Mutex::new(0),
        }
    }

    /// Serve `html` for `title`.
    pub fn with_contents(mut self, title: &str, html: &str) -> Self {
        self.contents.insert(title.to_string(), html.to_string());
        self
    }

    /// Answer `title` with a missing-page API error.
    pub fn with_missing(mut self, title: &str) -> Self {
        self.missing.push(title.to_string());
        self
    }

    /// Titles whose contents were fetched, in order.
    pub fn fetched_titles(&self) -> Vec<String> {
        self.fetched
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn ranking_fetches(&self) -> usize {
        *self.ranking_fetches.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl ContentSource for MockContentSource {
    async fn fetch_ranking_page(&self) -> Result<String, ScrapeError> {
        *self.ranking_fetches.lock().unwrap_or_else(|e| e.into_inner()) += 1;
        Ok(self.ranking_page.clone())
    }

    async fn fetch_contents(&self, title: &str) -> Result<String, ScrapeError> {
        self.fetched
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(title.to_string());

        if self.missing.iter().any(|t| t == title) {
            return Err(ScrapeError::Api {
                title: title.to_string(),
                code: "missingtitle".to_string(),
                info: "The page you specified doesn't exist.".to_string(),
            });
        }

        Ok(self
            .contents
            .get(title)
            .cloned()
            .unwrap_or_else(|| format!("<p>{}</p>", title)))
    }
}
