//! Upstream page fetching: the ranking page and per-article contents.

use std::time::Duration;

use async_trait::async_trait;
use backoff::{backoff::Backoff, ExponentialBackoff};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error, warn};

use crate::error::ScrapeError;

/// Source of the ranking page and article bodies.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// HTML of the page holding the ranking tables.
    async fn fetch_ranking_page(&self) -> Result<String, ScrapeError>;

    /// Rendered HTML of the article named `title`.
    async fn fetch_contents(&self, title: &str) -> Result<String, ScrapeError>;
}

/// Configuration for [`WikiFetcher`].
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Page holding the ranking tables
    pub ranking_url: String,

    /// MediaWiki API endpoint (e.g., "https://en.wikipedia.org/w/api.php")
    pub api_url: String,

    pub user_agent: String,

    /// Request timeout
    pub timeout: Duration,

    /// Retries after the first attempt; 0 disables retrying
    pub max_retries: u32,
}

impl FetcherConfig {
    /// Config for English Wikipedia.
    pub fn wikipedia(user_agent: impl Into<String>) -> Self {
        Self {
            ranking_url:
                "https://en.wikipedia.org/wiki/Wikipedia:Multiyear_ranking_of_most_viewed_pages"
                    .to_string(),
            api_url: "https://en.wikipedia.org/w/api.php".to_string(),
            user_agent: user_agent.into(),
            timeout: Duration::from_secs(30),
            max_retries: 3,
        }
    }
}

#[derive(Deserialize)]
struct ParseResponse {
    parse: Option<ParsedPage>,
    error: Option<ApiError>,
}

#[derive(Deserialize)]
struct ParsedPage {
    text: ParsedText,
}

#[derive(Deserialize)]
struct ParsedText {
    #[serde(rename = "*")]
    html: String,
}

#[derive(Deserialize)]
struct ApiError {
    code: String,
    #[serde(default)]
    info: String,
}

/// Fetches from a MediaWiki site over HTTP.
pub struct WikiFetcher {
    client: Client,
    config: FetcherConfig,
}

impl WikiFetcher {
    pub fn new(config: FetcherConfig) -> Result<Self, ScrapeError> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()
            .map_err(|e| ScrapeError::Config(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// GET with retry on transport errors, 429 and 5xx.
    async fn get_with_retry(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<String, ScrapeError> {
        let mut backoff = ExponentialBackoff {
            max_elapsed_time: Some(Duration::from_secs(120)),
            ..Default::default()
        };

        let mut attempts = 0;

        loop {
            attempts += 1;
            debug!(url, attempt = attempts, "Fetching");

            match self.get_once(url, query).await {
                Ok(body) => return Ok(body),
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) => {
                    if attempts > self.config.max_retries {
                        error!(url, error = %e, "Max retries exceeded");
                        return Err(e);
                    }

                    match backoff.next_backoff() {
                        Some(duration) => {
                            warn!(
                                url,
                                error = %e,
                                retry_in_ms = duration.as_millis() as u64,
                                "Fetch failed, retrying"
                            );
                            tokio::time::sleep(duration).await;
                        }
                        None => {
                            error!(url, error = %e, "Backoff exhausted");
                            return Err(e);
                        }
                    }
                }
            }
        }
    }

    async fn get_once(&self, url: &str, query: &[(&str, &str)]) -> Result<String, ScrapeError> {
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| ScrapeError::Request(e.to_string()))?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(ScrapeError::RateLimitExceeded);
        }
        if !status.is_success() {
            return Err(ScrapeError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| ScrapeError::Request(e.to_string()))
    }
}

/// Pull the article HTML out of a `action=parse` response body.
fn parse_contents(title: &str, body: &str) -> Result<String, ScrapeError> {
    let response: ParseResponse = serde_json::from_str(body)
        .map_err(|e| ScrapeError::Parse(format!("parse response for '{}': {}", title, e)))?;

    if let Some(err) = response.error {
        return Err(ScrapeError::Api {
            title: title.to_string(),
            code: err.code,
            info: err.info,
        });
    }

    response
        .parse
        .map(|page| page.text.html)
        .ok_or_else(|| ScrapeError::Parse(format!("no parse.text in response for '{}'", title)))
}

#[async_trait]
impl ContentSource for WikiFetcher {
    async fn fetch_ranking_page(&self) -> Result<String, ScrapeError> {
        self.get_with_retry(&self.config.ranking_url, &[]).await
    }

    async fn fetch_contents(&self, title: &str) -> Result<String, ScrapeError> {
        let query = [("action", "parse"), ("page", title), ("format", "json")];
        let body = self.get_with_retry(&self.config.api_url, &query).await?;
        parse_contents(title, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher(server: &MockServer) -> WikiFetcher {
        WikiFetcher::new(FetcherConfig {
            ranking_url: format!("{}/wiki/Ranking", server.uri()),
            api_url: format!("{}/w/api.php", server.uri()),
            user_agent: "wikis-test/0.1".to_string(),
            timeout: Duration::from_secs(5),
            max_retries: 3,
        })
        .unwrap()
    }

    #[test]
    fn test_parse_contents() {
        let body = r#"{"parse":{"title":"India","pageid":1,"text":{"*":"<div>India</div>"}}}"#;
        assert_eq!(parse_contents("India", body).unwrap(), "<div>India</div>");
    }

    #[test]
    fn test_parse_contents_api_error() {
        let body = r#"{"error":{"code":"missingtitle","info":"The page you specified doesn't exist."}}"#;
        let err = parse_contents("Nope", body).unwrap_err();
        match err {
            ScrapeError::Api { title, code, .. } => {
                assert_eq!(title, "Nope");
                assert_eq!(code, "missingtitle");
            }
            other => panic!("Expected Api error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_contents_malformed() {
        assert!(matches!(
            parse_contents("X", "{}"),
            Err(ScrapeError::Parse(_))
        ));
        assert!(matches!(
            parse_contents("X", "not json"),
            Err(ScrapeError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn test_fetch_contents_sends_parse_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/w/api.php"))
            .and(query_param("action", "parse"))
            .and(query_param("page", "Taylor Swift"))
            .and(query_param("format", "json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "parse": { "title": "Taylor Swift", "text": { "*": "<p>Swift</p>" } }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let html = fetcher(&server).fetch_contents("Taylor Swift").await.unwrap();
        assert_eq!(html, "<p>Swift</p>");
    }

    #[tokio::test]
    async fn test_fetch_ranking_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/wiki/Ranking"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<table></table>"))
            .mount(&server)
            .await;

        let html = fetcher(&server).fetch_ranking_page().await.unwrap();
        assert_eq!(html, "<table></table>");
    }

    #[tokio::test]
    async fn test_not_found_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/wiki/Ranking"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let err = fetcher(&server).fetch_ranking_page().await.unwrap_err();
        assert!(matches!(err, ScrapeError::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_server_error_retried_until_limit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/wiki/Ranking"))
            .respond_with(ResponseTemplate::new(503))
            .expect(4)
            .mount(&server)
            .await;

        // First attempt plus three retries
        let err = fetcher(&server).fetch_ranking_page().await.unwrap_err();
        assert!(matches!(err, ScrapeError::Status { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_zero_retries_makes_single_attempt() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/wiki/Ranking"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let mut config = FetcherConfig::wikipedia("wikis-test/0.1");
        config.ranking_url = format!("{}/wiki/Ranking", server.uri());
        config.max_retries = 0;

        let err = WikiFetcher::new(config)
            .unwrap()
            .fetch_ranking_page()
            .await
            .unwrap_err();
        assert!(matches!(err, ScrapeError::Status { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_rate_limit_then_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/wiki/Ranking"))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/wiki/Ranking"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<table></table>"))
            .expect(1)
            .mount(&server)
            .await;

        let html = fetcher(&server).fetch_ranking_page().await.unwrap();
        assert_eq!(html, "<table></table>");
    }
}
