//! End-to-end test infrastructure for the wikis loader.
//!
//! Provides a shared TestHarness that stands up mock index store and wiki
//! servers, plus fixtures for the ranking page.

use std::path::PathBuf;

use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use wikis_indexing::{BootstrapController, CHECKPOINT_FILE};
use wikis_types::{Category, Settings};

pub const RANKING_PATH: &str = "/wiki/Most_viewed";
pub const API_PATH: &str = "/w/api.php";
pub const INDEX: &str = "wikis";
pub const REPOSITORY: &str = "wikisrepo";
pub const SNAPSHOT: &str = "wikis";

/// Shared test harness for E2E tests.
///
/// Holds temp marker and state directories plus one mock server for the
/// index store and one for the wiki.
pub struct TestHarness {
    pub marker_dir: TempDir,
    pub state_dir: TempDir,
    pub es: MockServer,
    pub wiki: MockServer,
}

impl TestHarness {
    pub async fn new() -> Self {
        Self {
            marker_dir: TempDir::new().expect("Failed to create marker dir"),
            state_dir: TempDir::new().expect("Failed to create state dir"),
            es: MockServer::start().await,
            wiki: MockServer::start().await,
        }
    }

    /// Settings pointing at the mock servers, with fast snapshot polling.
    pub fn settings(&self) -> Settings {
        Settings {
            es_url: self.es.uri(),
            ranking_url: format!("{}{}", self.wiki.uri(), RANKING_PATH),
            wiki_api_url: format!("{}{}", self.wiki.uri(), API_PATH),
            marker_dir: self.marker_dir.path().to_string_lossy().into_owned(),
            state_dir: self.state_dir.path().to_string_lossy().into_owned(),
            poll_interval_ms: 10,
            max_poll_interval_ms: 20,
            request_timeout_secs: 5,
            ..Settings::default()
        }
    }

    /// Controller wired exactly as the binary wires it.
    pub fn controller(&self, settings: &Settings) -> BootstrapController {
        wikis_loader::build_controller(settings).expect("Failed to build controller")
    }

    pub fn checkpoint_path(&self) -> PathBuf {
        self.state_dir.path().join(CHECKPOINT_FILE)
    }

    /// Leave a file in the marker directory as a previous snapshot would.
    pub fn add_snapshot_artifact(&self) {
        std::fs::write(self.marker_dir.path().join("index-0"), b"")
            .expect("Failed to write snapshot artifact");
    }

    /// Serve `page` as the ranking page and answer every parse request.
    pub async fn mount_wiki(&self, page: String) {
        Mock::given(method("GET"))
            .and(path(RANKING_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string(page))
            .mount(&self.wiki)
            .await;

        Mock::given(method("GET"))
            .and(path(API_PATH))
            .respond_with(|request: &Request| {
                let title = request
                    .url
                    .query_pairs()
                    .find(|(k, _)| k == "page")
                    .map(|(_, v)| v.into_owned())
                    .unwrap_or_default();
                ResponseTemplate::new(200).set_body_json(parse_response(&title))
            })
            .mount(&self.wiki)
            .await;
    }

    /// Accept index creation, document writes and repository registration.
    pub async fn mount_store_writes(&self, expected_documents: u64) {
        Mock::given(method("PUT"))
            .and(path(format!("/{}", INDEX)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"acknowledged": true})))
            .expect(1)
            .mount(&self.es)
            .await;

        Mock::given(method("PUT"))
            .and(path_regex(format!("^/{}/_doc/[a-z0-9-]+$", INDEX)))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"result": "created"})))
            .expect(expected_documents)
            .mount(&self.es)
            .await;

        self.mount_repository().await;

        Mock::given(method("PUT"))
            .and(path(format!("/_snapshot/{}/{}", REPOSITORY, SNAPSHOT)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"accepted": true})))
            .expect(1)
            .mount(&self.es)
            .await;
    }

    pub async fn mount_repository(&self) {
        Mock::given(method("PUT"))
            .and(path(format!("/_snapshot/{}", REPOSITORY)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"acknowledged": true})))
            .expect(1)
            .mount(&self.es)
            .await;
    }

    /// Answer status polls with `states`, one per poll, the last repeating.
    /// `None` answers with an empty snapshot list.
    pub async fn mount_status_sequence(&self, states: &[Option<&str>]) {
        let status_path = format!("/_snapshot/{}/{}/_status", REPOSITORY, SNAPSHOT);
        for (i, state) in states.iter().enumerate() {
            let body = match state {
                Some(state) => json!({"snapshots": [{"snapshot": SNAPSHOT, "state": state}]}),
                None => json!({"snapshots": []}),
            };
            let mock = Mock::given(method("GET"))
                .and(path(status_path.clone()))
                .respond_with(ResponseTemplate::new(200).set_body_json(body));
            let mock = if i + 1 < states.len() {
                mock.up_to_n_times(1)
            } else {
                mock
            };
            mock.mount(&self.es).await;
        }
    }

    /// (method, path) of every request the store received, in order.
    pub async fn store_requests(&self) -> Vec<(String, String)> {
        self.es
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .map(|r| (r.method.as_str().to_string(), r.url.path().to_string()))
            .collect()
    }
}

/// Article title used for `rank` in `category` by [`ranking_page`].
pub fn title_for(category: Category, rank: u32) -> String {
    format!("{} {}", category.label(), rank)
}

/// Ranking page with ten tables of `rows` ranked entries each.
///
/// Every table also carries a footnote row that must be skipped.
pub fn ranking_page(rows: u32) -> String {
    let mut html = String::from("<html><body><h1>Most viewed</h1>");
    for category in Category::ALL {
        html.push_str("<table class=\"wikitable\"><tr><th>Rank</th><th>Article</th><th>Views</th></tr>");
        for rank in 1..=rows {
            let title = title_for(category, rank);
            html.push_str(&format!(
                "<tr><td>{}</td><td><a href=\"/wiki/{}\" title=\"{}\">{}</a></td><td>1,000</td></tr>",
                rank,
                title.replace(' ', "_"),
                title,
                title
            ));
        }
        html.push_str("<tr><td>Note</td><td colspan=\"2\">Main Page excluded</td></tr></table>");
    }
    html.push_str("</body></html>");
    html
}

/// `action=parse` response body for `title`.
pub fn parse_response(title: &str) -> serde_json::Value {
    json!({
        "parse": {
            "title": title,
            "text": { "*": format!("<div class=\"mw-parser-output\"><p>{}</p></div>", title) }
        }
    })
}
