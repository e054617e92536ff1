//! Bootstrap E2E tests for the wikis loader.
//!
//! Drives the controller exactly as the binary wires it, against mock index
//! store and wiki servers, and checks what the store received.

use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, ResponseTemplate};

use e2e_tests::{ranking_page, title_for, TestHarness, INDEX, REPOSITORY, SNAPSHOT};
use wikis_indexing::{BootstrapError, BootstrapOutcome, IngestCheckpoint};
use wikis_store::StoreError;
use wikis_types::{document_id, Category};

fn restore_path() -> String {
    format!("/_snapshot/{}/{}/_restore", REPOSITORY, SNAPSHOT)
}

/// First start: empty marker directory, so the index is created, loaded
/// and snapshotted in that order.
#[tokio::test]
async fn test_first_run_ingests_and_snapshots() {
    let harness = TestHarness::new().await;
    harness.mount_wiki(ranking_page(3)).await;
    harness.mount_store_writes(30).await;
    harness
        .mount_status_sequence(&[None, Some("IN_PROGRESS"), Some("SUCCESS")])
        .await;

    let settings = harness.settings();
    let outcome = harness
        .controller(&settings)
        .ensure_index_ready()
        .await
        .unwrap();
    assert_eq!(outcome, BootstrapOutcome::Ingested { documents: 30 });

    let requests = harness.store_requests().await;
    let create = requests
        .iter()
        .position(|r| r == &("PUT".to_string(), format!("/{}", INDEX)))
        .unwrap();
    let first_doc = requests
        .iter()
        .position(|(m, p)| m == "PUT" && p.contains("/_doc/"))
        .unwrap();
    let last_doc = requests
        .iter()
        .rposition(|(m, p)| m == "PUT" && p.contains("/_doc/"))
        .unwrap();
    let register = requests
        .iter()
        .position(|r| r == &("PUT".to_string(), format!("/_snapshot/{}", REPOSITORY)))
        .unwrap();
    let snapshot = requests
        .iter()
        .position(|r| {
            r == &(
                "PUT".to_string(),
                format!("/_snapshot/{}/{}", REPOSITORY, SNAPSHOT),
            )
        })
        .unwrap();

    assert_eq!(create, 0);
    assert!(create < first_doc);
    assert!(last_doc < register);
    assert!(register < snapshot);

    let polls = requests.iter().filter(|(_, p)| p.ends_with("/_status")).count();
    assert_eq!(polls, 3);
    assert!(!requests.iter().any(|(_, p)| p == &restore_path()));
    assert!(!harness.checkpoint_path().exists());
}

#[tokio::test]
async fn test_documents_carry_list_label_and_contents() {
    let harness = TestHarness::new().await;
    harness.mount_wiki(ranking_page(1)).await;

    let id = document_id(Category::ModernPoliticalLeaders, 1);
    let title = title_for(Category::ModernPoliticalLeaders, 1);
    Mock::given(method("PUT"))
        .and(path(format!("/{}/_doc/{}", INDEX, id)))
        .and(body_partial_json(json!({
            "rank": 1,
            "title": title,
            "link": "/wiki/Modern_Political_Leaders_1",
            "list": "Modern Political Leaders",
            "contents": "<div class=\"mw-parser-output\"><p>Modern Political Leaders 1</p></div>"
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&harness.es)
        .await;
    harness.mount_store_writes(9).await;
    harness.mount_status_sequence(&[Some("SUCCESS")]).await;

    let settings = harness.settings();
    let outcome = harness
        .controller(&settings)
        .ensure_index_ready()
        .await
        .unwrap();
    assert_eq!(outcome, BootstrapOutcome::Ingested { documents: 10 });
}

/// Later start: snapshot artifacts exist, so only restore runs.
#[tokio::test]
async fn test_restart_restores_without_ingest() {
    let harness = TestHarness::new().await;
    harness.add_snapshot_artifact();
    harness.mount_repository().await;
    Mock::given(method("POST"))
        .and(path(restore_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"accepted": true})))
        .expect(1)
        .mount(&harness.es)
        .await;

    let settings = harness.settings();
    let outcome = harness
        .controller(&settings)
        .ensure_index_ready()
        .await
        .unwrap();
    assert_eq!(outcome, BootstrapOutcome::Restored);

    let requests = harness.store_requests().await;
    assert_eq!(
        requests,
        vec![
            ("PUT".to_string(), format!("/_snapshot/{}", REPOSITORY)),
            ("POST".to_string(), restore_path()),
        ]
    );
    let wiki_requests = harness.wiki.received_requests().await.unwrap_or_default();
    assert!(wiki_requests.is_empty());
}

#[tokio::test]
async fn test_restore_onto_open_index_succeeds() {
    let harness = TestHarness::new().await;
    harness.add_snapshot_artifact();
    harness.mount_repository().await;
    Mock::given(method("POST"))
        .and(path(restore_path()))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": {
                "type": "snapshot_restore_exception",
                "reason": "[wikisrepo:wikis/kP3f] cannot restore index [wikis] because an open index with same name already exists in the cluster. Either close or delete the existing index or restore the index under a different name by providing a rename pattern and replacement name"
            },
            "status": 500
        })))
        .expect(1)
        .mount(&harness.es)
        .await;

    let settings = harness.settings();
    let outcome = harness
        .controller(&settings)
        .ensure_index_ready()
        .await
        .unwrap();
    assert_eq!(outcome, BootstrapOutcome::AlreadyPresent);
}

#[tokio::test]
async fn test_other_restore_failure_propagates() {
    let harness = TestHarness::new().await;
    harness.add_snapshot_artifact();
    harness.mount_repository().await;
    Mock::given(method("POST"))
        .and(path(restore_path()))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {
                "type": "snapshot_missing_exception",
                "reason": "[wikisrepo:wikis] is missing"
            },
            "status": 404
        })))
        .expect(1)
        .mount(&harness.es)
        .await;

    let settings = harness.settings();
    let err = harness
        .controller(&settings)
        .ensure_index_ready()
        .await
        .unwrap_err();

    match err {
        BootstrapError::Store(StoreError::Api {
            status, error_type, ..
        }) => {
            assert_eq!(status, 404);
            assert_eq!(error_type, "snapshot_missing_exception");
        }
        other => panic!("Expected store API error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_snapshot_wait_times_out() {
    let harness = TestHarness::new().await;
    harness.mount_wiki(ranking_page(1)).await;
    harness.mount_store_writes(10).await;
    harness.mount_status_sequence(&[Some("IN_PROGRESS")]).await;

    let mut settings = harness.settings();
    settings.snapshot_timeout_secs = 1;
    let err = harness
        .controller(&settings)
        .ensure_index_ready()
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        BootstrapError::Store(StoreError::SnapshotTimeout { .. })
    ));
    // Progress is kept so the next start can resume
    assert!(harness.checkpoint_path().exists());
}

#[tokio::test]
async fn test_failed_snapshot_stops_polling() {
    let harness = TestHarness::new().await;
    harness.mount_wiki(ranking_page(1)).await;
    harness.mount_store_writes(10).await;
    harness
        .mount_status_sequence(&[Some("STARTED"), Some("FAILED")])
        .await;

    let settings = harness.settings();
    let err = harness
        .controller(&settings)
        .ensure_index_ready()
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        BootstrapError::Store(StoreError::SnapshotFailed { .. })
    ));
    let polls = harness
        .store_requests()
        .await
        .iter()
        .filter(|(_, p)| p.ends_with("/_status"))
        .count();
    assert_eq!(polls, 2);
}

/// A crashed ingest left a checkpoint and a half-filled index; the next
/// start tolerates the existing index and fetches only what is missing.
#[tokio::test]
async fn test_resume_after_crash_skips_completed_documents() {
    let harness = TestHarness::new().await;
    harness.mount_wiki(ranking_page(2)).await;

    let mut checkpoint = IngestCheckpoint::new(INDEX);
    for category in [Category::Top100, Category::Countries] {
        checkpoint.record(document_id(category, 1));
        checkpoint.record(document_id(category, 2));
    }
    checkpoint.save(&harness.checkpoint_path()).unwrap();

    Mock::given(method("PUT"))
        .and(path(format!("/{}", INDEX)))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {
                "type": "resource_already_exists_exception",
                "reason": "index [wikis/Qm1] already exists"
            },
            "status": 400
        })))
        .expect(1)
        .mount(&harness.es)
        .await;
    Mock::given(method("PUT"))
        .and(wiremock::matchers::path_regex(r"^/wikis/_doc/[a-z0-9-]+$"))
        .respond_with(ResponseTemplate::new(201))
        .expect(16)
        .mount(&harness.es)
        .await;
    harness.mount_repository().await;
    Mock::given(method("PUT"))
        .and(path(format!("/_snapshot/{}/{}", REPOSITORY, SNAPSHOT)))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&harness.es)
        .await;
    harness.mount_status_sequence(&[Some("SUCCESS")]).await;

    let settings = harness.settings();
    let outcome = harness
        .controller(&settings)
        .ensure_index_ready()
        .await
        .unwrap();
    assert_eq!(outcome, BootstrapOutcome::Ingested { documents: 20 });

    let fetched: Vec<String> = harness
        .wiki
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter_map(|r| {
            r.url
                .query_pairs()
                .find(|(k, _)| k == "page")
                .map(|(_, v)| v.into_owned())
        })
        .collect();
    assert_eq!(fetched.len(), 16);
    assert!(!fetched.contains(&title_for(Category::Countries, 2)));
    assert!(fetched.contains(&title_for(Category::Cities, 1)));
    assert!(!harness.checkpoint_path().exists());
}

#[tokio::test]
async fn test_existing_index_without_checkpoint_is_fatal() {
    let harness = TestHarness::new().await;
    Mock::given(method("PUT"))
        .and(path(format!("/{}", INDEX)))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {
                "type": "resource_already_exists_exception",
                "reason": "index [wikis/Qm1] already exists"
            },
            "status": 400
        })))
        .expect(1)
        .mount(&harness.es)
        .await;

    let settings = harness.settings();
    let err = harness
        .controller(&settings)
        .ensure_index_ready()
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        BootstrapError::Store(StoreError::IndexAlreadyExists(_))
    ));
    let wiki_requests = harness.wiki.received_requests().await.unwrap_or_default();
    assert!(wiki_requests.is_empty());
}

#[tokio::test]
async fn test_missing_article_aborts_ingest() {
    let harness = TestHarness::new().await;
    Mock::given(method("GET"))
        .and(path(e2e_tests::RANKING_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(ranking_page(1)))
        .mount(&harness.wiki)
        .await;
    Mock::given(method("GET"))
        .and(path(e2e_tests::API_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": {"code": "missingtitle", "info": "The page you specified doesn't exist."}
        })))
        .mount(&harness.wiki)
        .await;
    Mock::given(method("PUT"))
        .and(path(format!("/{}", INDEX)))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&harness.es)
        .await;

    let settings = harness.settings();
    let err = harness
        .controller(&settings)
        .ensure_index_ready()
        .await
        .unwrap_err();

    assert!(matches!(err, BootstrapError::Scrape(_)));
    let snapshots = harness
        .store_requests()
        .await
        .iter()
        .filter(|(_, p)| p.starts_with("/_snapshot"))
        .count();
    assert_eq!(snapshots, 0);
    assert!(harness.checkpoint_path().exists());
}
