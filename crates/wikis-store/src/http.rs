//! HTTP implementation of [`IndexStore`] for Elasticsearch-compatible stores.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use wikis_types::{Document, SnapshotCompletion};

use crate::error::{classify_error, StoreError};
use crate::schema::IndexSchema;
use crate::store::IndexStore;

/// Configuration for the HTTP store client.
#[derive(Debug, Clone)]
pub struct HttpStoreConfig {
    /// Base URL (e.g., "http://elasticsearch:9200")
    pub base_url: String,

    /// Request timeout
    pub timeout: Duration,
}

impl HttpStoreConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Index store client over the store's REST API.
pub struct HttpIndexStore {
    client: Client,
    base_url: String,
}

#[derive(Deserialize)]
struct StatusResponse {
    #[serde(default)]
    snapshots: Vec<SnapshotStatusEntry>,
}

#[derive(Deserialize)]
struct SnapshotStatusEntry {
    #[serde(default)]
    state: Option<String>,
}

impl HttpIndexStore {
    /// Create a new client.
    pub fn new(config: HttpStoreConfig) -> Result<Self, StoreError> {
        if config.base_url.trim().is_empty() {
            return Err(StoreError::Config("base_url must not be empty".to_string()));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| StoreError::Config(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Pass successful responses through, turn the rest into typed errors.
    async fn check(response: Response) -> Result<Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let (error_type, reason) = parse_error_body(&body);
        Err(classify_error(status.as_u16(), &error_type, &reason))
    }
}

/// Pull `error.type` and `error.reason` out of a store error body.
fn parse_error_body(body: &str) -> (String, String) {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return ("unknown".to_string(), body.to_string());
    };

    match &value["error"] {
        Value::Object(error) => {
            let error_type = error
                .get("type")
                .and_then(Value::as_str)
                .unwrap_or("unknown")
                .to_string();
            let reason = error
                .get("reason")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| body.to_string());
            (error_type, reason)
        }
        Value::String(reason) => ("unknown".to_string(), reason.clone()),
        _ => ("unknown".to_string(), body.to_string()),
    }
}

#[async_trait]
impl IndexStore for HttpIndexStore {
    async fn create_index(&self, index: &str, schema: &IndexSchema) -> Result<(), StoreError> {
        debug!(index, "PUT index");
        let response = self
            .client
            .put(self.url(index))
            .json(&schema.to_body())
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn index_exists(&self, index: &str) -> Result<bool, StoreError> {
        let response = self.client.head(self.url(index)).send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            _ => Self::check(response).await.map(|_| true),
        }
    }

    async fn index_document(
        &self,
        index: &str,
        id: &str,
        document: &Document,
    ) -> Result<(), StoreError> {
        debug!(index, id, "PUT document");
        let response = self
            .client
            .put(self.url(&format!("{}/_doc/{}", index, id)))
            .json(document)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn register_repository(
        &self,
        repository: &str,
        location: &str,
    ) -> Result<(), StoreError> {
        debug!(repository, location, "PUT snapshot repository");
        let body = json!({
            "type": "fs",
            "settings": { "location": location }
        });
        let response = self
            .client
            .put(self.url(&format!("_snapshot/{}", repository)))
            .json(&body)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn create_snapshot(&self, repository: &str, snapshot: &str) -> Result<(), StoreError> {
        debug!(repository, snapshot, "PUT snapshot");
        let response = self
            .client
            .put(self.url(&format!("_snapshot/{}/{}", repository, snapshot)))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn snapshot_status(
        &self,
        repository: &str,
        snapshot: &str,
    ) -> Result<Option<SnapshotCompletion>, StoreError> {
        let response = self
            .client
            .get(self.url(&format!("_snapshot/{}/{}/_status", repository, snapshot)))
            .send()
            .await?;
        let response = Self::check(response).await?;

        let status: StatusResponse = response
            .json()
            .await
            .map_err(|e| StoreError::UnexpectedResponse(e.to_string()))?;

        Ok(status.snapshots.first().map(|entry| {
            entry
                .state
                .as_deref()
                .map(SnapshotCompletion::from_store_state)
                .unwrap_or(SnapshotCompletion::Pending)
        }))
    }

    async fn restore(&self, repository: &str, snapshot: &str) -> Result<(), StoreError> {
        debug!(repository, snapshot, "POST restore");
        let response = self
            .client
            .post(self.url(&format!("_snapshot/{}/{}/_restore", repository, snapshot)))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}
