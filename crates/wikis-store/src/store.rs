//! Index store trait.
//!
//! The operations the loader needs from an Elasticsearch-compatible store.
//! [`HttpIndexStore`](crate::HttpIndexStore) talks to a real cluster;
//! [`MockIndexStore`](crate::MockIndexStore) records calls for tests.

use async_trait::async_trait;

use wikis_types::{Document, SnapshotCompletion};

use crate::error::StoreError;
use crate::schema::IndexSchema;

#[async_trait]
pub trait IndexStore: Send + Sync {
    /// Create `index` with `schema`. Fails with
    /// [`StoreError::IndexAlreadyExists`] if it is already there.
    async fn create_index(&self, index: &str, schema: &IndexSchema) -> Result<(), StoreError>;

    async fn index_exists(&self, index: &str) -> Result<bool, StoreError>;

    /// Write one document under `id`, replacing any previous version.
    async fn index_document(
        &self,
        index: &str,
        id: &str,
        document: &Document,
    ) -> Result<(), StoreError>;

    /// Declare a filesystem-backed snapshot repository.
    async fn register_repository(&self, repository: &str, location: &str)
        -> Result<(), StoreError>;

    /// Start a snapshot without waiting for it.
    async fn create_snapshot(&self, repository: &str, snapshot: &str) -> Result<(), StoreError>;

    /// One status poll. `None` means the store reported no snapshot entries
    /// yet.
    async fn snapshot_status(
        &self,
        repository: &str,
        snapshot: &str,
    ) -> Result<Option<SnapshotCompletion>, StoreError>;

    /// Restore a snapshot. An open index with the same name surfaces as
    /// [`StoreError::RestoreConflict`].
    async fn restore(&self, repository: &str, snapshot: &str) -> Result<(), StoreError>;
}
