//! In-memory index store for testing.

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use wikis_types::{Document, SnapshotCompletion};

use crate::error::{classify_error, StoreError};
use crate::schema::IndexSchema;
use crate::store::IndexStore;

/// A call received by [`MockIndexStore`], in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    CreateIndex(String),
    IndexExists(String),
    IndexDocument { index: String, id: String },
    RegisterRepository { repository: String, location: String },
    CreateSnapshot { repository: String, snapshot: String },
    SnapshotStatus { repository: String, snapshot: String },
    Restore { repository: String, snapshot: String },
}

/// Error the mock answers a restore with.
#[derive(Debug, Clone)]
struct ScriptedError {
    status: u16,
    error_type: String,
    reason: String,
}

/// Mock store that records every call and answers from scripted state.
///
/// Useful for asserting call order without a running cluster.
#[derive(Default)]
pub struct MockIndexStore {
    calls: Mutex<Vec<StoreCall>>,
    indices: Mutex<HashSet<String>>,
    documents: Mutex<BTreeMap<String, Document>>,
    statuses: Mutex<VecDeque<Option<SnapshotCompletion>>>,
    restore_error: Mutex<Option<ScriptedError>>,
    fail_after_documents: Mutex<Option<usize>>,
}

impl MockIndexStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretend `index` already exists.
    pub fn with_existing_index(self, index: &str) -> Self {
        self.lock_indices().insert(index.to_string());
        self
    }

    /// Answers for successive status polls. The last answer repeats; with
    /// no script every poll reports success.
    pub fn with_status_sequence(self, statuses: Vec<Option<SnapshotCompletion>>) -> Self {
        *self.statuses.lock().unwrap_or_else(|e| e.into_inner()) = statuses.into();
        self
    }

    /// Make restore fail with a store error.
    pub fn with_restore_error(self, status: u16, error_type: &str, reason: &str) -> Self {
        *self.restore_error.lock().unwrap_or_else(|e| e.into_inner()) = Some(ScriptedError {
            status,
            error_type: error_type.to_string(),
            reason: reason.to_string(),
        });
        self
    }

    /// Fail every document write once `count` documents are stored.
    pub fn fail_after_documents(self, count: usize) -> Self {
        *self
            .fail_after_documents
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = Some(count);
        self
    }

    /// Stop failing document writes.
    pub fn clear_document_failure(&self) {
        *self
            .fail_after_documents
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = None;
    }

    /// Every call so far, in order.
    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Number of calls matching `predicate`.
    pub fn count(&self, predicate: impl Fn(&StoreCall) -> bool) -> usize {
        self.calls().iter().filter(|c| predicate(c)).count()
    }

    /// Stored documents keyed by id.
    pub fn documents(&self) -> BTreeMap<String, Document> {
        self.documents
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn has_index(&self, index: &str) -> bool {
        self.lock_indices().contains(index)
    }

    fn record(&self, call: StoreCall) {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(call);
    }

    fn lock_indices(&self) -> std::sync::MutexGuard<'_, HashSet<String>> {
        self.indices.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl IndexStore for MockIndexStore {
    async fn create_index(&self, index: &str, _schema: &IndexSchema) -> Result<(), StoreError> {
        self.record(StoreCall::CreateIndex(index.to_string()));
        if !self.lock_indices().insert(index.to_string()) {
            return Err(StoreError::IndexAlreadyExists(format!(
                "index [{}] already exists",
                index
            )));
        }
        Ok(())
    }

    async fn index_exists(&self, index: &str) -> Result<bool, StoreError> {
        self.record(StoreCall::IndexExists(index.to_string()));
        Ok(self.has_index(index))
    }

    async fn index_document(
        &self,
        index: &str,
        id: &str,
        document: &Document,
    ) -> Result<(), StoreError> {
        self.record(StoreCall::IndexDocument {
            index: index.to_string(),
            id: id.to_string(),
        });

        let limit = *self
            .fail_after_documents
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        let mut documents = self.documents.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(limit) = limit {
            if documents.len() >= limit {
                return Err(StoreError::Transport("connection reset".to_string()));
            }
        }
        documents.insert(id.to_string(), document.clone());
        Ok(())
    }

    async fn register_repository(
        &self,
        repository: &str,
        location: &str,
    ) -> Result<(), StoreError> {
        self.record(StoreCall::RegisterRepository {
            repository: repository.to_string(),
            location: location.to_string(),
        });
        Ok(())
    }

    async fn create_snapshot(&self, repository: &str, snapshot: &str) -> Result<(), StoreError> {
        self.record(StoreCall::CreateSnapshot {
            repository: repository.to_string(),
            snapshot: snapshot.to_string(),
        });
        Ok(())
    }

    async fn snapshot_status(
        &self,
        repository: &str,
        snapshot: &str,
    ) -> Result<Option<SnapshotCompletion>, StoreError> {
        self.record(StoreCall::SnapshotStatus {
            repository: repository.to_string(),
            snapshot: snapshot.to_string(),
        });

        let mut statuses = self.statuses.lock().unwrap_or_else(|e| e.into_inner());
        let next = if statuses.len() > 1 {
            statuses.pop_front()
        } else {
            statuses.front().copied()
        };
        Ok(next.unwrap_or(Some(SnapshotCompletion::Success)))
    }

    async fn restore(&self, repository: &str, snapshot: &str) -> Result<(), StoreError> {
        self.record(StoreCall::Restore {
            repository: repository.to_string(),
            snapshot: snapshot.to_string(),
        });

        let scripted = self
            .restore_error
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        match scripted {
            Some(e) => Err(classify_error(e.status, &e.error_type, &e.reason)),
            None => Ok(()),
        }
    }
}
