//! Index manager: creates the destination index and writes documents.

use std::sync::Arc;

use tracing::{debug, info};

use wikis_types::Document;

use crate::error::StoreError;
use crate::schema::IndexSchema;
use crate::store::IndexStore;

/// Thin wrapper over an [`IndexStore`] for index-level operations.
#[derive(Clone)]
pub struct IndexManager {
    store: Arc<dyn IndexStore>,
}

impl IndexManager {
    pub fn new(store: Arc<dyn IndexStore>) -> Self {
        Self { store }
    }

    /// Create `name` with `schema`.
    ///
    /// An existing index is an error; the caller decides whether creation
    /// or restore is appropriate.
    pub async fn create_index(&self, name: &str, schema: &IndexSchema) -> Result<(), StoreError> {
        info!(
            index = name,
            index_type = %schema.index_type,
            version = %schema.version,
            "Creating index"
        );
        self.store.create_index(name, schema).await
    }

    pub async fn index_exists(&self, name: &str) -> Result<bool, StoreError> {
        self.store.index_exists(name).await
    }

    /// Write `document` under its stable id.
    pub async fn index_document(&self, name: &str, document: &Document) -> Result<(), StoreError> {
        let id = document.doc_id();
        debug!(index = name, id = %id, title = %document.title, "Indexing document");
        self.store.index_document(name, &id, document).await
    }
}
