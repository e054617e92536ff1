//! Index store access for the wikis loader.
//!
//! ## Key Components
//!
//! - [`IndexStore`]: operations needed from an Elasticsearch-compatible store
//! - [`HttpIndexStore`]: REST implementation built on reqwest
//! - [`IndexManager`]: index creation and document writes
//! - [`SnapshotStore`]: repository registration, snapshot create/poll/restore
//! - [`IndexSchema`]: the fixed loader and searcher schemas
//! - [`MockIndexStore`]: call-recording store for tests

pub mod error;
pub mod http;
pub mod index;
pub mod mock;
pub mod schema;
pub mod snapshot;
pub mod store;

pub use error::StoreError;
pub use http::{HttpIndexStore, HttpStoreConfig};
pub use index::IndexManager;
pub use mock::{MockIndexStore, StoreCall};
pub use schema::{FieldType, IndexSchema, SchemaKind};
pub use snapshot::{SnapshotStore, WaitPolicy};
pub use store::IndexStore;
