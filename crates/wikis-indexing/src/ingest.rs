//! Full ingest: ranking page to indexed documents.
//!
//! Content fetches may overlap up to `fetch_concurrency`, but results are
//! consumed in page order and written one at a time, so the checkpoint only
//! ever records documents that are actually in the index.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::info;

use wikis_scrape::{extract_entries, ContentSource};
use wikis_store::IndexManager;
use wikis_types::{document_id, Category, Document, RankedEntry};

use crate::checkpoint::IngestCheckpoint;
use crate::error::BootstrapError;

/// Configuration for the ingest pipeline.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Destination index
    pub index_name: String,
    /// Maximum content fetches in flight
    pub fetch_concurrency: usize,
    /// Where progress is persisted after each write
    pub checkpoint_path: PathBuf,
}

impl IngestConfig {
    pub fn new(index_name: impl Into<String>, checkpoint_path: impl Into<PathBuf>) -> Self {
        Self {
            index_name: index_name.into(),
            fetch_concurrency: 1,
            checkpoint_path: checkpoint_path.into(),
        }
    }

    pub fn with_fetch_concurrency(mut self, concurrency: usize) -> Self {
        self.fetch_concurrency = concurrency.max(1);
        self
    }
}

/// Outcome of one ingest run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IngestResult {
    /// Documents written during this run
    pub processed: usize,
    /// Documents skipped because a previous run already wrote them
    pub skipped: usize,
    /// Documents written per category
    pub by_category: BTreeMap<Category, usize>,
}

impl IngestResult {
    fn add(&mut self, category: Category) {
        self.processed += 1;
        *self.by_category.entry(category).or_default() += 1;
    }
}

/// Fetches every ranked article and writes it to the index.
pub struct IngestPipeline {
    index: IndexManager,
    source: Arc<dyn ContentSource>,
    config: IngestConfig,
}

impl IngestPipeline {
    pub fn new(index: IndexManager, source: Arc<dyn ContentSource>, config: IngestConfig) -> Self {
        Self {
            index,
            source,
            config,
        }
    }

    /// Run the ingest, skipping documents `checkpoint` already holds.
    ///
    /// The checkpoint is saved after every write. Any fetch, validation or
    /// write failure stops the run and is returned; the saved checkpoint
    /// lets the next run pick up where this one stopped.
    pub async fn run(
        &self,
        checkpoint: &mut IngestCheckpoint,
    ) -> Result<IngestResult, BootstrapError> {
        let page = self.source.fetch_ranking_page().await?;
        let tables = extract_entries(&page)?;

        let mut result = IngestResult::default();
        let mut pending: Vec<(Category, RankedEntry)> = Vec::new();
        for table in tables {
            for entry in table.entries {
                if checkpoint.is_completed(&document_id(table.category, entry.rank)) {
                    result.skipped += 1;
                    continue;
                }
                pending.push((table.category, entry));
            }
        }

        if result.skipped > 0 {
            info!(
                skipped = result.skipped,
                remaining = pending.len(),
                "Resuming ingest from checkpoint"
            );
        }

        let source = Arc::clone(&self.source);
        let documents = stream::iter(pending)
            .map(move |(category, entry)| {
                let source = Arc::clone(&source);
                async move {
                    let contents = source.fetch_contents(&entry.title).await?;
                    Ok::<_, BootstrapError>(Document::from_entry(entry, category, contents))
                }
            })
            .buffered(self.config.fetch_concurrency.max(1));
        let mut documents = std::pin::pin!(documents);

        while let Some(document) = documents.next().await {
            let document = document?;
            document.validate()?;
            self.index
                .index_document(&self.config.index_name, &document)
                .await?;

            checkpoint.record(document.doc_id());
            checkpoint.save(&self.config.checkpoint_path)?;
            result.add(document.list);
        }

        Ok(result)
    }
}
