//! Ingestion pipeline.
//!
//! Streams the rows of one or more sources through a [`BulkIndexer`] created
//! for the run. Per-document failures are logged and counted; only failures
//! to start or close the indexer, and failing sources, end the run with an
//! error.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info, instrument, warn};

use catalog_search_repository::SearchBackend;
use catalog_search_shared::{
    Cancellation, Document, ProgressMonitor, Row, RowCallback, Source, SourceError,
};

use crate::bulk::{BulkIndexer, BulkIndexerConfig, BulkIndexerItem, BulkIndexerStats};
use crate::errors::IngestError;

/// Runs ingestion against a shared backend.
pub struct IngestPipeline {
    backend: Arc<dyn SearchBackend>,
    config: BulkIndexerConfig,
}

impl IngestPipeline {
    pub fn new(backend: Arc<dyn SearchBackend>, config: BulkIndexerConfig) -> Self {
        Self { backend, config }
    }

    pub fn config(&self) -> &BulkIndexerConfig {
        &self.config
    }

    /// Index every row of every source.
    ///
    /// # Returns
    ///
    /// * `Ok(BulkIndexerStats)` - Statistics of the run once everything was flushed
    /// * `Err(IngestError::SetupError)` - If the bulk indexer could not be started
    /// * `Err(IngestError::SourceError)` - If a source failed; pending documents are still flushed
    /// * `Err(IngestError::CloseError)` - If closing failed, with the statistics gathered so far
    #[instrument(skip_all, fields(index = %self.backend.index_name(), sources = sources.len()))]
    pub async fn run(
        &self,
        sources: &[&dyn Source],
        monitor: Arc<dyn ProgressMonitor>,
        cancel: &Cancellation,
    ) -> Result<BulkIndexerStats, IngestError> {
        let indexer = BulkIndexer::new(self.backend.clone(), self.config.clone(), cancel.clone())
            .map_err(|e| {
                let labels: Vec<&str> = sources.iter().map(|source| source.label()).collect();
                IngestError::setup(&labels, e)
            })?;

        let mut failure = None;

        for source in sources {
            let label = source.label();
            info!(source = %label, "Indexing source");

            let mut submitter = RowSubmitter {
                indexer: &indexer,
                source: label,
                monitor: &monitor,
            };

            match source.push_rows(&mut submitter).await {
                Ok(()) => {}
                Err(SourceError::Cancelled) => {
                    warn!(source = %label, "Run cancelled, skipping remaining sources");
                    break;
                }
                Err(e) => {
                    error!(source = %label, error = %e, "Source failed");
                    failure = Some(IngestError::source(label, e));
                    break;
                }
            }
        }

        let closed = indexer.close().await;
        match &closed {
            Ok(stats) => log_stats("Indexing finished", stats),
            Err(e) => {
                if let Some(stats) = e.stats() {
                    log_stats("Indexing stopped", stats);
                }
                error!(error = %e, "Failed to close bulk indexer");
            }
        }

        match failure {
            Some(err) => Err(err),
            None => closed,
        }
    }
}

fn log_stats(message: &str, stats: &BulkIndexerStats) {
    info!(
        added = stats.num_added,
        flushed = stats.num_flushed,
        indexed = stats.num_indexed,
        failed = stats.num_failed,
        rejected = stats.num_rejected,
        requests = stats.num_requests,
        retries = stats.num_retries,
        "{}",
        message
    );
}

/// Row callback turning rows into queued documents.
struct RowSubmitter<'a> {
    indexer: &'a BulkIndexer,
    source: &'a str,
    monitor: &'a Arc<dyn ProgressMonitor>,
}

#[async_trait]
impl<'a> RowCallback for RowSubmitter<'a> {
    async fn on_row(&mut self, row: Row) -> Result<(), SourceError> {
        let Some(document) = Document::from_row(&row, self.source) else {
            warn!(source = %self.source, "Skipping row without an id");
            self.indexer.record_rejected();
            return Ok(());
        };

        let body = serde_json::to_value(&document).map_err(|e| {
            SourceError::callback(format!(
                "failed to serialize document {}: {}",
                document.id, e
            ))
        })?;

        match self.indexer.add(BulkIndexerItem::index(&document.id, body)).await {
            Ok(()) => {
                let monitor = self.monitor.clone();
                tokio::spawn(async move { monitor.signal().await });
                Ok(())
            }
            Err(IngestError::Cancelled) => Err(SourceError::Cancelled),
            Err(e) => {
                error!(document_id = %document.id, error = %e, "Failed to schedule document");
                Ok(())
            }
        }
    }
}
