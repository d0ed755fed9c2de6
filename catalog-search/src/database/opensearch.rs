//! OpenSearch catalog database.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, instrument};

use catalog_search_ingest::{BulkIndexerConfig, BulkIndexerStats, IngestPipeline};
use catalog_search_repository::{
    ConnectionConfig, OpenSearchBackend, QueryBy, QueryTranslator, SearchBackend,
};
use catalog_search_shared::{Cancellation, PageRequest, ProgressMonitor, QueryPage, Source};

use super::CatalogDatabase;
use crate::CatalogError;

/// Catalog database backed by an OpenSearch (or Elasticsearch) index.
pub struct OpenSearchDatabase {
    backend: Arc<dyn SearchBackend>,
    pipeline: IngestPipeline,
    translator: QueryTranslator,
}

impl OpenSearchDatabase {
    /// Connect using a parsed descriptor.
    ///
    /// With `create-index` set, the index is created before the handle is
    /// returned and a failure aborts the connection.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self, CatalogError> {
        let backend = OpenSearchBackend::from_config(config).await?;

        if config.create_index {
            backend.create_index().await?;
        }

        Ok(Self::with_backend(Arc::new(backend), config))
    }

    /// Build a handle around an existing backend.
    pub fn with_backend(backend: Arc<dyn SearchBackend>, config: &ConnectionConfig) -> Self {
        if config.debug {
            info!(
                index = %backend.index_name(),
                workers = config.workers,
                query_by = %config.query_by,
                "Connected catalog database"
            );
        } else {
            debug!(
                index = %backend.index_name(),
                workers = config.workers,
                query_by = %config.query_by,
                "Connected catalog database"
            );
        }

        let pipeline = IngestPipeline::new(
            backend.clone(),
            BulkIndexerConfig::with_workers(config.workers),
        );

        Self {
            backend,
            pipeline,
            translator: QueryTranslator::new(config.query_by),
        }
    }
}

#[async_trait]
impl CatalogDatabase for OpenSearchDatabase {
    fn index_name(&self) -> &str {
        self.backend.index_name()
    }

    fn query_by(&self) -> QueryBy {
        self.translator.query_by()
    }

    async fn index(
        &self,
        sources: &[&dyn Source],
        monitor: Arc<dyn ProgressMonitor>,
        cancel: &Cancellation,
    ) -> Result<BulkIndexerStats, CatalogError> {
        Ok(self.pipeline.run(sources, monitor, cancel).await?)
    }

    #[instrument(skip(self, page), fields(index = %self.backend.index_name()))]
    async fn query(&self, query: &str, page: &PageRequest) -> Result<QueryPage, CatalogError> {
        Ok(self
            .translator
            .execute(self.backend.as_ref(), query, page)
            .await?)
    }
}
