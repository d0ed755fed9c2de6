//! Catalog database adapters.
//!
//! A [`CatalogDatabase`] is the durable handle produced from a connection
//! descriptor: it indexes sources and answers paginated queries.

mod opensearch;
mod registry;

use std::sync::Arc;

use async_trait::async_trait;

use catalog_search_ingest::BulkIndexerStats;
use catalog_search_repository::QueryBy;
use catalog_search_shared::{Cancellation, PageRequest, ProgressMonitor, QueryPage, Source};

use crate::CatalogError;

pub use opensearch::OpenSearchDatabase;
pub use registry::{default_registry, Connector, DatabaseRegistry};

/// A connected catalog database.
#[async_trait]
pub trait CatalogDatabase: Send + Sync {
    /// Name of the index behind this handle.
    fn index_name(&self) -> &str;

    /// Field selection applied to every query.
    fn query_by(&self) -> QueryBy;

    /// Index every row of `sources`, notifying `monitor` once per scheduled
    /// document.
    async fn index(
        &self,
        sources: &[&dyn Source],
        monitor: Arc<dyn ProgressMonitor>,
        cancel: &Cancellation,
    ) -> Result<BulkIndexerStats, CatalogError>;

    /// Return one page of results for `query`.
    async fn query(&self, query: &str, page: &PageRequest) -> Result<QueryPage, CatalogError>;
}
