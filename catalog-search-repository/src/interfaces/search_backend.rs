//! Search backend trait definition.
//!
//! This module defines the abstract interface the ingestion pipeline and the
//! query translator use to reach the search service, allowing different
//! backend implementations (OpenSearch, mocks in tests).

use async_trait::async_trait;

use catalog_search_shared::Cancellation;

use crate::errors::SearchError;
use crate::types::{BulkOperation, BulkResponse, SearchHits, SearchRequest};

/// Abstract interface for search backend operations.
///
/// An implementation is bound to one index and carries its own retry policy,
/// so callers never retry on their own.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync`: a single backend is shared by
/// every bulk writer and every query.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Name of the index this backend reads and writes.
    fn index_name(&self) -> &str;

    /// Create the index with the catalog mappings.
    ///
    /// An index that already exists is not an error.
    async fn create_index(&self) -> Result<(), SearchError>;

    /// Submit a batch of index actions.
    ///
    /// # Returns
    ///
    /// * `Ok(BulkResponse)` - One outcome per operation, in submission order
    /// * `Err(SearchError)` - If the request as a whole failed
    ///
    /// Retries stop once `cancel` fires; the request in flight is not
    /// interrupted.
    async fn bulk(
        &self,
        operations: &[BulkOperation],
        cancel: &Cancellation,
    ) -> Result<BulkResponse, SearchError>;

    /// Execute a search request.
    ///
    /// # Returns
    ///
    /// * `Ok(SearchHits)` - The hits for the requested window and the total count
    /// * `Err(SearchError::ResponseStatus)` - If the backend answered with a non-success status
    /// * `Err(SearchError::ParseError)` - If the response could not be decoded
    async fn search(&self, request: &SearchRequest) -> Result<SearchHits, SearchError>;
}
