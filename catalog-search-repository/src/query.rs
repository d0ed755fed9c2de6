//! Query translation and pagination.
//!
//! [`QueryTranslator`] turns a free-text query and a [`PageRequest`] into a
//! backend search, then maps the hits and total count back into a
//! [`QueryPage`].

use tracing::{debug, instrument, warn};

use catalog_search_shared::{PageRequest, Pagination, QueryPage};

use crate::config::QueryBy;
use crate::errors::SearchError;
use crate::interfaces::SearchBackend;
use crate::opensearch::queries::build_search_request;
use crate::types::{SearchHits, SearchRequest};

/// Stateless query translator; the field selection is fixed at construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryTranslator {
    query_by: QueryBy,
}

impl QueryTranslator {
    pub fn new(query_by: QueryBy) -> Self {
        Self { query_by }
    }

    pub fn query_by(&self) -> QueryBy {
        self.query_by
    }

    /// Build the backend request for one page of `query`.
    pub fn translate(&self, query: &str, page: &PageRequest) -> Result<SearchRequest, SearchError> {
        if query.trim().is_empty() {
            return Err(SearchError::invalid_query("query must not be empty"));
        }
        Ok(build_search_request(query, self.query_by, page))
    }

    /// Run `query` against `backend` and return the requested page.
    ///
    /// Backend failures are returned as a single error; no partial page is
    /// produced.
    #[instrument(skip(self, backend), fields(query_by = %self.query_by, page = page.page(), per_page = page.per_page()))]
    pub async fn execute(
        &self,
        backend: &dyn SearchBackend,
        query: &str,
        page: &PageRequest,
    ) -> Result<QueryPage, SearchError> {
        let request = self.translate(query, page)?;
        let hits = backend.search(&request).await?;

        debug!(total = hits.total, returned = hits.results.len(), "Search completed");

        Ok(paginate(hits, page))
    }
}

/// Combine decoded hits with pagination metadata for `page`.
///
/// The metadata comes from the reported total. The returned hits are what
/// the caller gets, cut down to `per_page` if the backend sent more.
pub fn paginate(hits: SearchHits, page: &PageRequest) -> QueryPage {
    let SearchHits { total, mut results } = hits;
    let expected = page.expected_len(total);
    let per_page = page.per_page().min(usize::MAX as u64) as usize;

    if results.len() > per_page {
        warn!(
            returned = results.len(),
            per_page,
            "Backend returned more hits than requested, truncating"
        );
        results.truncate(per_page);
    }

    if results.len() as u64 != expected {
        debug!(
            returned = results.len(),
            expected,
            total,
            "Returned hits differ from the reported total"
        );
    }

    QueryPage {
        results,
        pagination: Pagination::from_count(page, total),
    }
}
