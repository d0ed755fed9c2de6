//! Request and response types exchanged with a search backend.

use serde_json::Value;

use catalog_search_shared::QueryResult;

/// One bulk `index` action: create or replace the document keyed by
/// `document_id`.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkOperation {
    pub document_id: String,
    pub source: Value,
}

impl BulkOperation {
    pub fn index(document_id: impl Into<String>, source: Value) -> Self {
        Self {
            document_id: document_id.into(),
            source,
        }
    }
}

/// Why a single document failed to index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BulkItemFailure {
    /// The request carrying the document never got a usable answer.
    Transport(String),
    /// The backend answered for this document with an error.
    Rejected {
        status: u16,
        error_type: String,
        reason: String,
    },
}

/// Outcome of one bulk action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BulkItemOutcome {
    Indexed,
    Failed(BulkItemFailure),
}

impl BulkItemOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, BulkItemOutcome::Indexed)
    }
}

/// Result of one bulk request, one outcome per submitted operation, in order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BulkResponse {
    pub items: Vec<BulkItemOutcome>,
    /// Retries the transport needed before the backend accepted the request.
    pub retries: u32,
}

impl BulkResponse {
    pub fn succeeded(&self) -> usize {
        self.items.iter().filter(|item| item.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.items.len() - self.succeeded()
    }
}

/// A backend search request: query body plus result window.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub body: Value,
    /// Maximum number of hits to return.
    pub size: u64,
    /// Number of hits to skip; omitted for the first page.
    pub from: Option<u64>,
}

/// Decoded search response.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchHits {
    /// Total number of matching documents reported by the backend.
    pub total: u64,
    /// The hits returned for the requested window.
    pub results: Vec<QueryResult>,
}
