//! Test doubles shared by the bulk indexer and pipeline tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use catalog_search_repository::{
    BulkItemFailure, BulkItemOutcome, BulkOperation, BulkResponse, SearchBackend, SearchError,
    SearchHits, SearchRequest,
};
use catalog_search_shared::{Cancellation, ProgressMonitor};

/// Mock search backend for testing.
#[derive(Default)]
pub(crate) struct MockBackend {
    pub documents: Mutex<HashMap<String, Value>>,
    pub bulk_calls: AtomicUsize,
    pub accepted: AtomicUsize,
    /// Ids the backend answers with a mapping error.
    pub reject_ids: HashSet<String>,
    /// Fail every bulk request as a whole.
    pub fail_requests: bool,
    /// Requests never complete once this many documents were accepted.
    pub hang_after: Option<usize>,
    pub panic_on_bulk: bool,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rejecting(ids: &[&str]) -> Self {
        Self {
            reject_ids: ids.iter().map(|id| id.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn hanging_after(accepted: usize) -> Self {
        Self {
            hang_after: Some(accepted),
            ..Self::default()
        }
    }

    pub async fn document_count(&self) -> usize {
        self.documents.lock().await.len()
    }
}

#[async_trait]
impl SearchBackend for MockBackend {
    fn index_name(&self) -> &str {
        "subjects"
    }

    async fn create_index(&self) -> Result<(), SearchError> {
        Ok(())
    }

    async fn bulk(
        &self,
        operations: &[BulkOperation],
        _cancel: &Cancellation,
    ) -> Result<BulkResponse, SearchError> {
        self.bulk_calls.fetch_add(1, Ordering::SeqCst);

        if self.panic_on_bulk {
            panic!("simulated worker failure");
        }

        if self.fail_requests {
            return Err(SearchError::bulk_index("Request failed with response: 500"));
        }

        if let Some(limit) = self.hang_after {
            if self.accepted.load(Ordering::SeqCst) >= limit {
                std::future::pending::<()>().await;
            }
        }

        let mut documents = self.documents.lock().await;
        let items = operations
            .iter()
            .map(|op| {
                if self.reject_ids.contains(&op.document_id) {
                    return BulkItemOutcome::Failed(BulkItemFailure::Rejected {
                        status: 400,
                        error_type: "mapper_parsing_exception".to_string(),
                        reason: "failed to parse field [label]".to_string(),
                    });
                }
                documents.insert(op.document_id.clone(), op.source.clone());
                self.accepted.fetch_add(1, Ordering::SeqCst);
                BulkItemOutcome::Indexed
            })
            .collect();

        Ok(BulkResponse { items, retries: 0 })
    }

    async fn search(&self, _request: &SearchRequest) -> Result<SearchHits, SearchError> {
        Ok(SearchHits::default())
    }
}

/// Monitor counting its signals.
#[derive(Default)]
pub(crate) struct CountingMonitor {
    pub signals: AtomicUsize,
}

#[async_trait]
impl ProgressMonitor for CountingMonitor {
    async fn signal(&self) {
        self.signals.fetch_add(1, Ordering::SeqCst);
    }
}
