//! Decoding of OpenSearch response bodies.

use std::collections::HashMap;

use serde::Deserialize;
use tracing::warn;

use catalog_search_shared::QueryResult;

use crate::errors::SearchError;
use crate::types::{BulkItemFailure, BulkItemOutcome, SearchHits};

#[derive(Debug, Deserialize)]
struct SearchResponseBody {
    hits: HitsBody,
}

#[derive(Debug, Deserialize)]
struct HitsBody {
    #[serde(default)]
    total: Option<TotalHits>,
    #[serde(default)]
    hits: Vec<Hit>,
}

/// `{"value": n, "relation": "eq"}` on current backends, a bare number on
/// older ones.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TotalHits {
    Object { value: u64 },
    Count(u64),
}

impl TotalHits {
    fn value(&self) -> u64 {
        match self {
            TotalHits::Object { value } => *value,
            TotalHits::Count(count) => *count,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(rename = "_id", default)]
    id: Option<String>,
    #[serde(rename = "_source", default)]
    source: Option<QueryResult>,
}

impl Hit {
    fn into_result(self) -> Option<QueryResult> {
        match (self.source, self.id) {
            (Some(mut result), id) => {
                if result.id.is_empty() {
                    result.id = id?;
                }
                Some(result)
            }
            (None, Some(id)) => Some(QueryResult {
                id,
                label: String::new(),
                source: String::new(),
            }),
            (None, None) => None,
        }
    }
}

/// Decode a search response into hits and the reported total.
pub fn decode_search(body: &str) -> Result<SearchHits, SearchError> {
    let response: SearchResponseBody = serde_json::from_str(body)
        .map_err(|e| SearchError::parse(format!("Failed to decode response, {}", e)))?;

    let returned = response.hits.hits.len();
    let results: Vec<QueryResult> = response
        .hits
        .hits
        .into_iter()
        .filter_map(Hit::into_result)
        .collect();

    if results.len() < returned {
        warn!(
            skipped = returned - results.len(),
            "Skipped hits without an id or source"
        );
    }

    let total = response
        .hits
        .total
        .map(|total| total.value())
        .unwrap_or(returned as u64);

    Ok(SearchHits { total, results })
}

#[derive(Debug, Deserialize)]
struct BulkResponseBody {
    #[serde(default)]
    items: Vec<HashMap<String, BulkItemBody>>,
}

#[derive(Debug, Deserialize)]
struct BulkItemBody {
    #[serde(default)]
    status: u16,
    #[serde(default)]
    error: Option<BulkItemError>,
}

#[derive(Debug, Deserialize)]
struct BulkItemError {
    #[serde(rename = "type", default)]
    error_type: String,
    #[serde(default)]
    reason: String,
}

impl BulkItemBody {
    fn outcome(self) -> BulkItemOutcome {
        match self.error {
            Some(error) => BulkItemOutcome::Failed(BulkItemFailure::Rejected {
                status: self.status,
                error_type: error.error_type,
                reason: error.reason,
            }),
            None if (200..300).contains(&self.status) => BulkItemOutcome::Indexed,
            None => BulkItemOutcome::Failed(BulkItemFailure::Rejected {
                status: self.status,
                error_type: String::new(),
                reason: format!("unexpected item status {}", self.status),
            }),
        }
    }
}

/// Decode a bulk response into exactly `expected` outcomes.
///
/// Items the backend did not report on are marked as transport failures.
pub fn decode_bulk(body: &str, expected: usize) -> Result<Vec<BulkItemOutcome>, SearchError> {
    let response: BulkResponseBody = serde_json::from_str(body)
        .map_err(|e| SearchError::parse(format!("Failed to decode bulk response, {}", e)))?;

    let mut outcomes: Vec<BulkItemOutcome> = response
        .items
        .into_iter()
        .take(expected)
        .map(|item| match item.into_values().next() {
            Some(body) => body.outcome(),
            None => BulkItemOutcome::Failed(BulkItemFailure::Transport(
                "empty bulk response item".to_string(),
            )),
        })
        .collect();

    if outcomes.len() < expected {
        warn!(
            expected,
            received = outcomes.len(),
            "Bulk response is missing items"
        );
        outcomes.resize(
            expected,
            BulkItemOutcome::Failed(BulkItemFailure::Transport(
                "missing from bulk response".to_string(),
            )),
        );
    }

    Ok(outcomes)
}
