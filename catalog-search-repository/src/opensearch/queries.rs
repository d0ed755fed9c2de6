//! OpenSearch query builders.
//!
//! This module turns a free-text query and a page request into a search
//! request body and result window.

use serde_json::{json, Map, Value};

use catalog_search_shared::PageRequest;

use crate::config::QueryBy;
use crate::types::SearchRequest;

/// Analyzed field every label is copied into.
pub const TEXT_FIELD: &str = "search";

/// Untokenized label sub-field.
pub const LABEL_FIELD: &str = "label.keyword";

/// The field a query mode matches against.
pub fn query_field(query_by: QueryBy) -> &'static str {
    match query_by {
        QueryBy::Text => TEXT_FIELD,
        QueryBy::Label => LABEL_FIELD,
    }
}

/// Build a `match_phrase` query for `query` against the field selected by
/// `query_by`.
///
/// The query text is embedded as a JSON string value, never spliced into raw
/// JSON, so quotes and braces in it stay literal.
pub fn build_query(query: &str, query_by: QueryBy) -> Value {
    let mut clause = Map::new();
    clause.insert(
        query_field(query_by).to_string(),
        Value::String(query.to_string()),
    );

    json!({
        "query": {
            "match_phrase": clause
        }
    })
}

/// Build the full search request for one page.
///
/// The page size becomes the backend result size; pages after the first
/// skip `(page - 1) * per_page` hits.
pub fn build_search_request(query: &str, query_by: QueryBy, page: &PageRequest) -> SearchRequest {
    SearchRequest {
        body: build_query(query, query_by),
        size: page.per_page(),
        from: (page.page() > 1).then(|| page.offset()),
    }
}
