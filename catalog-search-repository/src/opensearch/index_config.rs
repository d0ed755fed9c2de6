//! OpenSearch index configuration and mappings.
//!
//! This module defines the index settings and mappings for the catalog index.

use serde_json::{json, Value};

/// Get the index settings and mappings for the catalog index.
///
/// - `id` and `source` are keywords for exact lookups and filtering
/// - `label` is analyzed text with a `keyword` sub-field for exact phrase
///   matches, and is copied into `search`
/// - `search` is the full-text field used by `query-by=text`
pub fn get_index_settings() -> Value {
    json!({
        "settings": {
            "number_of_shards": 1,
            "number_of_replicas": 1
        },
        "mappings": {
            "properties": {
                "id": {
                    "type": "keyword"
                },
                "label": {
                    "type": "text",
                    "copy_to": "search",
                    "fields": {
                        "keyword": {
                            "type": "keyword",
                            "ignore_above": 512
                        }
                    }
                },
                "source": {
                    "type": "keyword"
                },
                "search": {
                    "type": "text"
                }
            }
        }
    })
}
