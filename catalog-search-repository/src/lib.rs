//! # Catalog Search Repository
//!
//! This crate provides the search backend seam and its OpenSearch
//! implementation: connection descriptor parsing, the retry policy, query
//! builders, index mappings and the query translator that maps backend hits
//! into paginated results.

pub mod config;
pub mod errors;
pub mod interfaces;
pub mod opensearch;
pub mod query;
pub mod retry;
pub mod types;

pub use config::{ConnectionConfig, QueryBy};
pub use errors::{ConfigError, SearchError};
pub use interfaces::SearchBackend;
pub use opensearch::OpenSearchBackend;
pub use query::QueryTranslator;
pub use retry::RetryPolicy;
pub use types::{BulkItemFailure, BulkItemOutcome, BulkOperation, BulkResponse, SearchHits, SearchRequest};
