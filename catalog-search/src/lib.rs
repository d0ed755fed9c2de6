//! # Catalog Search
//!
//! Main library for the catalog search adapter.
//!
//! This crate wires the search backend, the ingestion pipeline and the query
//! translator behind the [`CatalogDatabase`](database::CatalogDatabase)
//! trait, and provides the environment configuration, CSV source and
//! progress monitor used by the `catalog-search` binary.

pub mod config;
pub mod database;
pub mod monitor;
pub mod sources;

pub use config::Dependencies;
pub use database::{default_registry, CatalogDatabase, DatabaseRegistry, OpenSearchDatabase};

use catalog_search_ingest::IngestError;
use catalog_search_repository::{ConfigError, SearchError};
use catalog_search_shared::PaginationError;
use thiserror::Error;

/// Errors that can occur while connecting to, indexing into or querying a
/// catalog database.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Connection descriptor error.
    #[error("Configuration error: {0}")]
    ConfigError(#[from] ConfigError),

    /// Search backend error.
    #[error("Search error: {0}")]
    SearchError(#[from] SearchError),

    /// Ingestion error.
    #[error("Ingest error: {0}")]
    IngestError(#[from] IngestError),

    /// Invalid page request.
    #[error("Pagination error: {0}")]
    PaginationError(#[from] PaginationError),

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
