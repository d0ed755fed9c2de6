//! # Catalog Search Ingest
//!
//! This crate provides the bulk ingestion components for loading catalog
//! sources into the search index.
//!
//! ## Architecture
//!
//! 1. **Sources** push rows into a callback owned by the pipeline
//! 2. **Pipeline** turns each row into a document and queues it
//! 3. **Bulk indexer** workers batch queued documents and write them to the
//!    backend, recording per-document outcomes

pub mod bulk;
pub mod errors;
pub mod pipeline;

#[cfg(test)]
mod testing;

pub use bulk::{BulkIndexer, BulkIndexerConfig, BulkIndexerItem, BulkIndexerStats};
pub use errors::IngestError;
pub use pipeline::IngestPipeline;
