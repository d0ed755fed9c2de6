//! Concurrent bulk writer.
//!
//! A [`BulkIndexer`] owns a pool of workers that share one bounded queue.
//! Each worker buffers documents and flushes them to the backend when its
//! buffer reaches `flush_bytes` or when `flush_interval` elapses, whichever
//! comes first.

mod indexer;
mod stats;

use std::time::Duration;

use catalog_search_repository::config::DEFAULT_WORKERS;
use catalog_search_repository::BulkOperation;
use serde_json::Value;

use crate::errors::IngestError;

pub use indexer::BulkIndexer;
pub use stats::BulkIndexerStats;

/// Default pending bytes per worker before a flush.
pub const DEFAULT_FLUSH_BYTES: usize = 5_000_000;

/// Default time between periodic flushes.
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(30);

/// Configuration for a bulk indexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkIndexerConfig {
    /// Number of concurrent writers.
    pub num_workers: usize,
    /// Pending document bytes that trigger a flush.
    pub flush_bytes: usize,
    /// Maximum time a document waits in a buffer.
    pub flush_interval: Duration,
}

impl Default for BulkIndexerConfig {
    fn default() -> Self {
        Self {
            num_workers: DEFAULT_WORKERS,
            flush_bytes: DEFAULT_FLUSH_BYTES,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
        }
    }
}

impl BulkIndexerConfig {
    /// Default settings with `num_workers` writers.
    pub fn with_workers(num_workers: usize) -> Self {
        Self {
            num_workers,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), IngestError> {
        if self.num_workers == 0 {
            return Err(IngestError::invalid_config("num_workers must be positive"));
        }
        if self.flush_bytes == 0 {
            return Err(IngestError::invalid_config("flush_bytes must be positive"));
        }
        if self.flush_interval.is_zero() {
            return Err(IngestError::invalid_config("flush_interval must be positive"));
        }
        Ok(())
    }
}

/// A document queued for indexing.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkIndexerItem {
    operation: BulkOperation,
    size: usize,
}

impl BulkIndexerItem {
    /// An `index` action for `document_id`.
    pub fn index(document_id: impl Into<String>, source: Value) -> Self {
        let operation = BulkOperation::index(document_id, source);
        let size = operation.document_id.len() + operation.source.to_string().len();
        Self { operation, size }
    }

    pub fn document_id(&self) -> &str {
        &self.operation.document_id
    }

    /// Approximate payload size in bytes.
    pub fn size(&self) -> usize {
        self.size
    }

    pub(crate) fn into_operation(self) -> BulkOperation {
        self.operation
    }
}
