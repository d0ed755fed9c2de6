//! Error types for the catalog search ingest.

use catalog_search_shared::SourceError;
use thiserror::Error;

use crate::bulk::BulkIndexerStats;

/// Errors that can occur in the catalog search ingest.
#[derive(Error, Debug)]
pub enum IngestError {
    /// The bulk indexer for a run could not be started.
    #[error("Failed to start bulk indexer for sources [{labels}]: {reason}")]
    SetupError { labels: String, reason: String },

    /// A source failed while its rows were being indexed.
    #[error("Source {label}: {source}")]
    SourceError {
        label: String,
        #[source]
        source: SourceError,
    },

    /// The bulk indexer did not shut down cleanly.
    #[error("Failed to close bulk indexer: {reason} ({} indexed, {} failed)", .stats.num_indexed, .stats.num_failed)]
    CloseError {
        reason: String,
        stats: BulkIndexerStats,
    },

    /// The bulk indexer no longer accepts documents.
    #[error("Bulk indexer is closed")]
    Closed,

    /// Invalid bulk indexer settings.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Ingest was cancelled or interrupted.
    #[error("Ingest cancelled")]
    Cancelled,
}

impl IngestError {
    /// Create a setup error naming every source of the run.
    pub fn setup<S: AsRef<str>>(labels: &[S], reason: impl ToString) -> Self {
        Self::SetupError {
            labels: labels
                .iter()
                .map(|label| label.as_ref())
                .collect::<Vec<_>>()
                .join(", "),
            reason: reason.to_string(),
        }
    }

    /// Create a source error.
    pub fn source(label: impl Into<String>, source: SourceError) -> Self {
        Self::SourceError {
            label: label.into(),
            source,
        }
    }

    /// Create a close error carrying the statistics gathered so far.
    pub fn close(reason: impl Into<String>, stats: BulkIndexerStats) -> Self {
        Self::CloseError {
            reason: reason.into(),
            stats,
        }
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Statistics carried by a close failure.
    pub fn stats(&self) -> Option<&BulkIndexerStats> {
        match self {
            Self::CloseError { stats, .. } => Some(stats),
            _ => None,
        }
    }
}
