//! Push-style row sources.
//!
//! A [`Source`] owns its rows and pushes them one at a time into a
//! [`RowCallback`]. The callback may await (for example on a full write
//! queue), which suspends the source: that is the ingestion backpressure.

use async_trait::async_trait;

use crate::document::Row;
use crate::errors::SourceError;

/// Receives rows pushed by a [`Source`].
#[async_trait]
pub trait RowCallback: Send {
    /// Handle one row. Returning an error stops the source.
    async fn on_row(&mut self, row: Row) -> Result<(), SourceError>;
}

/// A labelled collection of rows that can be ingested.
#[async_trait]
pub trait Source: Send + Sync {
    /// Label identifying this collection, stored on every document it yields.
    fn label(&self) -> &str;

    /// Push every row into `callback` until the source is exhausted.
    async fn push_rows(&self, callback: &mut dyn RowCallback) -> Result<(), SourceError>;
}

/// An in-memory source.
#[derive(Debug, Clone)]
pub struct VecSource {
    label: String,
    rows: Vec<Row>,
}

impl VecSource {
    pub fn new(label: impl Into<String>, rows: Vec<Row>) -> Self {
        Self {
            label: label.into(),
            rows,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[async_trait]
impl Source for VecSource {
    fn label(&self) -> &str {
        &self.label
    }

    async fn push_rows(&self, callback: &mut dyn RowCallback) -> Result<(), SourceError> {
        for row in &self.rows {
            callback.on_row(row.clone()).await?;
        }
        Ok(())
    }
}
