//! Error types for the shared collaborator contracts.

use thiserror::Error;

/// Errors raised while a source pushes rows to its callback.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// The underlying storage could not be read.
    #[error("IO error: {0}")]
    Io(String),

    /// A record could not be decoded into a row.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The row callback refused a row and asked the source to stop.
    #[error("Callback error: {0}")]
    Callback(String),

    /// Iteration was stopped because the run was cancelled.
    #[error("Iteration cancelled")]
    Cancelled,
}

impl SourceError {
    /// Create an IO error.
    pub fn io(msg: impl Into<String>) -> Self {
        Self::Io(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create a callback error.
    pub fn callback(msg: impl Into<String>) -> Self {
        Self::Callback(msg.into())
    }
}

/// Errors for page requests that cannot be translated into an offset.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PaginationError {
    /// Pages are numbered from 1.
    #[error("Invalid page {0}: pages start at 1")]
    InvalidPage(u64),

    /// A page must hold at least one result.
    #[error("Invalid page size {0}: must be greater than 0")]
    InvalidPerPage(u64),
}
