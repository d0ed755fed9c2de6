//! Progress monitor contract.

use async_trait::async_trait;

/// Receives one signal per document scheduled for indexing.
///
/// Signals are dispatched on detached tasks; implementations must not assume
/// they are awaited or ordered.
#[async_trait]
pub trait ProgressMonitor: Send + Sync {
    /// Record one unit of progress.
    async fn signal(&self);
}

/// A monitor that ignores every signal.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMonitor;

#[async_trait]
impl ProgressMonitor for NoopMonitor {
    async fn signal(&self) {}
}
