//! Progress monitor that logs indexing progress.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tracing::info;

use catalog_search_shared::ProgressMonitor;

/// Default number of signals between two progress lines.
pub const DEFAULT_LOG_EVERY: u64 = 10_000;

/// Counts signals and logs a line every `every` documents.
#[derive(Debug)]
pub struct LoggingMonitor {
    every: u64,
    count: AtomicU64,
}

impl LoggingMonitor {
    pub fn new(every: u64) -> Self {
        Self {
            every: every.max(1),
            count: AtomicU64::new(0),
        }
    }

    /// Signals received so far.
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}

impl Default for LoggingMonitor {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_EVERY)
    }
}

#[async_trait]
impl ProgressMonitor for LoggingMonitor {
    async fn signal(&self) {
        let count = self.count.fetch_add(1, Ordering::Relaxed) + 1;
        if count % self.every == 0 {
            info!(documents = count, "Indexing progress");
        }
    }
}
