//! Bulk indexer worker pool.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use catalog_search_repository::{BulkItemFailure, BulkItemOutcome, BulkOperation, SearchBackend};
use catalog_search_shared::Cancellation;

use super::stats::Counters;
use super::{BulkIndexerConfig, BulkIndexerItem, BulkIndexerStats};
use crate::errors::IngestError;

type SharedReceiver = Arc<Mutex<mpsc::Receiver<BulkIndexerItem>>>;

/// Writes documents to a search backend through a fixed pool of workers.
///
/// The indexer belongs to one ingestion run: create it, [`add`](Self::add)
/// documents, then [`close`](Self::close) it to flush what is pending and
/// collect the statistics.
pub struct BulkIndexer {
    sender: mpsc::Sender<BulkIndexerItem>,
    workers: Vec<JoinHandle<()>>,
    counters: Arc<Counters>,
    cancel: Cancellation,
}

impl BulkIndexer {
    /// Start the workers on the current tokio runtime.
    pub fn new(
        backend: Arc<dyn SearchBackend>,
        config: BulkIndexerConfig,
        cancel: Cancellation,
    ) -> Result<Self, IngestError> {
        config.validate()?;
        let runtime = Handle::try_current()
            .map_err(|e| IngestError::invalid_config(format!("no tokio runtime: {}", e)))?;

        let (sender, receiver) = mpsc::channel(config.num_workers);
        let receiver: SharedReceiver = Arc::new(Mutex::new(receiver));
        let counters = Arc::new(Counters::default());

        let workers = (0..config.num_workers)
            .map(|id| {
                let worker = Worker {
                    id,
                    backend: backend.clone(),
                    receiver: receiver.clone(),
                    counters: counters.clone(),
                    cancel: cancel.clone(),
                    flush_bytes: config.flush_bytes,
                    flush_interval: config.flush_interval,
                };
                runtime.spawn(worker.run())
            })
            .collect();

        info!(
            index = %backend.index_name(),
            workers = config.num_workers,
            flush_bytes = config.flush_bytes,
            flush_interval_ms = config.flush_interval.as_millis() as u64,
            "Started bulk indexer"
        );

        Ok(Self {
            sender,
            workers,
            counters,
            cancel,
        })
    }

    /// Queue a document, waiting while the queue is full.
    ///
    /// Fails with [`IngestError::Cancelled`] once the run is cancelled and
    /// with [`IngestError::Closed`] when no worker is left to take it.
    pub async fn add(&self, item: BulkIndexerItem) -> Result<(), IngestError> {
        if self.cancel.is_cancelled() {
            self.counters.rejected();
            return Err(IngestError::Cancelled);
        }

        let result = tokio::select! {
            sent = self.sender.send(item) => sent.map_err(|_| IngestError::Closed),
            _ = self.cancel.cancelled() => Err(IngestError::Cancelled),
        };

        match result {
            Ok(()) => self.counters.added(),
            Err(_) => self.counters.rejected(),
        }
        result
    }

    /// Count a row that was dropped before it could be queued.
    pub fn record_rejected(&self) {
        self.counters.rejected();
    }

    pub fn stats(&self) -> BulkIndexerStats {
        self.counters.snapshot()
    }

    /// Stop accepting documents and wait for the workers to flush.
    ///
    /// Returns early when the run is cancelled. If documents were left
    /// unwritten the result is an error carrying the statistics gathered up
    /// to that point; a run whose documents were all written still succeeds.
    pub async fn close(self) -> Result<BulkIndexerStats, IngestError> {
        let Self {
            sender,
            workers,
            counters,
            cancel,
        } = self;
        drop(sender);

        let worker_count = workers.len();
        let results = tokio::select! {
            results = join_all(workers) => Some(results),
            _ = cancel.cancelled() => None,
        };

        let stats = counters.snapshot();
        let pending = stats.num_added.saturating_sub(stats.num_flushed);

        if let Some(results) = &results {
            let failed = results.iter().filter(|result| result.is_err()).count();
            if failed > 0 {
                for err in results.iter().filter_map(|result| result.as_ref().err()) {
                    error!(error = %err, "Bulk indexer worker failed");
                }
                return Err(IngestError::close(
                    format!("{} of {} workers failed", failed, worker_count),
                    stats,
                ));
            }
        }

        if pending > 0 {
            warn!(pending, "Closed before pending documents were written");
            return Err(IngestError::close("cancelled", stats));
        }

        if results.is_none() {
            debug!("Run cancelled after every document was written");
        }

        Ok(stats)
    }
}

struct Worker {
    id: usize,
    backend: Arc<dyn SearchBackend>,
    receiver: SharedReceiver,
    counters: Arc<Counters>,
    cancel: Cancellation,
    flush_bytes: usize,
    flush_interval: Duration,
}

impl Worker {
    async fn run(self) {
        let mut buffer: Vec<BulkIndexerItem> = Vec::new();
        let mut buffered_bytes = 0;

        let mut ticker = interval_at(Instant::now() + self.flush_interval, self.flush_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                _ = self.cancel.cancelled() => {
                    self.abandon(&mut buffer);
                    return;
                }
                _ = ticker.tick() => {
                    if !buffer.is_empty() {
                        debug!(worker = self.id, count = buffer.len(), "Flush interval elapsed");
                        self.flush(&mut buffer).await;
                        buffered_bytes = 0;
                    }
                }
                item = next_item(&self.receiver) => match item {
                    Some(item) => {
                        buffered_bytes += item.size();
                        buffer.push(item);

                        if buffered_bytes >= self.flush_bytes {
                            self.flush(&mut buffer).await;
                            buffered_bytes = 0;
                        }
                    }
                    None => {
                        if !buffer.is_empty() {
                            self.flush(&mut buffer).await;
                        }
                        debug!(worker = self.id, "Bulk indexer worker finished");
                        return;
                    }
                }
            }
        }
    }

    async fn flush(&self, buffer: &mut Vec<BulkIndexerItem>) {
        let operations: Vec<BulkOperation> = buffer
            .drain(..)
            .map(BulkIndexerItem::into_operation)
            .collect();
        let count = operations.len() as u64;

        debug!(worker = self.id, count, "Flushing documents");

        match self.backend.bulk(&operations, &self.cancel).await {
            Ok(response) => {
                self.counters.request(response.retries);

                let mut indexed = 0;
                let mut failed = 0;
                for (op, outcome) in operations.iter().zip(&response.items) {
                    match outcome {
                        BulkItemOutcome::Indexed => indexed += 1,
                        BulkItemOutcome::Failed(failure) => {
                            log_failure(&op.document_id, failure);
                            failed += 1;
                        }
                    }
                }

                for op in operations.iter().skip(response.items.len()) {
                    error!(document_id = %op.document_id, "No outcome reported for document");
                    failed += 1;
                }

                self.counters.indexed(indexed);
                self.counters.failed(failed);
            }
            Err(e) => {
                self.counters.request(0);
                for op in &operations {
                    error!(document_id = %op.document_id, error = %e, "Failed to index document");
                }
                self.counters.failed(count);
            }
        }

        self.counters.flushed(count);
    }

    fn abandon(&self, buffer: &mut Vec<BulkIndexerItem>) {
        if buffer.is_empty() {
            return;
        }
        for item in buffer.iter() {
            warn!(document_id = %item.document_id(), "Run cancelled, document not written");
        }
        self.counters.failed(buffer.len() as u64);
        buffer.clear();
    }
}

async fn next_item(receiver: &Mutex<mpsc::Receiver<BulkIndexerItem>>) -> Option<BulkIndexerItem> {
    receiver.lock().await.recv().await
}

fn log_failure(document_id: &str, failure: &BulkItemFailure) {
    match failure {
        BulkItemFailure::Transport(reason) => {
            error!(document_id = %document_id, error = %reason, "Failed to index document");
        }
        BulkItemFailure::Rejected {
            status,
            error_type,
            reason,
        } => {
            error!(
                document_id = %document_id,
                status,
                error_type = %error_type,
                reason = %reason,
                "Backend rejected document"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockBackend;
    use serde_json::json;
    use std::sync::atomic::Ordering;

    fn item(id: &str) -> BulkIndexerItem {
        BulkIndexerItem::index(id, json!({ "id": id, "label": format!("Label {}", id) }))
    }

    fn single_worker(flush_bytes: usize) -> BulkIndexerConfig {
        BulkIndexerConfig {
            num_workers: 1,
            flush_bytes,
            flush_interval: Duration::from_secs(30),
        }
    }

    #[tokio::test]
    async fn test_close_flushes_pending_documents() {
        let backend = Arc::new(MockBackend::new());
        let indexer =
            BulkIndexer::new(backend.clone(), single_worker(usize::MAX), Cancellation::new()).unwrap();

        for id in ["a", "b", "c", "d", "e"] {
            indexer.add(item(id)).await.unwrap();
        }
        let stats = indexer.close().await.unwrap();

        assert_eq!(stats.num_added, 5);
        assert_eq!(stats.num_flushed, 5);
        assert_eq!(stats.num_indexed, 5);
        assert_eq!(stats.num_requests, 1);
        assert_eq!(backend.document_count().await, 5);
    }

    #[tokio::test]
    async fn test_flush_on_size() {
        let backend = Arc::new(MockBackend::new());
        let indexer = BulkIndexer::new(backend.clone(), single_worker(1), Cancellation::new()).unwrap();

        for id in ["a", "b", "c"] {
            indexer.add(item(id)).await.unwrap();
        }
        let stats = indexer.close().await.unwrap();

        assert_eq!(stats.num_requests, 3);
        assert_eq!(stats.num_indexed, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_on_interval() {
        let backend = Arc::new(MockBackend::new());
        let config = BulkIndexerConfig {
            num_workers: 1,
            flush_bytes: usize::MAX,
            flush_interval: Duration::from_millis(50),
        };
        let indexer = BulkIndexer::new(backend.clone(), config, Cancellation::new()).unwrap();

        indexer.add(item("a")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(120)).await;

        assert_eq!(indexer.stats().num_indexed, 1);
        assert_eq!(backend.document_count().await, 1);

        indexer.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_item_failures_are_counted() {
        let backend = Arc::new(MockBackend::rejecting(&["b"]));
        let indexer = BulkIndexer::new(
            backend.clone(),
            BulkIndexerConfig::with_workers(4),
            Cancellation::new(),
        )
        .unwrap();

        for id in ["a", "b", "c"] {
            indexer.add(item(id)).await.unwrap();
        }
        let stats = indexer.close().await.unwrap();

        assert_eq!(stats.num_indexed, 2);
        assert_eq!(stats.num_failed, 1);
        assert_eq!(stats.num_flushed, 3);
    }

    #[tokio::test]
    async fn test_request_failures_fail_every_document() {
        let backend = Arc::new(MockBackend {
            fail_requests: true,
            ..MockBackend::default()
        });
        let indexer =
            BulkIndexer::new(backend.clone(), single_worker(usize::MAX), Cancellation::new()).unwrap();

        indexer.add(item("a")).await.unwrap();
        indexer.add(item("b")).await.unwrap();
        let stats = indexer.close().await.unwrap();

        assert_eq!(stats.num_failed, 2);
        assert_eq!(stats.num_indexed, 0);
        assert_eq!(stats.num_requests, 1);
    }

    #[tokio::test]
    async fn test_add_after_cancel_is_rejected() {
        let cancel = Cancellation::new();
        let backend = Arc::new(MockBackend::new());
        let indexer = BulkIndexer::new(backend, single_worker(usize::MAX), cancel.clone()).unwrap();

        cancel.cancel();
        let err = indexer.add(item("a")).await.unwrap_err();

        assert!(matches!(err, IngestError::Cancelled));
        assert_eq!(indexer.stats().num_rejected, 1);

        let stats = indexer.close().await.unwrap();
        assert_eq!(stats.num_added, 0);
    }

    #[tokio::test]
    async fn test_cancel_after_everything_is_written_succeeds() {
        let cancel = Cancellation::new();
        let backend = Arc::new(MockBackend::new());
        let indexer = BulkIndexer::new(backend.clone(), single_worker(1), cancel.clone()).unwrap();

        for id in ["a", "b", "c"] {
            indexer.add(item(id)).await.unwrap();
        }
        tokio::time::timeout(Duration::from_secs(5), async {
            while indexer.stats().num_flushed < 3 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        cancel.cancel();
        let stats = indexer.close().await.unwrap();

        assert_eq!(stats.num_indexed, 3);
        assert_eq!(backend.document_count().await, 3);
    }

    #[tokio::test]
    async fn test_close_returns_on_cancel_with_stats() {
        let cancel = Cancellation::new();
        let backend = Arc::new(MockBackend::hanging_after(2));
        let indexer = BulkIndexer::new(backend.clone(), single_worker(1), cancel.clone()).unwrap();

        for id in ["a", "b", "c"] {
            indexer.add(item(id)).await.unwrap();
        }

        let trigger = async {
            while backend.bulk_calls.load(Ordering::SeqCst) < 3 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
            cancel.cancel();
        };
        let (result, ()) = tokio::join!(indexer.close(), trigger);

        let err = result.unwrap_err();
        let stats = err.stats().copied().unwrap();
        assert_eq!(stats.num_indexed, 2);
        assert_eq!(stats.num_added, 3);
    }

    #[tokio::test]
    async fn test_worker_failure_fails_close() {
        let backend = Arc::new(MockBackend {
            panic_on_bulk: true,
            ..MockBackend::default()
        });
        let indexer = BulkIndexer::new(backend, single_worker(1), Cancellation::new()).unwrap();

        indexer.add(item("a")).await.unwrap();
        let err = indexer.close().await.unwrap_err();

        assert!(err.to_string().contains("1 of 1 workers failed"));
    }

    #[test]
    fn test_new_requires_runtime() {
        let result = BulkIndexer::new(
            Arc::new(MockBackend::new()),
            BulkIndexerConfig::default(),
            Cancellation::new(),
        );

        assert!(matches!(result, Err(IngestError::InvalidConfig(_))));
    }
}
