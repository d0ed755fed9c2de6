//! Bulk indexer statistics.

use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of a bulk indexer's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BulkIndexerStats {
    /// Documents accepted into the write queue.
    pub num_added: u64,
    /// Documents sent to the backend, successfully or not.
    pub num_flushed: u64,
    /// Documents the backend confirmed.
    pub num_indexed: u64,
    /// Documents that failed after reaching a writer.
    pub num_failed: u64,
    /// Rows that never reached a writer.
    pub num_rejected: u64,
    /// Bulk requests issued.
    pub num_requests: u64,
    /// Retries spent on those requests.
    pub num_retries: u64,
}

impl BulkIndexerStats {
    /// Every row that did not end up indexed.
    pub fn failures(&self) -> u64 {
        self.num_failed + self.num_rejected
    }

    /// Rows accounted for: indexed plus failures.
    pub fn processed(&self) -> u64 {
        self.num_indexed + self.failures()
    }
}

#[derive(Debug, Default)]
pub(crate) struct Counters {
    added: AtomicU64,
    flushed: AtomicU64,
    indexed: AtomicU64,
    failed: AtomicU64,
    rejected: AtomicU64,
    requests: AtomicU64,
    retries: AtomicU64,
}

impl Counters {
    pub(crate) fn added(&self) {
        self.added.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn flushed(&self, count: u64) {
        self.flushed.fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn indexed(&self, count: u64) {
        self.indexed.fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn failed(&self, count: u64) {
        self.failed.fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn request(&self, retries: u32) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        self.retries.fetch_add(u64::from(retries), Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> BulkIndexerStats {
        BulkIndexerStats {
            num_added: self.added.load(Ordering::Relaxed),
            num_flushed: self.flushed.load(Ordering::Relaxed),
            num_indexed: self.indexed.load(Ordering::Relaxed),
            num_failed: self.failed.load(Ordering::Relaxed),
            num_rejected: self.rejected.load(Ordering::Relaxed),
            num_requests: self.requests.load(Ordering::Relaxed),
            num_retries: self.retries.load(Ordering::Relaxed),
        }
    }
}
