//! Global atomic counters for Remedy observability.
//!
//! Counters are incremented silently at the call site. Call
//! [`Metrics::flush`] to emit current values as a single
//! `tracing::info!` event (e.g. at the end of a run).

use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

/// Lightweight atomic counters without allocation or locking.
pub struct Metrics {
    files_loaded: AtomicU64,
    files_skipped: AtomicU64,
    batches_succeeded: AtomicU64,
    batches_failed: AtomicU64,
    issues_collected: AtomicU64,
    artifacts_published: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            files_loaded: AtomicU64::new(0),
            files_skipped: AtomicU64::new(0),
            batches_succeeded: AtomicU64::new(0),
            batches_failed: AtomicU64::new(0),
            issues_collected: AtomicU64::new(0),
            artifacts_published: AtomicU64::new(0),
        }
    }

    pub fn inc_files_loaded(&self) {
        self.files_loaded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_files_skipped(&self) {
        self.files_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_batches_succeeded(&self) {
        self.batches_succeeded.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "batches_succeeded", "counter incremented");
    }

    pub fn inc_batches_failed(&self) {
        self.batches_failed.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "batches_failed", "counter incremented");
    }

    /// Add `n` to the issues-collected counter.
    pub fn add_issues(&self, n: u64) {
        self.issues_collected.fetch_add(n, Ordering::Relaxed);
    }

    pub fn inc_artifacts_published(&self) {
        self.artifacts_published.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "artifacts_published", "counter incremented");
    }

    /// Emit all current counter values as a single `info!` event.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            files_loaded = self.files_loaded(),
            files_skipped = self.files_skipped(),
            batches_succeeded = self.batches_succeeded(),
            batches_failed = self.batches_failed(),
            issues_collected = self.issues_collected(),
            artifacts_published = self.artifacts_published(),
        );
    }

    pub fn files_loaded(&self) -> u64 {
        self.files_loaded.load(Ordering::Relaxed)
    }

    pub fn files_skipped(&self) -> u64 {
        self.files_skipped.load(Ordering::Relaxed)
    }

    pub fn batches_succeeded(&self) -> u64 {
        self.batches_succeeded.load(Ordering::Relaxed)
    }

    pub fn batches_failed(&self) -> u64 {
        self.batches_failed.load(Ordering::Relaxed)
    }

    pub fn issues_collected(&self) -> u64 {
        self.issues_collected.load(Ordering::Relaxed)
    }

    pub fn artifacts_published(&self) -> u64 {
        self.artifacts_published.load(Ordering::Relaxed)
    }
}
