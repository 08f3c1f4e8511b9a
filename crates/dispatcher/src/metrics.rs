//! Mirror metrics for observability

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters shared by every mirror task of one dispatcher
#[derive(Debug, Default)]
pub struct MirrorMetrics {
    /// Fan-out calls that scheduled a mirror task
    fanouts: AtomicU64,
    /// Mirror executions started
    launched: AtomicU64,
    /// Mirror executions drained to completion
    succeeded: AtomicU64,
    /// Mirror executions that failed (including panics)
    failed: AtomicU64,
    /// Rows read from mirror cursors
    rows_drained: AtomicU64,
}

impl MirrorMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fanouts(&self) -> u64 {
        self.fanouts.load(Ordering::Relaxed)
    }

    pub fn inc_fanouts(&self) {
        self.fanouts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn launched(&self) -> u64 {
        self.launched.load(Ordering::Relaxed)
    }

    pub fn add_launched(&self, n: u64) {
        self.launched.fetch_add(n, Ordering::Relaxed);
    }

    pub fn succeeded(&self) -> u64 {
        self.succeeded.load(Ordering::Relaxed)
    }

    pub fn inc_succeeded(&self) {
        self.succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    pub fn inc_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_failed(&self, n: u64) {
        self.failed.fetch_add(n, Ordering::Relaxed);
    }

    pub fn rows_drained(&self) -> u64 {
        self.rows_drained.load(Ordering::Relaxed)
    }

    pub fn add_rows_drained(&self, rows: u64) {
        self.rows_drained.fetch_add(rows, Ordering::Relaxed);
    }

    /// Mirror executions started but not yet finished
    pub fn in_flight(&self) -> u64 {
        self.launched()
            .saturating_sub(self.succeeded() + self.failed())
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            fanouts: self.fanouts(),
            launched: self.launched(),
            succeeded: self.succeeded(),
            failed: self.failed(),
            rows_drained: self.rows_drained(),
        }
    }
}

/// Snapshot of mirror metrics (for reporting)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub fanouts: u64,
    pub launched: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub rows_drained: u64,
}
