//! Counters for forwarding outcomes.

use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Shared forwarding counters.
///
/// Cloning shares the counters.
#[derive(Debug, Clone, Default)]
pub struct ForwardMetrics {
    inner: Arc<ForwardMetricsInner>,
}

#[derive(Debug, Default)]
struct ForwardMetricsInner {
    delivered: AtomicU64,
    rate_limited: AtomicU64,
    abandoned: AtomicU64,
    skipped: AtomicU64,
}

/// Point-in-time copy of [`ForwardMetrics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct MetricsSnapshot {
    /// Messages the provider accepted.
    pub delivered: u64,
    /// Rate-limit rejections received.
    pub rate_limited: u64,
    /// Live or queued messages dropped after a permanent error.
    pub abandoned: u64,
    /// Bulk items skipped after a permanent error.
    pub skipped: u64,
}

impl ForwardMetrics {
    /// Creates zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a delivered message.
    pub fn record_delivered(&self) {
        self.inner.delivered.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a rate-limit rejection.
    pub fn record_rate_limited(&self) {
        self.inner.rate_limited.fetch_add(1, Ordering::Relaxed);
    }

    /// Records an abandoned message.
    pub fn record_abandoned(&self) {
        self.inner.abandoned.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a skipped bulk item.
    pub fn record_skipped(&self) {
        self.inner.skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Gets a snapshot of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            delivered: self.inner.delivered.load(Ordering::Relaxed),
            rate_limited: self.inner.rate_limited.load(Ordering::Relaxed),
            abandoned: self.inner.abandoned.load(Ordering::Relaxed),
            skipped: self.inner.skipped.load(Ordering::Relaxed),
        }
    }
}
