//! Running counters for the admission path.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;

/// Lock-free counters updated on every admission check.
///
/// Kept off the shard and counter locks so metrics add no contention to
/// the hot path.
#[derive(Debug, Default)]
pub(crate) struct LimiterMetrics {
    total_requests: AtomicU64,
    blocked_requests: AtomicU64,
}

impl LimiterMetrics {
    pub(crate) fn record_request(&self) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_blocked(&self) {
        self.blocked_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(
        &self,
        active_clients: usize,
        cleanup_interval: Duration,
    ) -> MetricsSnapshot {
        MetricsSnapshot {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            blocked_requests: self.blocked_requests.load(Ordering::Relaxed),
            active_clients,
            cleanup_interval_ms: cleanup_interval.as_millis() as u64,
        }
    }
}

/// Point-in-time view of the limiter, as served on the metrics endpoint.
///
/// `active_clients` sums the shard sizes one shard at a time, so it can be
/// slightly stale with respect to concurrent inserts and sweeps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    /// Admission checks performed since the limiter was created.
    pub total_requests: u64,
    /// Checks that were denied.
    pub blocked_requests: u64,
    /// Distinct client keys with a live counter.
    pub active_clients: usize,
    /// Period of the background reclamation sweep.
    pub cleanup_interval_ms: u64,
}
