//! The sharded limiter: key routing, admission, reclamation.

use std::sync::{Arc, PoisonError, Weak};
use std::time::{Duration, Instant};

use ahash::RandomState;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::metrics::{LimiterMetrics, MetricsSnapshot};
use super::shard::Shard;

/// Number of shards the client population is spread over.
///
/// Fixed for the lifetime of a limiter; routing depends on it never
/// changing after construction.
pub const SHARD_COUNT: usize = 256;

/// Sharded sliding-window rate limiter.
///
/// Client keys are spread over [`SHARD_COUNT`] shards to bound lock
/// contention; each client's history lives in its own counter behind its
/// own lock. A background task owned by the limiter reclaims counters that
/// have been idle for two full windows; dropping the limiter stops the
/// task.
pub struct ShardedLimiter {
    shards: Vec<Shard>,
    hasher: RandomState,
    max_requests: u64,
    window: Duration,
    cleanup_interval: Duration,
    metrics: LimiterMetrics,
    shutdown: CancellationToken,
}

impl ShardedLimiter {
    /// Create a limiter admitting `max_requests` per client per `window`
    /// and start its reclamation task.
    ///
    /// Must be called from within a Tokio runtime. A `max_requests` of
    /// zero still admits each client's very first request: the counter is
    /// created already counting the request that created it.
    ///
    /// # Panics
    /// Panics if `window` is zero.
    pub fn new(max_requests: u64, window: Duration) -> Arc<Self> {
        assert!(!window.is_zero(), "window duration must be positive");

        let limiter = Arc::new(Self {
            shards: (0..SHARD_COUNT).map(|_| Shard::default()).collect(),
            hasher: RandomState::new(),
            max_requests,
            window,
            cleanup_interval: window * 2,
            metrics: LimiterMetrics::default(),
            shutdown: CancellationToken::new(),
        });
        spawn_reclaimer(&limiter);
        limiter
    }

    /// Decide whether a request from `client_key` may proceed.
    ///
    /// Never fails: every key yields a decision, and the first request
    /// from a key is always admitted.
    pub fn admit(&self, client_key: &str) -> bool {
        self.metrics.record_request();

        let now = Instant::now();
        let shard = &self.shards[self.route(client_key)];
        let allowed = match shard.find_or_create(client_key, now) {
            // First sighting: admitted when the counter was created.
            None => true,
            Some(counter) => {
                // The shard lock is already released; only this client's
                // counter lock is held for the check.
                let mut counter = counter.lock().unwrap_or_else(PoisonError::into_inner);
                counter.admit(now, self.window, self.max_requests)
            }
        };

        if !allowed {
            self.metrics.record_blocked();
        }
        allowed
    }

    /// Point-in-time view of the limiter's counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let active_clients = self.shards.iter().map(Shard::len).sum();
        self.metrics.snapshot(active_clients, self.cleanup_interval)
    }

    /// Maximum requests per client per window.
    pub fn max_requests(&self) -> u64 {
        self.max_requests
    }

    /// Length of the sliding window.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Period of the background reclamation sweep.
    pub fn cleanup_interval(&self) -> Duration {
        self.cleanup_interval
    }

    /// Route a client key to its shard. Pure for the limiter's lifetime:
    /// the hasher is seeded once at construction.
    fn route(&self, client_key: &str) -> usize {
        (self.hasher.hash_one(client_key) % SHARD_COUNT as u64) as usize
    }

    /// Remove counters idle for at least two full windows from all shards.
    fn sweep_stale(&self) {
        let Some(threshold) = Instant::now().checked_sub(self.window * 2) else {
            // Process younger than two windows: nothing can be stale yet.
            return;
        };

        let mut removed = 0usize;
        for shard in &self.shards {
            removed += shard.sweep(threshold);
        }
        if removed > 0 {
            debug!(removed, "reclaimed idle client counters");
        }
    }
}

impl Drop for ShardedLimiter {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Start the periodic sweep for `limiter`.
///
/// The task holds only a weak reference so it never keeps the limiter
/// alive; the cancellation token, cancelled on drop, ends it promptly.
fn spawn_reclaimer(limiter: &Arc<ShardedLimiter>) {
    let weak: Weak<ShardedLimiter> = Arc::downgrade(limiter);
    let shutdown = limiter.shutdown.clone();
    let period = limiter.cleanup_interval;

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick of an interval completes immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    let Some(limiter) = weak.upgrade() else { break };
                    limiter.sweep_stale();
                }
            }
        }
    });
}
