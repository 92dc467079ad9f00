//! Sliding-window rate limiting for Muninn Gate.
//!
//! Tracks per-client request history and converts it into allow/deny
//! decisions using a weighted sliding window: a fraction of the previous
//! window's count is blended with the current window's count, so the
//! estimate slides smoothly instead of resetting at window boundaries.
//!
//! # Architecture
//!
//! 1. **WindowCounter** (`counter.rs`): per-client state and the admission
//!    algorithm, guarded by its own lock.
//!
//! 2. **Shard** (`shard.rs`): a partition of the client population — the
//!    key-to-counter map plus the lock guarding structural changes to it.
//!
//! 3. **ShardedLimiter** (`limiter.rs`): the fixed array of shards, key
//!    routing, the `admit` entry point, and the background reclamation
//!    task that removes idle counters.
//!
//! 4. **Metrics** (`metrics.rs`): lock-free request/blocked counters and
//!    the on-demand snapshot.
//!
//! # Example Usage
//!
//! ```ignore
//! use muninn_gate_lib::ShardedLimiter;
//! use std::time::Duration;
//!
//! // 100 requests per client per minute
//! let limiter = ShardedLimiter::new(100, Duration::from_secs(60));
//!
//! if limiter.admit("192.168.1.1") {
//!     // process request
//! } else {
//!     // return 429 Too Many Requests
//! }
//! ```

mod counter;
mod limiter;
mod metrics;
mod shard;

pub use limiter::{ShardedLimiter, SHARD_COUNT};
pub use metrics::MetricsSnapshot;
