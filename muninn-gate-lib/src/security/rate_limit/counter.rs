//! Per-client sliding-window state.

use std::time::{Duration, Instant};

/// Tracks request counts within a time window for a single client key.
///
/// The admission estimate blends the previous window's count, weighted by
/// how much of the current window is still remaining, with the current
/// window's count. All three fields are guarded by the mutex of the shard
/// entry that owns this counter.
#[derive(Debug)]
pub(crate) struct WindowCounter {
    /// Requests counted in the previous window.
    prev_count: u64,
    /// Requests counted in the window that began at `window_start`.
    current_count: u64,
    /// Start of the current window. Only ever moves forward.
    window_start: Instant,
}

impl WindowCounter {
    /// Counter for a first-seen client, with that request already counted
    /// and admitted.
    pub(crate) fn first_request(now: Instant) -> Self {
        Self { prev_count: 0, current_count: 1, window_start: now }
    }

    /// Run one admission check and count the request if it is allowed.
    ///
    /// Denied requests are not counted, so a client that keeps hammering
    /// past its limit does not inflate its own baseline for the next
    /// window.
    pub(crate) fn admit(&mut self, now: Instant, window: Duration, max_requests: u64) -> bool {
        let elapsed = now.saturating_duration_since(self.window_start);

        if elapsed > window {
            // Window fully expired: the request rolling it over becomes the
            // first of the new window and is always admitted.
            self.prev_count = self.current_count;
            self.current_count = 1;
            self.window_start = now;
            return true;
        }

        // Weight the previous window by the fraction of the current window
        // still remaining; its influence decays linearly to zero.
        let weight_prev = 1.0 - elapsed.as_secs_f64() / window.as_secs_f64();
        let weighted = (self.prev_count as f64 * weight_prev) as u64 + self.current_count;

        // Strict comparison: the incoming request itself counts against
        // the limit.
        if weighted < max_requests {
            self.current_count += 1;
            true
        } else {
            false
        }
    }

    pub(crate) fn window_start(&self) -> Instant {
        self.window_start
    }
}
