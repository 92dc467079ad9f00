//! A bounded partition of the tracked client population.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use ahash::AHashMap;
use tracing::warn;

use super::counter::WindowCounter;

pub(crate) type CounterHandle = Arc<Mutex<WindowCounter>>;

/// One shard of the limiter: the clients that route here, plus the lock
/// guarding structural changes (insert, delete, size, iteration) to that
/// map.
///
/// Counter state is guarded by each entry's own mutex, so concurrent
/// requests from different clients in the same shard only contend for the
/// brief map lookup, not for each other's admission checks.
#[derive(Debug, Default)]
pub(crate) struct Shard {
    clients: Mutex<AHashMap<String, CounterHandle>>,
}

impl Shard {
    /// Look up the counter for `key`, creating it on first sight.
    ///
    /// Returns `None` when the key was not tracked yet: the new counter is
    /// inserted with this request already counted and admitted, so the
    /// caller has nothing left to check.
    pub(crate) fn find_or_create(&self, key: &str, now: Instant) -> Option<CounterHandle> {
        let mut clients = self.clients.lock().unwrap_or_else(PoisonError::into_inner);
        match clients.get(key) {
            Some(counter) => Some(Arc::clone(counter)),
            None => {
                let counter = Arc::new(Mutex::new(WindowCounter::first_request(now)));
                clients.insert(key.to_owned(), counter);
                None
            }
        }
    }

    /// Number of clients currently tracked by this shard.
    pub(crate) fn len(&self) -> usize {
        self.clients.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Drop every counter whose window started before `threshold`.
    ///
    /// A poisoned counter mutex means a holder panicked mid-update; the
    /// entry is discarded and the sweep moves on, so one bad entry cannot
    /// stop reclamation for the rest of the shard.
    pub(crate) fn sweep(&self, threshold: Instant) -> usize {
        let mut clients = self.clients.lock().unwrap_or_else(PoisonError::into_inner);
        let before = clients.len();
        clients.retain(|key, counter| match counter.lock() {
            Ok(counter) => counter.window_start() >= threshold,
            Err(_) => {
                warn!(client = %key, "dropping client with poisoned counter lock");
                false
            }
        });
        before - clients.len()
    }
}
