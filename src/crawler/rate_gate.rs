//! Process-wide request pacing
//!
//! A [`RateGate`] guarantees a minimum interval between any two successful
//! acquisitions, across every task sharing it. The only shared state is the
//! timestamp of the last grant, guarded by one lock.
//!
//! The lock is tokio's fair mutex, so waiters are served in arrival order. The
//! lock is held while sleeping, which is what serializes concurrent callers at
//! the pacing interval. Dropping an `acquire` future (for example through a
//! timeout or task abort) releases the lock immediately and records nothing.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Minimum-interval pacing primitive shared by all fetchers of a process
#[derive(Debug)]
pub struct RateGate {
    min_interval: Duration,
    last_grant: Mutex<Option<Instant>>,
}

impl RateGate {
    /// Create a gate enforcing `min_interval` between grants
    #[must_use]
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_grant: Mutex::new(None),
        }
    }

    /// Configured pacing interval
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Wait until a request may be issued
    ///
    /// Returns once at least `min_interval` has passed since the previous
    /// grant. Never fails. Cancel-safe: a dropped waiter leaves no trace.
    pub async fn acquire(&self) {
        let mut last_grant = self.last_grant.lock().await;

        if let Some(previous) = *last_grant {
            let ready_at = previous + self.min_interval;
            if Instant::now() < ready_at {
                tracing::trace!(
                    wait_ms = (ready_at - Instant::now()).as_millis() as u64,
                    "Waiting for rate gate"
                );
                tokio::time::sleep_until(ready_at).await;
            }
        }

        *last_grant = Some(Instant::now());
    }
}

impl Default for RateGate {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}
