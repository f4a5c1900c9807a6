//! In-flight call tracking for graceful shutdown.
//!
//! The router takes an [`InFlightGuard`] when it accepts a request; the
//! guard's `Drop` impl decrements the counter, so every accepted call is
//! released exactly once on every exit path.  The shutdown sequence calls
//! [`drain`](RequestDrainer::drain) to wait for the counter to reach zero
//! before severing active calls.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

/// Tracks the number of requests currently inside the router.
#[derive(Default)]
pub struct RequestDrainer {
    in_flight: AtomicUsize,
    idle: Notify,
}

impl RequestDrainer {
    /// Create an idle drainer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one accepted request.  Hold the guard for the request's
    /// full lifetime; dropping it marks completion.
    pub fn track(self: &Arc<Self>) -> InFlightGuard {
        self.in_flight.fetch_add(1, Ordering::AcqRel);
        InFlightGuard {
            drainer: Arc::clone(self),
        }
    }

    /// Requests currently outstanding.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Block until no requests are outstanding or `timeout` elapses.
    /// Returns whether the drain completed.
    pub async fn drain(&self, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, async {
            loop {
                if self.in_flight.load(Ordering::Acquire) == 0 {
                    return;
                }
                let idle = self.idle.notified();
                tokio::pin!(idle);
                // Register the waiter before the re-check: `notify_waiters`
                // stores no permit, so a wakeup between the load and the
                // first poll would otherwise be lost.
                idle.as_mut().enable();
                if self.in_flight.load(Ordering::Acquire) == 0 {
                    return;
                }
                idle.await;
            }
        })
        .await
        .is_ok()
    }
}

/// RAII marker for one in-flight request.
pub struct InFlightGuard {
    drainer: Arc<RequestDrainer>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let previous = self.drainer.in_flight.fetch_sub(1, Ordering::AcqRel);
        if previous == 1 {
            self.drainer.idle.notify_waiters();
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
