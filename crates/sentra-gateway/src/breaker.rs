//! Per-backend circuit breaker runtime.
//!
//! One [`CircuitBreaker`] guards one backend name.  Admission
//! ([`can_execute()`](CircuitBreaker::can_execute)) is a pure read of the
//! current state and elapsed time; recording an outcome is a separate,
//! explicit mutation performed by the router after the real call completes.
//! Every mutation is a single atomic read-modify-write under the breaker's
//! own lock, so concurrent callers can never tear the failure count.
//!
//! [`CircuitBreakerMap`] creates breakers lazily on first reference to a
//! backend name; a breaker lives for the process lifetime.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use sentra_kernel::orchestration::{BreakerConfig, BreakerSnapshot, CircuitState};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

// ─────────────────────────────────────────────────────────────────────────────
// CircuitBreaker
// ─────────────────────────────────────────────────────────────────────────────

/// State transition produced by recording an outcome, published on the
/// event bus by the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitTransition {
    /// The breaker tripped (or re-tripped after a failed trial call).
    Opened,
    /// A trial call succeeded and the breaker reset.
    Closed,
}

struct BreakerInner {
    state: CircuitState,
    failure_count: u32,
    /// Monotonic instant of the most recent failure; drives the reset window.
    last_failure: Option<Instant>,
    /// Wall-clock twin of `last_failure`, surfaced in snapshots.
    last_failure_at: Option<DateTime<Utc>>,
}

/// Failure tracker and admission gate for a single backend.
pub struct CircuitBreaker {
    config: BreakerConfig,
    inner: Mutex<BreakerInner>,
}

impl CircuitBreaker {
    /// Create a breaker in the `Closed` state.
    pub fn new(config: BreakerConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(BreakerInner {
                state: CircuitState::Closed,
                failure_count: 0,
                last_failure: None,
                last_failure_at: None,
            }),
        }
    }

    /// Effective state, deriving `HalfOpen` from an `Open` breaker whose
    /// reset window has elapsed.  The stored state is not modified — the
    /// next recorded outcome settles the transition.
    fn effective_state(&self, inner: &BreakerInner) -> CircuitState {
        match inner.state {
            CircuitState::Open => {
                let elapsed = inner
                    .last_failure
                    .map(|at| at.elapsed() >= self.config.reset_timeout)
                    .unwrap_or(true);
                if elapsed {
                    CircuitState::HalfOpen
                } else {
                    CircuitState::Open
                }
            }
            other => other,
        }
    }

    /// Whether a call may be attempted right now.  Pure read: no side
    /// effects, so two concurrent readers observe consistent admission.
    pub fn can_execute(&self) -> bool {
        let inner = self.inner.lock();
        !matches!(self.effective_state(&inner), CircuitState::Open)
    }

    /// Current effective state.
    pub fn state(&self) -> CircuitState {
        let inner = self.inner.lock();
        self.effective_state(&inner)
    }

    /// Failures accumulated since the last success.
    pub fn failure_count(&self) -> u32 {
        self.inner.lock().failure_count
    }

    /// Record a successful call.  Resets the failure count; a trial-call
    /// success closes the breaker.
    pub fn record_success(&self) -> Option<CircuitTransition> {
        let mut inner = self.inner.lock();
        inner.failure_count = 0;
        inner.last_failure = None;
        if inner.state != CircuitState::Closed {
            inner.state = CircuitState::Closed;
            inner.last_failure_at = None;
            Some(CircuitTransition::Closed)
        } else {
            None
        }
    }

    /// Record a failed call.  A failure while the breaker is effectively
    /// half-open re-opens it and restarts the reset window; otherwise the
    /// count increments and trips the breaker at the threshold.
    pub fn record_failure(&self) -> Option<CircuitTransition> {
        let mut inner = self.inner.lock();
        let now = Instant::now();
        let effective = self.effective_state(&inner);
        inner.failure_count = inner.failure_count.saturating_add(1);
        inner.last_failure = Some(now);
        inner.last_failure_at = Some(Utc::now());

        match effective {
            CircuitState::HalfOpen => {
                inner.state = CircuitState::Open;
                Some(CircuitTransition::Opened)
            }
            CircuitState::Closed if inner.failure_count >= self.config.failure_threshold => {
                inner.state = CircuitState::Open;
                Some(CircuitTransition::Opened)
            }
            // Already open: a straggler from a call admitted earlier.
            _ => None,
        }
    }

    /// Point-in-time view for the admin interface.
    pub fn snapshot(&self) -> BreakerSnapshot {
        let inner = self.inner.lock();
        BreakerSnapshot {
            state: self.effective_state(&inner),
            failure_count: inner.failure_count,
            threshold: self.config.failure_threshold,
            reset_timeout_ms: u64::try_from(self.config.reset_timeout.as_millis())
                .unwrap_or(u64::MAX),
            last_failure_at: inner.last_failure_at,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// CircuitBreakerMap
// ─────────────────────────────────────────────────────────────────────────────

/// Lazily populated map of backend name → breaker, shared by the router and
/// the admin surface.  Entries are created on first reference and never
/// destroyed, so breaker accounting survives re-registration.
pub struct CircuitBreakerMap {
    config: BreakerConfig,
    breakers: DashMap<String, Arc<CircuitBreaker>>,
}

impl CircuitBreakerMap {
    /// Create an empty map whose breakers share `config`.
    pub fn new(config: BreakerConfig) -> Self {
        Self {
            config,
            breakers: DashMap::new(),
        }
    }

    /// Fetch (or lazily create) the breaker for `backend`.
    pub fn breaker(&self, backend: &str) -> Arc<CircuitBreaker> {
        self.breakers
            .entry(backend.to_string())
            .or_insert_with(|| Arc::new(CircuitBreaker::new(self.config)))
            .clone()
    }

    /// Snapshots of every breaker referenced so far, keyed by backend name.
    pub fn snapshots(&self) -> HashMap<String, BreakerSnapshot> {
        self.breakers
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().snapshot()))
            .collect()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn fast_config() -> BreakerConfig {
        BreakerConfig::default()
            .with_failure_threshold(3)
            .with_reset_timeout(Duration::from_millis(50))
    }

    #[test]
    fn starts_closed_and_admits_calls() {
        let breaker = CircuitBreaker::new(fast_config());
        assert_eq!(breaker.state(), CircuitState::Closed);
        assert!(breaker.can_execute());
    }

    #[test]
    fn opens_after_exactly_threshold_failures() {
        let breaker = CircuitBreaker::new(fast_config());
        assert_eq!(breaker.record_failure(), None);
        assert_eq!(breaker.record_failure(), None);
        assert!(breaker.can_execute(), "still closed below the threshold");

        assert_eq!(breaker.record_failure(), Some(CircuitTransition::Opened));
        assert_eq!(breaker.state(), CircuitState::Open);
        assert!(!breaker.can_execute());
    }

    #[test]
    fn success_resets_the_failure_count() {
        let breaker = CircuitBreaker::new(fast_config());
        breaker.record_failure();
        breaker.record_failure();
        assert_eq!(breaker.record_success(), None);
        assert_eq!(breaker.failure_count(), 0);

        // The reset count means two more failures do not trip it.
        breaker.record_failure();
        breaker.record_failure();
        assert!(breaker.can_execute());
    }

    #[test]
    fn reset_window_elapse_permits_a_trial_without_resetting_count() {
        let breaker = CircuitBreaker::new(fast_config());
        for _ in 0..3 {
            breaker.record_failure();
        }
        assert!(!breaker.can_execute());

        std::thread::sleep(Duration::from_millis(60));
        assert!(breaker.can_execute());
        assert_eq!(breaker.state(), CircuitState::HalfOpen);
        assert_eq!(breaker.failure_count(), 3, "count holds until a success");
    }

    #[test]
    fn trial_failure_reopens_and_restarts_the_window() {
        let breaker = CircuitBreaker::new(fast_config());
        for _ in 0..3 {
            breaker.record_failure();
        }
        std::thread::sleep(Duration::from_millis(60));
        assert_eq!(breaker.state(), CircuitState::HalfOpen);

        assert_eq!(breaker.record_failure(), Some(CircuitTransition::Opened));
        assert_eq!(breaker.state(), CircuitState::Open);
        assert!(!breaker.can_execute(), "window restarted by the trial failure");
    }

    #[test]
    fn trial_success_closes_the_breaker() {
        let breaker = CircuitBreaker::new(fast_config());
        for _ in 0..3 {
            breaker.record_failure();
        }
        std::thread::sleep(Duration::from_millis(60));

        assert_eq!(breaker.record_success(), Some(CircuitTransition::Closed));
        assert_eq!(breaker.state(), CircuitState::Closed);
        assert_eq!(breaker.failure_count(), 0);
        assert!(breaker.can_execute());
    }

    #[test]
    fn map_creates_lazily_and_reuses_instances() {
        let map = CircuitBreakerMap::new(fast_config());
        assert!(map.snapshots().is_empty());

        let a = map.breaker("trust-guard");
        let b = map.breaker("trust-guard");
        assert!(Arc::ptr_eq(&a, &b));

        a.record_failure();
        let snapshots = map.snapshots();
        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots["trust-guard"].failure_count, 1);
        assert_eq!(snapshots["trust-guard"].threshold, 3);
    }

    #[test]
    fn snapshot_reports_effective_state() {
        let breaker = CircuitBreaker::new(fast_config());
        for _ in 0..3 {
            breaker.record_failure();
        }
        assert_eq!(breaker.snapshot().state, CircuitState::Open);
        assert!(breaker.snapshot().last_failure_at.is_some());

        std::thread::sleep(Duration::from_millis(60));
        assert_eq!(breaker.snapshot().state, CircuitState::HalfOpen);
    }
}
