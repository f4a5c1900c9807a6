//! Circuit breaker contract types.
//!
//! # States
//! - `Closed`: normal operation, calls pass through
//! - `Open`: backend assumed down, calls fail fast
//! - `HalfOpen`: reset window elapsed, a trial call is permitted
//!
//! # State transitions
//! ```text
//! Closed   → Open:     failure_count >= threshold
//! Open     → HalfOpen: after the reset timeout elapses
//! HalfOpen → Closed:   trial call succeeds (failure_count resets)
//! HalfOpen → Open:     trial call fails (window restarts)
//! ```
//!
//! The runtime breaker lives in `sentra-gateway`; this module carries only
//! the state enum, the tuning knobs, and the snapshot shape surfaced by the
//! admin interface.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

// ─────────────────────────────────────────────────────────────────────────────
// CircuitState
// ─────────────────────────────────────────────────────────────────────────────

/// Admission state of one per-backend circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CircuitState {
    /// Calls permitted; failures accumulate toward the threshold.
    Closed,
    /// Calls rejected without touching the network.
    Open,
    /// Reset window elapsed; a trial call is permitted.
    HalfOpen,
}

impl CircuitState {
    /// Stable name used in snapshots and events.
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "CLOSED",
            CircuitState::Open => "OPEN",
            CircuitState::HalfOpen => "HALF_OPEN",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// BreakerConfig
// ─────────────────────────────────────────────────────────────────────────────

/// Tuning knobs shared by every per-backend breaker in a gateway instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakerConfig {
    /// Consecutive failures that trip a `Closed` breaker to `Open`.
    pub failure_threshold: u32,
    /// How long an `Open` breaker rejects calls before permitting a trial.
    pub reset_timeout: Duration,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            reset_timeout: Duration::from_secs(30),
        }
    }
}

impl BreakerConfig {
    /// Builder: set the failure threshold.
    pub fn with_failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold;
        self
    }

    /// Builder: set the reset timeout.
    pub fn with_reset_timeout(mut self, timeout: Duration) -> Self {
        self.reset_timeout = timeout;
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// BreakerSnapshot
// ─────────────────────────────────────────────────────────────────────────────

/// Point-in-time view of one breaker, surfaced by the admin interface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakerSnapshot {
    /// Effective state at snapshot time (`Open` breakers whose window has
    /// elapsed report as `HalfOpen`).
    pub state: CircuitState,
    /// Failures accumulated since the last success.
    pub failure_count: u32,
    /// Configured trip threshold.
    pub threshold: u32,
    /// Configured reset window in milliseconds.
    pub reset_timeout_ms: u64,
    /// Wall-clock time of the most recent recorded failure.
    pub last_failure_at: Option<DateTime<Utc>>,
}
