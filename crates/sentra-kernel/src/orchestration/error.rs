//! Error types for the orchestration kernel contract.
//!
//! [`ConfigError`] covers every failure mode that can be detected at
//! *definition time* — empty names, duplicate registrations, ambiguous
//! capability claims, invalid configuration values — before any network I/O
//! occurs.  [`OrchestrationError`] is the runtime failure taxonomy surfaced
//! by the router; each variant maps to a stable wire code via
//! [`error_code()`](OrchestrationError::error_code).

use super::types::Capability;
use thiserror::Error;

// ─────────────────────────────────────────────────────────────────────────────
// ConfigError
// ─────────────────────────────────────────────────────────────────────────────

/// Definition-time / configuration error type.
///
/// All variants are `#[non_exhaustive]` at the enum level so future releases
/// can add new failure modes without breaking existing `match` arms.
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    // ── Identity ────────────────────────────────────────────────────────────
    /// The orchestrator `instance_id` field is empty or whitespace-only.
    #[error("orchestrator instance id cannot be empty")]
    EmptyInstanceId,

    // ── Backends ─────────────────────────────────────────────────────────────
    /// A backend `name` field is empty or whitespace-only.
    #[error("backend name cannot be empty")]
    EmptyBackendName,

    /// Two backends in the static configuration share the same name.
    #[error("backend '{0}' is declared more than once")]
    DuplicateBackend(String),

    /// No backend with this name is currently registered.
    #[error("backend '{0}' is not registered")]
    BackendNotFound(String),

    /// Two different backends claim the same capability.  Capability
    /// resolution must never be a silent runtime choice between candidates.
    #[error("capability '{capability}' is claimed by both '{first}' and '{second}'")]
    AmbiguousCapability {
        capability: Capability,
        first: String,
        second: String,
    },

    /// A backend base address is syntactically invalid.
    #[error("backend '{0}' has an invalid base address: {1}")]
    InvalidBaseAddress(String, String),

    // ── Limits ───────────────────────────────────────────────────────────────
    /// `default_timeout_ms` is zero, which would reject every request.
    #[error("default request timeout must be greater than 0 ms")]
    InvalidTimeout,

    /// The circuit breaker failure threshold is zero, which would open the
    /// breaker before any call is attempted.
    #[error("circuit breaker failure threshold must be greater than 0")]
    InvalidThreshold,

    /// `max_concurrent` is zero, which would stall every batch.
    #[error("max concurrent calls must be greater than 0")]
    InvalidConcurrency,
}

// ─────────────────────────────────────────────────────────────────────────────
// OrchestrationError
// ─────────────────────────────────────────────────────────────────────────────

/// Runtime failure taxonomy for one orchestration call.
///
/// These are routine, expected outcomes — breaker rejections, deadline
/// misses, unreachable backends — modeled as values rather than panics.
/// The router never retries internally: one real attempt maps to one
/// recorded breaker outcome, so retry policy belongs to the caller.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum OrchestrationError {
    /// Registry miss — no backend declares the requested capability.
    /// A caller error; never retried.
    #[error("no backend registered for capability '{0}'")]
    BackendNotConfigured(Capability),

    /// Breaker rejection surfaced as a degraded response because the caller
    /// enabled fallback.  The caller may retry after the breaker window.
    #[error("circuit breaker for backend '{0}' is open")]
    CircuitOpen(String),

    /// Breaker rejection with fallback disabled.
    #[error("backend '{0}' is unavailable (circuit open)")]
    ServiceUnavailable(String),

    /// The per-call deadline elapsed.  Counted as a breaker failure.
    #[error("call to backend '{backend}' exceeded {timeout_ms} ms")]
    Timeout { backend: String, timeout_ms: u64 },

    /// Payload transformation failed — unrecognized capability or malformed
    /// payload.  Fails closed; a configuration-level bug, not charged to
    /// the breaker.
    #[error("payload transform failed for capability '{capability}': {reason}")]
    Transform { capability: String, reason: String },

    /// The backend was reached but answered with a failure.  Counted as a
    /// breaker failure.
    #[error("backend '{backend}' returned an error: {detail}")]
    Downstream { backend: String, detail: String },
}

impl OrchestrationError {
    /// Stable wire code for this failure, surfaced in
    /// [`OrchestrationResponse::error_code`](super::types::OrchestrationResponse).
    pub fn error_code(&self) -> &'static str {
        match self {
            OrchestrationError::BackendNotConfigured(_) => "BACKEND_NOT_CONFIGURED",
            OrchestrationError::CircuitOpen(_) => "CIRCUIT_OPEN",
            OrchestrationError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            OrchestrationError::Timeout { .. } => "TIMEOUT",
            OrchestrationError::Transform { .. } => "TRANSFORM_ERROR",
            OrchestrationError::Downstream { .. } => "DOWNSTREAM_ERROR",
        }
    }

    /// Whether this failure reflects a real attempt against the backend and
    /// must therefore be recorded on its circuit breaker.
    pub fn counts_as_breaker_failure(&self) -> bool {
        matches!(
            self,
            OrchestrationError::Timeout { .. } | OrchestrationError::Downstream { .. }
        )
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_variant_has_a_stable_code() {
        let cases: Vec<(OrchestrationError, &str)> = vec![
            (
                OrchestrationError::BackendNotConfigured(Capability::TrustValidation),
                "BACKEND_NOT_CONFIGURED",
            ),
            (OrchestrationError::CircuitOpen("g".into()), "CIRCUIT_OPEN"),
            (
                OrchestrationError::ServiceUnavailable("g".into()),
                "SERVICE_UNAVAILABLE",
            ),
            (
                OrchestrationError::Timeout {
                    backend: "g".into(),
                    timeout_ms: 10,
                },
                "TIMEOUT",
            ),
            (
                OrchestrationError::Transform {
                    capability: "trust".into(),
                    reason: "missing text".into(),
                },
                "TRANSFORM_ERROR",
            ),
            (
                OrchestrationError::Downstream {
                    backend: "g".into(),
                    detail: "500".into(),
                },
                "DOWNSTREAM_ERROR",
            ),
        ];
        for (err, code) in cases {
            assert_eq!(err.error_code(), code);
        }
    }

    #[test]
    fn only_attempted_calls_charge_the_breaker() {
        assert!(OrchestrationError::Timeout {
            backend: "g".into(),
            timeout_ms: 10
        }
        .counts_as_breaker_failure());
        assert!(OrchestrationError::Downstream {
            backend: "g".into(),
            detail: "boom".into()
        }
        .counts_as_breaker_failure());

        assert!(!OrchestrationError::BackendNotConfigured(Capability::BiasAudit)
            .counts_as_breaker_failure());
        assert!(!OrchestrationError::CircuitOpen("g".into()).counts_as_breaker_failure());
        assert!(!OrchestrationError::ServiceUnavailable("g".into()).counts_as_breaker_failure());
        assert!(!OrchestrationError::Transform {
            capability: "trust".into(),
            reason: "bad".into()
        }
        .counts_as_breaker_failure());
    }
}
