//! Orchestrator configuration container and definition-time validation.
//!
//! [`OrchestratorConfig`] aggregates the statically declared backends and
//! the runtime limits, and exposes a single [`validate()`] method that
//! checks all structural invariants *before* any runtime resources are
//! allocated.
//!
//! [`validate()`]: OrchestratorConfig::validate

use super::breaker::BreakerConfig;
use super::capability::BackendDescriptor;
use super::error::ConfigError;
use super::types::{Capability, DEFAULT_TIMEOUT_MS};
use std::collections::HashMap;
use std::collections::HashSet;

/// Default cap on simultaneously in-flight backend calls per batch.
pub const DEFAULT_MAX_CONCURRENT: usize = 10;

// ─────────────────────────────────────────────────────────────────────────────
// OrchestratorConfig
// ─────────────────────────────────────────────────────────────────────────────

/// Top-level orchestrator configuration.
///
/// Call [`validate()`](Self::validate) to check all structural invariants
/// before passing this config to the gateway runtime.  An empty backend
/// list is legal — backends may be registered later through the admin
/// surface, and unresolved capabilities fail with `BACKEND_NOT_CONFIGURED`.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Unique identifier for this gateway instance.
    pub instance_id: String,
    /// Statically declared backends, registered at startup.
    pub backends: Vec<BackendDescriptor>,
    /// Circuit breaker tuning shared by every per-backend breaker.
    pub breaker: BreakerConfig,
    /// Default per-call deadline in milliseconds (must be > 0).
    pub default_timeout_ms: u64,
    /// Default concurrency cap for batch execution (must be > 0).
    pub max_concurrent: usize,
}

impl OrchestratorConfig {
    /// Construct a minimal config with only an instance id.
    pub fn new(instance_id: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            backends: Vec::new(),
            breaker: BreakerConfig::default(),
            default_timeout_ms: DEFAULT_TIMEOUT_MS,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
        }
    }

    /// Builder: add a backend.
    pub fn with_backend(mut self, backend: BackendDescriptor) -> Self {
        self.backends.push(backend);
        self
    }

    /// Builder: set the breaker tuning.
    pub fn with_breaker(mut self, breaker: BreakerConfig) -> Self {
        self.breaker = breaker;
        self
    }

    /// Builder: set the default per-call deadline.
    pub fn with_default_timeout_ms(mut self, ms: u64) -> Self {
        self.default_timeout_ms = ms;
        self
    }

    /// Builder: set the batch concurrency cap.
    pub fn with_max_concurrent(mut self, cap: usize) -> Self {
        self.max_concurrent = cap;
        self
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Validation
    // ─────────────────────────────────────────────────────────────────────────

    /// Validate all structural invariants of this configuration.
    ///
    /// Returns `Ok(())` if the configuration is structurally sound and can
    /// be used to initialise the gateway runtime.  Returns the *first*
    /// detected [`ConfigError`] otherwise.
    ///
    /// Checks performed (in order):
    /// 1. Instance id is non-empty.
    /// 2. `default_timeout_ms` is non-zero.
    /// 3. Breaker failure threshold is non-zero.
    /// 4. `max_concurrent` is non-zero.
    /// 5. Each backend passes its own [`BackendDescriptor::validate()`].
    /// 6. No two backends share the same name.
    /// 7. No two backends claim the same capability.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.instance_id.trim().is_empty() {
            return Err(ConfigError::EmptyInstanceId);
        }
        if self.default_timeout_ms == 0 {
            return Err(ConfigError::InvalidTimeout);
        }
        if self.breaker.failure_threshold == 0 {
            return Err(ConfigError::InvalidThreshold);
        }
        if self.max_concurrent == 0 {
            return Err(ConfigError::InvalidConcurrency);
        }

        let mut names: HashSet<&str> = HashSet::new();
        let mut claims: HashMap<Capability, &str> = HashMap::new();
        for backend in &self.backends {
            backend.validate()?;
            if !names.insert(backend.name.as_str()) {
                return Err(ConfigError::DuplicateBackend(backend.name.clone()));
            }
            if let Some(first) = claims.insert(backend.capability, backend.name.as_str()) {
                return Err(ConfigError::AmbiguousCapability {
                    capability: backend.capability,
                    first: first.to_string(),
                    second: backend.name.clone(),
                });
            }
        }

        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn trust_guard() -> BackendDescriptor {
        BackendDescriptor::new(
            "trust-guard",
            Capability::TrustValidation,
            "http://trust-guard.internal:8080/v1/analyze",
        )
    }

    fn bias_guard() -> BackendDescriptor {
        BackendDescriptor::new(
            "bias-guard",
            Capability::BiasAudit,
            "http://bias-guard.internal:8080/v1/audit",
        )
    }

    fn valid_config() -> OrchestratorConfig {
        OrchestratorConfig::new("sentra-test")
            .with_backend(trust_guard())
            .with_backend(bias_guard())
    }

    // ── Happy path ────────────────────────────────────────────────────────────

    #[test]
    fn valid_config_passes_validation() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn empty_backend_list_is_legal() {
        assert!(OrchestratorConfig::new("sentra-test").validate().is_ok());
    }

    #[test]
    fn custom_breaker_tuning_passes() {
        let cfg = valid_config().with_breaker(
            BreakerConfig::default()
                .with_failure_threshold(3)
                .with_reset_timeout(Duration::from_secs(5)),
        );
        assert!(cfg.validate().is_ok());
    }

    // ── Identity errors ───────────────────────────────────────────────────────

    #[test]
    fn empty_instance_id_returns_error() {
        let cfg = OrchestratorConfig::new("").with_backend(trust_guard());
        assert_eq!(cfg.validate(), Err(ConfigError::EmptyInstanceId));
    }

    #[test]
    fn whitespace_only_instance_id_returns_error() {
        let cfg = OrchestratorConfig::new("   ").with_backend(trust_guard());
        assert_eq!(cfg.validate(), Err(ConfigError::EmptyInstanceId));
    }

    // ── Backend errors ────────────────────────────────────────────────────────

    #[test]
    fn duplicate_backend_name_returns_error() {
        let cfg = OrchestratorConfig::new("gw")
            .with_backend(trust_guard())
            .with_backend(trust_guard()); // same name
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::DuplicateBackend("trust-guard".to_string()))
        );
    }

    #[test]
    fn two_backends_claiming_one_capability_returns_error() {
        let rival = BackendDescriptor::new(
            "trust-guard-b",
            Capability::TrustValidation,
            "http://other.internal:8080/v1/analyze",
        );
        let cfg = OrchestratorConfig::new("gw")
            .with_backend(trust_guard())
            .with_backend(rival);
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::AmbiguousCapability { capability, ref first, ref second })
                if capability == Capability::TrustValidation
                    && first == "trust-guard"
                    && second == "trust-guard-b"
        ));
    }

    #[test]
    fn backend_with_empty_name_returns_error() {
        let bad = BackendDescriptor::new("", Capability::TrustValidation, "http://x/v1");
        let cfg = OrchestratorConfig::new("gw").with_backend(bad);
        assert_eq!(cfg.validate(), Err(ConfigError::EmptyBackendName));
    }

    #[test]
    fn backend_address_without_http_scheme_returns_error() {
        let bad = BackendDescriptor::new("g", Capability::TrustValidation, "ftp://bad");
        let cfg = OrchestratorConfig::new("gw").with_backend(bad);
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidBaseAddress(ref name, _)) if name == "g"
        ));
    }

    // ── Limit errors ──────────────────────────────────────────────────────────

    #[test]
    fn zero_default_timeout_returns_error() {
        let cfg = valid_config().with_default_timeout_ms(0);
        assert_eq!(cfg.validate(), Err(ConfigError::InvalidTimeout));
    }

    #[test]
    fn zero_failure_threshold_returns_error() {
        let cfg =
            valid_config().with_breaker(BreakerConfig::default().with_failure_threshold(0));
        assert_eq!(cfg.validate(), Err(ConfigError::InvalidThreshold));
    }

    #[test]
    fn zero_max_concurrent_returns_error() {
        let cfg = valid_config().with_max_concurrent(0);
        assert_eq!(cfg.validate(), Err(ConfigError::InvalidConcurrency));
    }
}
