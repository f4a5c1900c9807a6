//! Backend descriptors and the service registry contract.
//!
//! The [`ServiceRegistry`] trait is the single kernel-level abstraction for
//! discovering and managing the guard backends the gateway can route to.
//! Concrete implementations (in-memory, service-mesh, …) live in
//! `sentra-gateway` or plugin crates.

use super::error::ConfigError;
use super::types::Capability;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Health status
// ─────────────────────────────────────────────────────────────────────────────

/// Last-known health state of a backend, updated by health-check results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum BackendHealth {
    /// Health has not yet been checked since registration.
    #[default]
    Unknown,
    /// Backend is responding normally.
    Healthy,
    /// Backend is responding but with elevated latency or partial errors.
    Degraded,
    /// Backend is not responding or returning errors.
    Unhealthy,
}

impl BackendHealth {
    /// Stable lowercase name used in events and admin responses.
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendHealth::Unknown => "unknown",
            BackendHealth::Healthy => "healthy",
            BackendHealth::Degraded => "degraded",
            BackendHealth::Unhealthy => "unhealthy",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// BackendDescriptor
// ─────────────────────────────────────────────────────────────────────────────

/// Full description of a guard backend known to the registry.
///
/// Owned exclusively by the [`ServiceRegistry`]: mutated only by health-check
/// results or explicit register/unregister calls, destroyed on unregister.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BackendDescriptor {
    /// Unique stable identifier (must not be empty).
    pub name: String,
    /// The capability this backend implements.
    pub capability: Capability,
    /// Invoke URL the gateway POSTs transformed payloads to
    /// (e.g. `http://trust-guard.internal:8080/v1/analyze`).
    pub base_address: String,
    /// Last-known health state.
    #[serde(default)]
    pub health: BackendHealth,
    /// When `health` was last updated; `None` until the first update.
    #[serde(default)]
    pub last_checked: Option<DateTime<Utc>>,
}

impl BackendDescriptor {
    /// Construct a minimal descriptor.
    pub fn new(
        name: impl Into<String>,
        capability: Capability,
        base_address: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            capability,
            base_address: base_address.into(),
            health: BackendHealth::Unknown,
            last_checked: None,
        }
    }

    /// Basic sanity checks run during
    /// [`OrchestratorConfig::validate()`](super::validation::OrchestratorConfig::validate)
    /// and at registration time.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::EmptyBackendName);
        }
        if self.base_address.trim().is_empty() {
            return Err(ConfigError::InvalidBaseAddress(
                self.name.clone(),
                "base address cannot be empty".to_string(),
            ));
        }
        if !self.base_address.starts_with("http://") && !self.base_address.starts_with("https://") {
            return Err(ConfigError::InvalidBaseAddress(
                self.name.clone(),
                format!(
                    "base address '{}' must start with http:// or https://",
                    self.base_address
                ),
            ));
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ServiceRegistry trait
// ─────────────────────────────────────────────────────────────────────────────

/// Kernel contract for the backend service registry.
///
/// Implementations store [`BackendDescriptor`]s and expose lookup and
/// resolution operations used by the router and the admin surface.  The
/// trait is intentionally synchronous: callers share an implementation
/// behind an async lock (concurrent reads, exclusive writes).
pub trait ServiceRegistry: Send + Sync {
    /// Register a backend.  Registration is idempotent by name —
    /// re-registering replaces the existing descriptor.
    ///
    /// Returns [`ConfigError::AmbiguousCapability`] if a *different* backend
    /// already claims the same capability.
    fn register(&mut self, descriptor: BackendDescriptor) -> Result<(), ConfigError>;

    /// Remove a backend by name.  In-flight calls against it are not
    /// cancelled; only new resolutions are prevented.
    ///
    /// Returns [`ConfigError::BackendNotFound`] if the name is absent.
    fn unregister(&mut self, name: &str) -> Result<(), ConfigError>;

    /// Look up a backend by its unique name.  Returns `None` if not found.
    fn lookup(&self, name: &str) -> Option<&BackendDescriptor>;

    /// Resolve the single backend declaring `capability`.
    /// Returns `None` when no backend is registered for it.
    fn resolve(&self, capability: Capability) -> Option<&BackendDescriptor>;

    /// Return all registered backends.
    fn list_all(&self) -> Vec<&BackendDescriptor>;

    /// Update the health state of a registered backend, stamping
    /// `last_checked`.
    ///
    /// Returns [`ConfigError::BackendNotFound`] if the name is absent.
    fn update_health(&mut self, name: &str, health: BackendHealth) -> Result<(), ConfigError>;
}
