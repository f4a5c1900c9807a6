//! Core data types for the orchestration kernel contract.
//!
//! These types are shared across all orchestration traits
//! ([`ServiceRegistry`](super::capability::ServiceRegistry),
//! [`PayloadTransformer`](super::transform::PayloadTransformer),
//! [`BackendTransport`](super::transport::BackendTransport))
//! and carry no runtime dependencies beyond `serde` and `std`.

use super::error::OrchestrationError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Default per-call deadline applied when the caller does not supply one.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Generic key/value payload flowing between the caller and a guard backend.
pub type Payload = HashMap<String, serde_json::Value>;

// ─────────────────────────────────────────────────────────────────────────────
// Capability
// ─────────────────────────────────────────────────────────────────────────────

/// The logical backend function a request targets.
///
/// Each capability is implemented by exactly one registered guard backend;
/// two backends declaring the same capability is a configuration error
/// caught by [`OrchestratorConfig::validate()`](super::validation::OrchestratorConfig::validate)
/// and by the registry at registration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum Capability {
    /// Trust / grounding validation of a model response against its input.
    #[serde(rename = "trust")]
    TrustValidation,
    /// Bias and fairness audit of generated content.
    #[serde(rename = "bias")]
    BiasAudit,
    /// Context-window token pruning.
    #[serde(rename = "prune")]
    TokenPruning,
    /// Generic content quality scoring.
    #[serde(rename = "score")]
    ContentScoring,
}

impl Capability {
    /// Case-insensitive parse from a string slice.
    pub fn from_str_ci(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "trust" => Some(Capability::TrustValidation),
            "bias" => Some(Capability::BiasAudit),
            "prune" => Some(Capability::TokenPruning),
            "score" => Some(Capability::ContentScoring),
            _ => None,
        }
    }

    /// Return the stable wire name for this capability.
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::TrustValidation => "trust",
            Capability::BiasAudit => "bias",
            Capability::TokenPruning => "prune",
            Capability::ContentScoring => "score",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// OrchestrationRequest
// ─────────────────────────────────────────────────────────────────────────────

fn generated_request_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Identity and intent of one orchestration call.
///
/// All fields use owned, allocation-friendly types so the struct can be sent
/// across async task boundaries without lifetime complications.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestrationRequest {
    /// Unique identifier for correlating this call across logs, events, and
    /// the transformed payload.  Generated when the caller supplies none.
    /// Immutable once assigned — it round-trips unmodified into the
    /// transformed payload and the [`OrchestrationResponse`].
    #[serde(default = "generated_request_id")]
    request_id: String,
    /// The backend capability this request targets.
    pub capability: Capability,
    /// Caller-supplied payload, forwarded through the capability transformer.
    #[serde(default)]
    pub payload: Payload,
    /// Correlation-only caller identity.  Never interpreted by the gateway.
    #[serde(default)]
    pub user_id: Option<String>,
    /// Correlation-only session identity.  Never interpreted by the gateway.
    #[serde(default)]
    pub session_id: Option<String>,
    /// Advisory priority.  Accepted and stored but never reorders execution.
    #[serde(default)]
    pub priority: i32,
    /// Per-call deadline ceiling in milliseconds.  `None` defers to the
    /// gateway's configured default.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    /// When `true`, a circuit-breaker rejection yields a degraded response
    /// (`error_code = CIRCUIT_OPEN`) instead of `SERVICE_UNAVAILABLE`.
    #[serde(default)]
    pub fallback_enabled: bool,
}

impl OrchestrationRequest {
    /// Construct a minimal request with a generated `request_id`.
    pub fn new(capability: Capability) -> Self {
        Self {
            request_id: generated_request_id(),
            capability,
            payload: Payload::new(),
            user_id: None,
            session_id: None,
            priority: 0,
            timeout_ms: None,
            fallback_enabled: false,
        }
    }

    /// The immutable call identity.
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Builder: replace the generated id with a caller-supplied one.
    pub fn with_request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = id.into();
        self
    }

    /// Builder: set the full payload map.
    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }

    /// Builder: insert a single payload entry.
    pub fn with_payload_entry(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.payload.insert(key.into(), value.into());
        self
    }

    /// Builder: attach the correlation user id.
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Builder: attach the correlation session id.
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Builder: set the advisory priority.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Builder: set the per-call deadline.
    pub fn with_timeout_ms(mut self, ms: u64) -> Self {
        self.timeout_ms = Some(ms);
        self
    }

    /// Builder: permit a degraded response when the breaker is open.
    pub fn with_fallback(mut self, enabled: bool) -> Self {
        self.fallback_enabled = enabled;
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// OrchestrationResponse
// ─────────────────────────────────────────────────────────────────────────────

/// Normalized result of one orchestration call.
///
/// Every call produces a response — degraded or failed outcomes set
/// `success = false` and populate `error_code` with one of the stable codes
/// from [`OrchestrationError::error_code()`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestrationResponse {
    /// Echo of the submitted request id, unmodified.
    pub request_id: String,
    /// Echo of the targeted capability.
    pub capability: Capability,
    /// Whether the backend call completed successfully.
    pub success: bool,
    /// Backend result payload; `None` on failure.
    pub data: Option<Payload>,
    /// Stable error code; `None` on success.
    pub error_code: Option<String>,
    /// Wall-clock time spent inside the router for this call.
    pub processing_time_ms: u64,
}

impl OrchestrationResponse {
    /// Build a successful response.
    pub fn ok(
        request_id: impl Into<String>,
        capability: Capability,
        data: Payload,
        processing_time_ms: u64,
    ) -> Self {
        Self {
            request_id: request_id.into(),
            capability,
            success: true,
            data: Some(data),
            error_code: None,
            processing_time_ms,
        }
    }

    /// Build a failed (or degraded) response from an orchestration error.
    pub fn err(
        request_id: impl Into<String>,
        capability: Capability,
        error: &OrchestrationError,
        processing_time_ms: u64,
    ) -> Self {
        Self {
            request_id: request_id.into(),
            capability,
            success: false,
            data: None,
            error_code: Some(error.error_code().to_string()),
            processing_time_ms,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capability_wire_names_round_trip() {
        for cap in [
            Capability::TrustValidation,
            Capability::BiasAudit,
            Capability::TokenPruning,
            Capability::ContentScoring,
        ] {
            assert_eq!(Capability::from_str_ci(cap.as_str()), Some(cap));
        }
        assert_eq!(Capability::from_str_ci("TRUST"), Some(Capability::TrustValidation));
        assert_eq!(Capability::from_str_ci("unknown"), None);
    }

    #[test]
    fn new_request_generates_a_request_id() {
        let a = OrchestrationRequest::new(Capability::TrustValidation);
        let b = OrchestrationRequest::new(Capability::TrustValidation);
        assert!(!a.request_id().is_empty());
        assert_ne!(a.request_id(), b.request_id());
    }

    #[test]
    fn caller_supplied_request_id_is_preserved() {
        let req = OrchestrationRequest::new(Capability::BiasAudit).with_request_id("r-42");
        assert_eq!(req.request_id(), "r-42");
    }

    #[test]
    fn deserializing_without_request_id_generates_one() {
        let req: OrchestrationRequest =
            serde_json::from_str(r#"{ "capability": "trust" }"#).unwrap();
        assert!(!req.request_id().is_empty());
        assert!(req.timeout_ms.is_none());
        assert!(!req.fallback_enabled);
    }

    #[test]
    fn response_err_carries_the_stable_error_code() {
        let err = OrchestrationError::BackendNotConfigured(Capability::TrustValidation);
        let resp = OrchestrationResponse::err("r-1", Capability::TrustValidation, &err, 3);
        assert!(!resp.success);
        assert_eq!(resp.error_code.as_deref(), Some("BACKEND_NOT_CONFIGURED"));
        assert_eq!(resp.request_id, "r-1");
        assert!(resp.data.is_none());
    }
}
