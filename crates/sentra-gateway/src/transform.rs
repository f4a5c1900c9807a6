//! Capability-specific payload transformers and the transformer table.
//!
//! Each guard backend expects a different payload shape; a
//! [`PayloadTransformer`] maps the caller's generic payload into it.  The
//! [`TransformerTable`] resolves capability → transformer once at startup
//! (a table entry, not a branch scattered across the router) and applies
//! the cross-cutting correlation invariant *after* the capability mapping:
//! `user_id`, `session_id`, and `request_id` are present in every
//! transformed payload, with caller-supplied payload values winning over
//! request-level metadata.

use sentra_kernel::orchestration::{
    Capability, OrchestrationError, OrchestrationRequest, Payload, PayloadTransformer,
};
use serde_json::{json, Value};
use std::collections::HashMap;

/// Default token budget applied by the pruning transformer when the caller
/// does not supply `max_tokens`.
const DEFAULT_TOKEN_BUDGET: u64 = 1024;

fn require_text(capability: Capability, payload: &Payload) -> Result<&str, OrchestrationError> {
    payload
        .get("text")
        .and_then(Value::as_str)
        .ok_or_else(|| OrchestrationError::Transform {
            capability: capability.to_string(),
            reason: "missing required string field 'text'".to_string(),
        })
}

// ─────────────────────────────────────────────────────────────────────────────
// Per-capability transformers
// ─────────────────────────────────────────────────────────────────────────────

/// Trust validation: the guard compares a model response against its input,
/// so the payload splits into `input_text` / `output_text`.
pub struct TrustTransformer;

impl PayloadTransformer for TrustTransformer {
    fn capability(&self) -> Capability {
        Capability::TrustValidation
    }

    fn transform(&self, payload: &Payload) -> Result<Payload, OrchestrationError> {
        let text = require_text(self.capability(), payload)?;
        let output = payload
            .get("response")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let mut out = Payload::new();
        out.insert("input_text".to_string(), json!(text));
        out.insert("output_text".to_string(), json!(output));
        Ok(out)
    }
}

/// Bias audit: the guard scores `content`, optionally restricted to the
/// caller's `categories`.
pub struct BiasTransformer;

impl PayloadTransformer for BiasTransformer {
    fn capability(&self) -> Capability {
        Capability::BiasAudit
    }

    fn transform(&self, payload: &Payload) -> Result<Payload, OrchestrationError> {
        let text = require_text(self.capability(), payload)?;
        let mut out = Payload::new();
        out.insert("content".to_string(), json!(text));
        if let Some(categories) = payload.get("categories") {
            out.insert("categories".to_string(), categories.clone());
        }
        Ok(out)
    }
}

/// Token pruning: the guard trims `text` down to `token_budget` tokens.
pub struct PruneTransformer;

impl PayloadTransformer for PruneTransformer {
    fn capability(&self) -> Capability {
        Capability::TokenPruning
    }

    fn transform(&self, payload: &Payload) -> Result<Payload, OrchestrationError> {
        let text = require_text(self.capability(), payload)?;
        let budget = payload
            .get("max_tokens")
            .and_then(Value::as_u64)
            .unwrap_or(DEFAULT_TOKEN_BUDGET);
        let mut out = Payload::new();
        out.insert("text".to_string(), json!(text));
        out.insert("token_budget".to_string(), json!(budget));
        Ok(out)
    }
}

/// Content scoring: the guard rates `text` against the caller's `criteria`.
pub struct ScoreTransformer;

impl PayloadTransformer for ScoreTransformer {
    fn capability(&self) -> Capability {
        Capability::ContentScoring
    }

    fn transform(&self, payload: &Payload) -> Result<Payload, OrchestrationError> {
        let text = require_text(self.capability(), payload)?;
        let mut out = Payload::new();
        out.insert("text".to_string(), json!(text));
        if let Some(criteria) = payload.get("criteria") {
            out.insert("criteria".to_string(), criteria.clone());
        }
        Ok(out)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// TransformerTable
// ─────────────────────────────────────────────────────────────────────────────

/// Capability → transformer table, resolved once at startup.
///
/// An unrecognized capability fails closed with
/// [`OrchestrationError::Transform`] — the router never passes an unmapped
/// payload through to a backend.
pub struct TransformerTable {
    table: HashMap<Capability, Box<dyn PayloadTransformer>>,
}

impl TransformerTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self {
            table: HashMap::new(),
        }
    }

    /// Create a table with the built-in transformer for every capability.
    pub fn with_defaults() -> Self {
        let mut table = Self::new();
        table.register(Box::new(TrustTransformer));
        table.register(Box::new(BiasTransformer));
        table.register(Box::new(PruneTransformer));
        table.register(Box::new(ScoreTransformer));
        table
    }

    /// Register (or replace) the transformer for its declared capability.
    pub fn register(&mut self, transformer: Box<dyn PayloadTransformer>) {
        self.table.insert(transformer.capability(), transformer);
    }

    /// Map `request.payload` into the backend shape for
    /// `request.capability`, then stamp the correlation fields.
    pub fn transform(
        &self,
        request: &OrchestrationRequest,
    ) -> Result<Payload, OrchestrationError> {
        let transformer = self.table.get(&request.capability).ok_or_else(|| {
            OrchestrationError::Transform {
                capability: request.capability.to_string(),
                reason: "no transformer registered for capability".to_string(),
            }
        })?;
        let mut out = transformer.transform(&request.payload)?;
        stamp_correlation(&mut out, request);
        Ok(out)
    }
}

impl Default for TransformerTable {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Apply the correlation invariant after the capability-specific mapping.
///
/// Caller-supplied payload values win over request-level metadata;
/// `request_id` is always present.
fn stamp_correlation(out: &mut Payload, request: &OrchestrationRequest) {
    if let Some(value) = request.payload.get("user_id") {
        out.insert("user_id".to_string(), value.clone());
    } else if let Some(user_id) = &request.user_id {
        out.insert("user_id".to_string(), json!(user_id));
    }

    if let Some(value) = request.payload.get("session_id") {
        out.insert("session_id".to_string(), value.clone());
    } else if let Some(session_id) = &request.session_id {
        out.insert("session_id".to_string(), json!(session_id));
    }

    match request.payload.get("request_id") {
        Some(value) => {
            out.insert("request_id".to_string(), value.clone());
        }
        None => {
            out.insert("request_id".to_string(), json!(request.request_id()));
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn trust_request() -> OrchestrationRequest {
        OrchestrationRequest::new(Capability::TrustValidation)
            .with_request_id("r1")
            .with_user_id("u1")
            .with_session_id("s1")
            .with_payload_entry("text", "hi")
    }

    #[test]
    fn trust_mapping_carries_correlation_metadata() {
        let table = TransformerTable::with_defaults();
        let out = table.transform(&trust_request()).unwrap();

        assert_eq!(out["input_text"], json!("hi"));
        assert_eq!(out["output_text"], json!(""));
        assert_eq!(out["user_id"], json!("u1"));
        assert_eq!(out["session_id"], json!("s1"));
        assert_eq!(out["request_id"], json!("r1"));
        for key in sentra_kernel::orchestration::CORRELATION_KEYS {
            assert!(out.contains_key(key));
        }
    }

    #[test]
    fn caller_payload_correlation_values_win() {
        let table = TransformerTable::with_defaults();
        let req = trust_request().with_payload_entry("user_id", "payload-user");
        let out = table.transform(&req).unwrap();
        assert_eq!(out["user_id"], json!("payload-user"));
        assert_eq!(out["session_id"], json!("s1"));
    }

    #[test]
    fn absent_optional_correlation_keys_stay_absent() {
        let table = TransformerTable::with_defaults();
        let req = OrchestrationRequest::new(Capability::TrustValidation)
            .with_payload_entry("text", "hi");
        let out = table.transform(&req).unwrap();
        assert!(!out.contains_key("user_id"));
        assert!(!out.contains_key("session_id"));
        assert_eq!(out["request_id"], json!(req.request_id()));
    }

    #[test]
    fn missing_text_fails_closed() {
        let table = TransformerTable::with_defaults();
        let req = OrchestrationRequest::new(Capability::BiasAudit)
            .with_payload_entry("body", "hi");
        let err = table.transform(&req).unwrap_err();
        assert_eq!(err.error_code(), "TRANSFORM_ERROR");
    }

    #[test]
    fn unregistered_capability_fails_closed() {
        let table = TransformerTable::new();
        let err = table.transform(&trust_request()).unwrap_err();
        assert_eq!(err.error_code(), "TRANSFORM_ERROR");
    }

    #[test]
    fn prune_applies_the_default_token_budget() {
        let table = TransformerTable::with_defaults();
        let req = OrchestrationRequest::new(Capability::TokenPruning)
            .with_payload_entry("text", "long context");
        let out = table.transform(&req).unwrap();
        assert_eq!(out["token_budget"], json!(DEFAULT_TOKEN_BUDGET));

        let req = req.with_payload_entry("max_tokens", 256);
        let out = table.transform(&req).unwrap();
        assert_eq!(out["token_budget"], json!(256));
    }

    #[test]
    fn bias_mapping_renames_text_to_content() {
        let table = TransformerTable::with_defaults();
        let req = OrchestrationRequest::new(Capability::BiasAudit)
            .with_payload_entry("text", "statement")
            .with_payload_entry("categories", json!(["demographic"]));
        let out = table.transform(&req).unwrap();
        assert_eq!(out["content"], json!("statement"));
        assert_eq!(out["categories"], json!(["demographic"]));
        assert!(!out.contains_key("text"));
    }
}
