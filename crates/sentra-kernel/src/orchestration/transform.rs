//! Payload transformer contract.
//!
//! A transformer maps the caller's generic payload into the shape one guard
//! backend expects.  The correlation invariant — `user_id`, `session_id`,
//! and `request_id` present in every transformed payload — is cross-cutting
//! and applied by the runtime's transformer table *after* the
//! capability-specific mapping, never duplicated per capability.

use super::error::OrchestrationError;
use super::types::{Capability, Payload};

/// Correlation keys guaranteed present in every transformed payload.
/// Caller-supplied payload values win over request-level metadata.
pub const CORRELATION_KEYS: [&str; 3] = ["user_id", "session_id", "request_id"];

/// Kernel contract for a single capability's payload mapping.
///
/// Implementations must be `Send + Sync` so the transformer table can be
/// shared across Tokio tasks without additional synchronization.  Mapping is
/// pure and synchronous: no I/O, no allocation beyond the output map.
pub trait PayloadTransformer: Send + Sync {
    /// The capability whose payload shape this transformer produces.
    fn capability(&self) -> Capability;

    /// Map the caller's payload into the backend-specific shape.
    ///
    /// Returns [`OrchestrationError::Transform`] when the payload is missing
    /// a required field — the mapping fails closed rather than passing an
    /// unusable payload downstream.
    fn transform(&self, payload: &Payload) -> Result<Payload, OrchestrationError>;
}
