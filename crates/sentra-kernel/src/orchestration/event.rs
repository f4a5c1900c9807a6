//! Orchestration events and the handler contract.
//!
//! The event bus is the single seam through which observability
//! collaborators (metrics, tracing, audit sinks) attach to the gateway.
//! The core publishes state changes here and has no direct dependency on
//! any specific observability backend.

use super::capability::BackendHealth;
use super::types::Capability;
use async_trait::async_trait;
use serde::Serialize;

/// Result type for event handlers.  A handler error is logged by the bus
/// and never affects delivery to other handlers or the request outcome.
pub type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

// ─────────────────────────────────────────────────────────────────────────────
// OrchestrationEvent
// ─────────────────────────────────────────────────────────────────────────────

/// A state change published by the gateway core.
#[derive(Debug, Clone, Serialize)]
#[non_exhaustive]
pub enum OrchestrationEvent {
    /// A backend's last-known health changed.
    BackendHealthChanged {
        backend: String,
        health: BackendHealth,
    },
    /// A circuit breaker transitioned to `Open`.
    CircuitBreakerOpened { backend: String },
    /// A circuit breaker transitioned back to `Closed`.
    CircuitBreakerClosed { backend: String },
    /// A call completed successfully.
    RequestRouted {
        request_id: String,
        capability: Capability,
        backend: String,
        elapsed_ms: u64,
    },
    /// A call failed with one of the stable error codes.
    RequestFailed {
        request_id: String,
        capability: Capability,
        error_code: String,
    },
}

impl OrchestrationEvent {
    /// The subscription key for this event.
    pub fn kind(&self) -> EventKind {
        match self {
            OrchestrationEvent::BackendHealthChanged { .. } => EventKind::BackendHealthChanged,
            OrchestrationEvent::CircuitBreakerOpened { .. } => EventKind::CircuitBreakerOpened,
            OrchestrationEvent::CircuitBreakerClosed { .. } => EventKind::CircuitBreakerClosed,
            OrchestrationEvent::RequestRouted { .. } => EventKind::RequestRouted,
            OrchestrationEvent::RequestFailed { .. } => EventKind::RequestFailed,
        }
    }
}

/// Discriminant used to key subscriptions on the event bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EventKind {
    BackendHealthChanged,
    CircuitBreakerOpened,
    CircuitBreakerClosed,
    RequestRouted,
    RequestFailed,
}

// ─────────────────────────────────────────────────────────────────────────────
// EventHandler trait
// ─────────────────────────────────────────────────────────────────────────────

/// Kernel contract for one observability sink subscribed to the bus.
///
/// Handlers execute independently; implementations must be `Send + Sync`
/// and should not block the publishing task for long.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Stable, human-readable identifier for this handler (used in logs).
    fn name(&self) -> &str;

    /// Consume one event.  Errors are logged and isolated by the bus.
    async fn handle(&self, event: &OrchestrationEvent) -> HandlerResult;
}
