//! Event bus and the built-in logging sink.
//!
//! The bus fans orchestration events out to subscribed handlers, keyed by
//! [`EventKind`].  Handlers execute independently: a handler error is
//! logged and never affects delivery to other handlers or the caller's
//! request outcome.  This is the single seam through which observability
//! collaborators (metrics, tracing, audit) attach to the gateway core.

use async_trait::async_trait;
use parking_lot::RwLock;
use sentra_kernel::orchestration::{EventHandler, EventKind, HandlerResult, OrchestrationEvent};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

const ALL_KINDS: [EventKind; 5] = [
    EventKind::BackendHealthChanged,
    EventKind::CircuitBreakerOpened,
    EventKind::CircuitBreakerClosed,
    EventKind::RequestRouted,
    EventKind::RequestFailed,
];

// ─────────────────────────────────────────────────────────────────────────────
// EventBus
// ─────────────────────────────────────────────────────────────────────────────

/// Publish/subscribe fan-out keyed by event kind.
#[derive(Default)]
pub struct EventBus {
    handlers: RwLock<HashMap<EventKind, Vec<Arc<dyn EventHandler>>>>,
}

impl EventBus {
    /// Create a bus with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe `handler` to one event kind.
    pub fn subscribe(&self, kind: EventKind, handler: Arc<dyn EventHandler>) {
        self.handlers.write().entry(kind).or_default().push(handler);
    }

    /// Subscribe `handler` to every event kind.
    pub fn subscribe_all(&self, handler: Arc<dyn EventHandler>) {
        for kind in ALL_KINDS {
            self.subscribe(kind, Arc::clone(&handler));
        }
    }

    /// Deliver `event` to every handler subscribed to its kind.
    ///
    /// The subscriber list is cloned out of the lock before any handler
    /// runs, so handlers may themselves subscribe without deadlocking.
    pub async fn publish(&self, event: OrchestrationEvent) {
        let subscribers: Vec<Arc<dyn EventHandler>> = self
            .handlers
            .read()
            .get(&event.kind())
            .cloned()
            .unwrap_or_default();

        for handler in subscribers {
            if let Err(error) = handler.handle(&event).await {
                warn!(
                    handler = handler.name(),
                    error = %error,
                    "event handler failed; continuing delivery"
                );
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// LoggingHandler
// ─────────────────────────────────────────────────────────────────────────────

/// Reference observability sink: logs every event through `tracing`.
pub struct LoggingHandler;

#[async_trait]
impl EventHandler for LoggingHandler {
    fn name(&self) -> &str {
        "event-logger"
    }

    async fn handle(&self, event: &OrchestrationEvent) -> HandlerResult {
        match event {
            OrchestrationEvent::BackendHealthChanged { backend, health } => {
                info!(backend = %backend, health = health.as_str(), "backend health changed");
            }
            OrchestrationEvent::CircuitBreakerOpened { backend } => {
                warn!(backend = %backend, "circuit breaker opened");
            }
            OrchestrationEvent::CircuitBreakerClosed { backend } => {
                info!(backend = %backend, "circuit breaker closed");
            }
            OrchestrationEvent::RequestRouted {
                request_id,
                capability,
                backend,
                elapsed_ms,
            } => {
                info!(
                    request_id = %request_id,
                    capability = %capability,
                    backend = %backend,
                    elapsed_ms,
                    "request routed"
                );
            }
            OrchestrationEvent::RequestFailed {
                request_id,
                capability,
                error_code,
            } => {
                warn!(
                    request_id = %request_id,
                    capability = %capability,
                    error_code = %error_code,
                    "request failed"
                );
            }
            // OrchestrationEvent is #[non_exhaustive]; log unknown variants raw.
            other => info!(event = ?other, "orchestration event"),
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
