//! Single-request orchestration pipeline.
//!
//! [`OrchestrationRouter::submit`] is the one path every call takes:
//!
//! ```text
//! resolve capability ──► breaker admission ──► transform ──► transport call
//!        │                     │                   │               │
//!        ▼                     ▼                   ▼               ▼
//!  BACKEND_NOT_        CIRCUIT_OPEN /       TRANSFORM_ERROR   record outcome,
//!  CONFIGURED          SERVICE_UNAVAILABLE                    TIMEOUT / DOWNSTREAM
//! ```
//!
//! The router never returns `Err`: every submission yields an
//! [`OrchestrationResponse`], degraded or failed outcomes carrying a stable
//! `error_code`.  Breaker accounting only counts real backend outcomes —
//! rejections and transform failures never move the failure count.

use crate::breaker::{CircuitBreakerMap, CircuitTransition};
use crate::drain::RequestDrainer;
use crate::events::EventBus;
use crate::registry::SharedRegistry;
use crate::transform::TransformerTable;
use sentra_kernel::orchestration::{
    BackendTransport, OrchestrationError, OrchestrationEvent, OrchestrationRequest,
    OrchestrationResponse, Payload, ServiceRegistry, DEFAULT_TIMEOUT_MS,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, instrument};

/// Routes one request through resolution, admission, transformation, and the
/// backend call.  Cheap to clone behind `Arc`; all collaborators are shared.
pub struct OrchestrationRouter {
    registry: SharedRegistry,
    breakers: Arc<CircuitBreakerMap>,
    transformers: Arc<TransformerTable>,
    transport: Arc<dyn BackendTransport>,
    events: Arc<EventBus>,
    drainer: Arc<RequestDrainer>,
    default_timeout_ms: u64,
}

impl OrchestrationRouter {
    pub fn new(
        registry: SharedRegistry,
        breakers: Arc<CircuitBreakerMap>,
        transformers: Arc<TransformerTable>,
        transport: Arc<dyn BackendTransport>,
        events: Arc<EventBus>,
        drainer: Arc<RequestDrainer>,
    ) -> Self {
        Self {
            registry,
            breakers,
            transformers,
            transport,
            events,
            drainer,
            default_timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    /// Builder: set the deadline applied to requests that carry none.
    pub fn with_default_timeout_ms(mut self, ms: u64) -> Self {
        self.default_timeout_ms = ms;
        self
    }

    /// Breaker map handle, shared with the admin surface.
    pub fn breakers(&self) -> &Arc<CircuitBreakerMap> {
        &self.breakers
    }

    /// Registry handle, shared with the admin surface.
    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    /// In-flight tracker, consulted by the shutdown sequence.
    pub fn drainer(&self) -> &Arc<RequestDrainer> {
        &self.drainer
    }

    /// Event bus handle, for attaching additional subscribers.
    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    /// Execute one request end to end.  Infallible by construction: errors
    /// are folded into the response's `error_code`.
    #[instrument(skip(self, request), fields(request_id = %request.request_id(), capability = %request.capability))]
    pub async fn submit(&self, request: OrchestrationRequest) -> OrchestrationResponse {
        let _guard = self.drainer.track();
        let started = Instant::now();

        let outcome = self.route(&request).await;
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        match outcome {
            Ok((backend, data)) => {
                self.events
                    .publish(OrchestrationEvent::RequestRouted {
                        request_id: request.request_id().to_string(),
                        capability: request.capability,
                        backend,
                        elapsed_ms,
                    })
                    .await;
                OrchestrationResponse::ok(request.request_id(), request.capability, data, elapsed_ms)
            }
            Err(error) => {
                self.events
                    .publish(OrchestrationEvent::RequestFailed {
                        request_id: request.request_id().to_string(),
                        capability: request.capability,
                        error_code: error.error_code().to_string(),
                    })
                    .await;
                OrchestrationResponse::err(request.request_id(), request.capability, &error, elapsed_ms)
            }
        }
    }

    /// The fallible core of [`submit`](Self::submit): returns the serving
    /// backend's name alongside its reply.
    async fn route(
        &self,
        request: &OrchestrationRequest,
    ) -> Result<(String, Payload), OrchestrationError> {
        // Clone the descriptor out of the read lock; the call itself must
        // not hold the registry against admin writes.
        let backend = {
            let registry = self.registry.read().await;
            registry
                .resolve(request.capability)
                .cloned()
                .ok_or(OrchestrationError::BackendNotConfigured(request.capability))?
        };

        let breaker = self.breakers.breaker(&backend.name);
        if !breaker.can_execute() {
            debug!(backend = %backend.name, "circuit breaker rejected the call");
            return Err(if request.fallback_enabled {
                OrchestrationError::CircuitOpen(backend.name.clone())
            } else {
                OrchestrationError::ServiceUnavailable(backend.name.clone())
            });
        }

        // Transform failures are caller-side and never touch the breaker.
        let payload = self.transformers.transform(request)?;

        let timeout =
            Duration::from_millis(request.timeout_ms.unwrap_or(self.default_timeout_ms));
        let result = self.transport.call(&backend, &payload, timeout).await;

        match result {
            Ok(data) => {
                if let Some(CircuitTransition::Closed) = breaker.record_success() {
                    self.events
                        .publish(OrchestrationEvent::CircuitBreakerClosed {
                            backend: backend.name.clone(),
                        })
                        .await;
                }
                Ok((backend.name, data))
            }
            Err(error) => {
                if error.counts_as_breaker_failure() {
                    if let Some(CircuitTransition::Opened) = breaker.record_failure() {
                        self.events
                            .publish(OrchestrationEvent::CircuitBreakerOpened {
                                backend: backend.name.clone(),
                            })
                            .await;
                    }
                }
                Err(error)
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
