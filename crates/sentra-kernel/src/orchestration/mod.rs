//! Kernel contract for the Sentra orchestration gateway.
//!
//! This module defines the *trait interfaces and data model* for routing
//! logical requests to a fleet of independent guard backends.  No concrete
//! implementations live here — those belong in `sentra-gateway`.
//!
//! # Architecture mapping
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │              sentra-kernel  (this module)                   │
//! │  ServiceRegistry trait     PayloadTransformer trait         │
//! │  BackendTransport trait    EventHandler trait               │
//! │  OrchestrationRequest/Response   OrchestrationError         │
//! │  CircuitState + BreakerConfig    OrchestratorConfig         │
//! └──────────────────────────┬──────────────────────────────────┘
//!                            │  depends on
//! ┌──────────────────────────▼──────────────────────────────────┐
//! │              sentra-gateway  (runtime crate)                │
//! │  InMemoryServiceRegistry: impl ServiceRegistry              │
//! │  CircuitBreaker + CircuitBreakerMap                         │
//! │  TransformerTable  (capability → transformer)               │
//! │  HttpBackendTransport  (reqwest)                            │
//! │  OrchestrationRouter / ParallelExecutor / EventBus          │
//! │  GatewayServer  (axum HTTP surface)                         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick start
//!
//! ```rust
//! use sentra_kernel::orchestration::{
//!     BackendDescriptor, Capability, OrchestrationRequest, OrchestratorConfig,
//! };
//!
//! let config = OrchestratorConfig::new("sentra-gw")
//!     .with_backend(BackendDescriptor::new(
//!         "trust-guard",
//!         Capability::TrustValidation,
//!         "http://trust-guard.internal:8080/v1/analyze",
//!     ));
//! config.validate().expect("orchestrator config is valid");
//!
//! let request = OrchestrationRequest::new(Capability::TrustValidation)
//!     .with_user_id("u1")
//!     .with_payload_entry("text", "hello");
//! assert!(!request.request_id().is_empty());
//! ```

pub mod breaker;
pub mod capability;
pub mod error;
pub mod event;
pub mod transform;
pub mod transport;
pub mod types;
pub mod validation;

// ── Flat re-exports ────────────────────────────────────────────────────────

pub use breaker::{BreakerConfig, BreakerSnapshot, CircuitState};
pub use capability::{BackendDescriptor, BackendHealth, ServiceRegistry};
pub use error::{ConfigError, OrchestrationError};
pub use event::{EventHandler, EventKind, HandlerResult, OrchestrationEvent};
pub use transform::{PayloadTransformer, CORRELATION_KEYS};
pub use transport::BackendTransport;
pub use types::{Capability, OrchestrationRequest, OrchestrationResponse, Payload, DEFAULT_TIMEOUT_MS};
pub use validation::OrchestratorConfig;
