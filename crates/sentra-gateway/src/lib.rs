//! `sentra-gateway` — Sentra orchestration gateway runtime.
//!
//! This crate provides the concrete implementations of the orchestration
//! kernel contracts defined in `sentra_kernel::orchestration`:
//!
//! | Kernel contract | Implementation |
//! |----------------|----------------|
//! | [`ServiceRegistry`](sentra_kernel::orchestration::ServiceRegistry) | [`registry::InMemoryServiceRegistry`] |
//! | [`PayloadTransformer`](sentra_kernel::orchestration::PayloadTransformer) | [`transform::TransformerTable`] + per-capability transformers |
//! | [`BackendTransport`](sentra_kernel::orchestration::BackendTransport) | [`transport::HttpBackendTransport`] |
//! | [`EventHandler`](sentra_kernel::orchestration::EventHandler) | [`events::LoggingHandler`] |
//!
//! [`router::OrchestrationRouter`] composes them into the per-request
//! façade; [`executor::ParallelExecutor`] adds bounded-concurrency batch
//! and pipeline execution; [`server::GatewayServer`] wires everything into
//! an axum HTTP service with graceful drain on shutdown.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use sentra_gateway::server::{GatewayServer, GatewayServerConfig};
//! use sentra_kernel::orchestration::{
//!     BackendDescriptor, Capability, OrchestratorConfig,
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = OrchestratorConfig::new("sentra-gw").with_backend(
//!         BackendDescriptor::new(
//!             "trust-guard",
//!             Capability::TrustValidation,
//!             "http://trust-guard.internal:8080/v1/analyze",
//!         ),
//!     );
//!
//!     let server = GatewayServer::new(GatewayServerConfig::default());
//!     server.start(config).await.unwrap();
//! }
//! ```

pub mod breaker;
pub mod drain;
pub mod error;
pub mod events;
pub mod executor;
pub mod registry;
pub mod router;
pub mod server;
pub mod transform;
pub mod transport;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export the kernel orchestration types for convenience.
pub use sentra_kernel::orchestration;
