//! Axum-based HTTP orchestration gateway.
//!
//! [`GatewayServer`] wires the registry, breakers, transformer table,
//! transport, event bus, and drainer into a running axum service.
//!
//! # Endpoints
//!
//! | Method   | Path | Description |
//! |----------|------|-------------|
//! | `GET`    | `/health` | Liveness check — always `200 OK`. |
//! | `POST`   | `/v1/orchestrate` | Route one request to its guard backend. |
//! | `POST`   | `/v1/orchestrate/batch` | Order-preserving bounded-concurrency batch. |
//! | `POST`   | `/v1/orchestrate/pipeline` | Route one payload through a capability sequence. |
//! | `GET`    | `/v1/backends` | List registered backends as JSON. |
//! | `POST`   | `/admin/backends` | Register (or replace) a backend. |
//! | `DELETE` | `/admin/backends/{name}` | Unregister a backend. |
//! | `PUT`    | `/admin/backends/{name}/health` | Update a backend's health. |
//! | `GET`    | `/admin/circuit-breakers` | Snapshot every breaker. |

use crate::breaker::CircuitBreakerMap;
use crate::drain::RequestDrainer;
use crate::error::{ApiError, ApiResult};
use crate::events::{EventBus, LoggingHandler};
use crate::executor::ParallelExecutor;
use crate::registry::InMemoryServiceRegistry;
use crate::router::OrchestrationRouter;
use crate::transform::TransformerTable;
use crate::transport::HttpBackendTransport;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use sentra_kernel::orchestration::{
    BackendDescriptor, BackendHealth, BackendTransport, Capability, ConfigError,
    OrchestrationEvent, OrchestrationRequest, OrchestratorConfig, Payload, ServiceRegistry,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

// ─────────────────────────────────────────────────────────────────────────────
// Shared application state
// ─────────────────────────────────────────────────────────────────────────────

/// Shared state injected into every axum handler via [`State`] extractor.
#[derive(Clone)]
pub struct AppState {
    router: Arc<OrchestrationRouter>,
    executor: Arc<ParallelExecutor>,
}

impl AppState {
    /// Validate `config` and assemble the full runtime around `transport`.
    pub fn build(
        config: &OrchestratorConfig,
        transport: Arc<dyn BackendTransport>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut registry = InMemoryServiceRegistry::new();
        for backend in &config.backends {
            // Validated above: statically declared backends cannot collide.
            registry.register(backend.clone())?;
        }

        let events = Arc::new(EventBus::new());
        events.subscribe_all(Arc::new(LoggingHandler));

        let router = Arc::new(
            OrchestrationRouter::new(
                registry.shared(),
                Arc::new(CircuitBreakerMap::new(config.breaker)),
                Arc::new(TransformerTable::with_defaults()),
                transport,
                events,
                Arc::new(RequestDrainer::new()),
            )
            .with_default_timeout_ms(config.default_timeout_ms),
        );
        let executor = Arc::new(ParallelExecutor::new(
            Arc::clone(&router),
            config.max_concurrent,
        ));

        Ok(Self { router, executor })
    }

    /// The orchestration router, exposed for embedding and shutdown wiring.
    pub fn router(&self) -> &Arc<OrchestrationRouter> {
        &self.router
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// GatewayServerConfig
// ─────────────────────────────────────────────────────────────────────────────

/// Runtime configuration for [`GatewayServer`].
pub struct GatewayServerConfig {
    /// TCP port to listen on (default: 3000).
    pub port: u16,
    /// How long shutdown waits for in-flight requests to finish.
    pub grace_period: Duration,
}

impl Default for GatewayServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            grace_period: Duration::from_secs(10),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// GatewayServer
// ─────────────────────────────────────────────────────────────────────────────

/// High-level gateway server encapsulating the orchestration runtime and
/// its HTTP surface.
pub struct GatewayServer {
    config: GatewayServerConfig,
}

impl GatewayServer {
    /// Create a new server from the given configuration.
    pub fn new(config: GatewayServerConfig) -> Self {
        Self { config }
    }

    /// Build the axum [`Router`] wired to the provided [`OrchestratorConfig`]
    /// and the real HTTP transport.  Call [`start()`](Self::start) to bind
    /// and serve.
    pub fn build_app(&self, config: &OrchestratorConfig) -> Result<(Router, AppState), ConfigError> {
        let state = AppState::build(config, Arc::new(HttpBackendTransport::new()))?;
        Ok((build_routes(state.clone()), state))
    }

    /// Bind to `0.0.0.0:{port}` and serve until `SIGINT`, then drain
    /// in-flight requests for up to the configured grace period.
    pub async fn start(self, config: OrchestratorConfig) -> std::io::Result<()> {
        let (app, state) = self
            .build_app(&config)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()))?;

        let addr = format!("0.0.0.0:{}", self.config.port);
        info!(addr = %addr, instance_id = %config.instance_id, "orchestration gateway starting");
        let listener = tokio::net::TcpListener::bind(&addr).await?;

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        let drainer = Arc::clone(state.router().drainer());
        if drainer.drain(self.config.grace_period).await {
            info!("drained all in-flight requests");
        } else {
            warn!(
                in_flight = drainer.in_flight(),
                "grace period elapsed with requests still in flight"
            );
        }
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!(error = %error, "failed to install shutdown signal handler");
    } else {
        info!("shutdown signal received; finishing in-flight requests");
    }
}

/// Assemble the route table over a prepared [`AppState`].
pub fn build_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/v1/orchestrate", post(orchestrate_handler))
        .route("/v1/orchestrate/batch", post(batch_handler))
        .route("/v1/orchestrate/pipeline", post(pipeline_handler))
        .route("/v1/backends", get(list_backends_handler))
        .route("/admin/backends", post(register_backend_handler))
        .route("/admin/backends/{name}", axum::routing::delete(unregister_backend_handler))
        .route("/admin/backends/{name}/health", axum::routing::put(update_health_handler))
        .route("/admin/circuit-breakers", get(breaker_snapshots_handler))
        .with_state(state)
}

// ─────────────────────────────────────────────────────────────────────────────
// Request envelopes
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct BatchEnvelope {
    requests: Vec<OrchestrationRequest>,
    #[serde(default)]
    max_concurrent: Option<usize>,
}

#[derive(Deserialize)]
struct PipelineEnvelope {
    #[serde(default)]
    payload: Payload,
    capabilities: Vec<Capability>,
}

#[derive(Deserialize)]
struct RegisterBackendEnvelope {
    name: String,
    capability: Capability,
    base_address: String,
}

#[derive(Deserialize)]
struct HealthEnvelope {
    health: BackendHealth,
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// `GET /health` — liveness probe.
async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "ok", "service": "sentra-gateway" }))
}

/// `POST /v1/orchestrate` — route one request.  Always `200 OK`: failures
/// are carried in the body's `error_code`.
async fn orchestrate_handler(
    State(state): State<AppState>,
    Json(request): Json<OrchestrationRequest>,
) -> impl IntoResponse {
    Json(state.router.submit(request).await)
}

/// `POST /v1/orchestrate/batch` — bounded-concurrency batch, responses in
/// submission order.
async fn batch_handler(
    State(state): State<AppState>,
    Json(envelope): Json<BatchEnvelope>,
) -> impl IntoResponse {
    let responses = state
        .executor
        .submit_parallel(envelope.requests, envelope.max_concurrent)
        .await;
    Json(json!({ "responses": responses }))
}

/// `POST /v1/orchestrate/pipeline` — one payload through an ordered
/// capability sequence; per-stage results keyed by capability name.
async fn pipeline_handler(
    State(state): State<AppState>,
    Json(envelope): Json<PipelineEnvelope>,
) -> ApiResult<impl IntoResponse> {
    if envelope.capabilities.is_empty() {
        return Err(ApiError::InvalidRequest(
            "pipeline requires at least one capability".to_string(),
        ));
    }
    let results = state
        .executor
        .submit_pipeline(envelope.payload, envelope.capabilities)
        .await;
    Ok(Json(json!({ "results": results })))
}

/// `GET /v1/backends` — list registered backends.
async fn list_backends_handler(State(state): State<AppState>) -> impl IntoResponse {
    let registry = state.router.registry().read().await;
    let backends: Vec<serde_json::Value> = registry
        .list_all()
        .iter()
        .map(|d| {
            json!({
                "name": d.name,
                "capability": d.capability,
                "base_address": d.base_address,
                "health": d.health,
                "last_checked": d.last_checked,
            })
        })
        .collect();
    Json(json!({ "backends": backends }))
}

/// `POST /admin/backends` — register (or replace) a guard backend.
async fn register_backend_handler(
    State(state): State<AppState>,
    Json(envelope): Json<RegisterBackendEnvelope>,
) -> ApiResult<impl IntoResponse> {
    let descriptor =
        BackendDescriptor::new(&envelope.name, envelope.capability, &envelope.base_address);
    {
        let mut registry = state.router.registry().write().await;
        registry.register(descriptor)?;
    }
    info!(backend = %envelope.name, capability = %envelope.capability, "backend registered");
    Ok((StatusCode::CREATED, Json(json!({ "registered": envelope.name }))))
}

/// `DELETE /admin/backends/{name}` — unregister a guard backend.
async fn unregister_backend_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<impl IntoResponse> {
    {
        let mut registry = state.router.registry().write().await;
        registry.unregister(&name)?;
    }
    info!(backend = %name, "backend unregistered");
    Ok(StatusCode::NO_CONTENT)
}

/// `PUT /admin/backends/{name}/health` — record a health-check result and
/// publish the change on the event bus.
async fn update_health_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(envelope): Json<HealthEnvelope>,
) -> ApiResult<impl IntoResponse> {
    {
        let mut registry = state.router.registry().write().await;
        registry.update_health(&name, envelope.health)?;
    }
    state
        .router
        .events()
        .publish(OrchestrationEvent::BackendHealthChanged {
            backend: name.clone(),
            health: envelope.health,
        })
        .await;
    Ok(Json(json!({ "backend": name, "health": envelope.health })))
}

/// `GET /admin/circuit-breakers` — per-backend breaker snapshots.
async fn breaker_snapshots_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({ "breakers": state.router.breakers().snapshots() }))
}

// =============================================================================
// Tests
// =============================================================================
