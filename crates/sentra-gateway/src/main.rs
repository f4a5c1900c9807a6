//! Sentra orchestration gateway — entry point.
//!
//! Reads configuration from environment variables and starts the axum-based
//! HTTP gateway service.
//!
//! # Environment variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SENTRA_PORT` | `3000` | TCP port to listen on. |
//! | `SENTRA_INSTANCE_ID` | `sentra-gateway` | Gateway instance identifier. |
//! | `SENTRA_BACKENDS` | *(none)* | Comma-separated `name=capability=url` triples. |
//! | `SENTRA_BREAKER_THRESHOLD` | `5` | Consecutive failures before a breaker opens. |
//! | `SENTRA_BREAKER_RESET_MS` | `30000` | Open-state window before a trial call. |
//! | `SENTRA_DEFAULT_TIMEOUT_MS` | `30000` | Default per-call deadline. |
//! | `SENTRA_MAX_CONCURRENT` | `10` | Batch concurrency cap. |
//! | `SENTRA_GRACE_PERIOD_MS` | `10000` | Shutdown drain window. |

use sentra_gateway::server::{GatewayServer, GatewayServerConfig};
use sentra_kernel::orchestration::{
    BackendDescriptor, BreakerConfig, Capability, OrchestratorConfig,
};
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Parse the `SENTRA_BACKENDS` list.  Malformed entries are skipped with a
/// warning rather than aborting startup.
fn parse_backends(raw: &str) -> Vec<BackendDescriptor> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .filter_map(|entry| {
            let mut parts = entry.splitn(3, '=');
            match (parts.next(), parts.next(), parts.next()) {
                (Some(name), Some(capability), Some(url)) => {
                    match Capability::from_str_ci(capability) {
                        Some(capability) => {
                            Some(BackendDescriptor::new(name.trim(), capability, url.trim()))
                        }
                        None => {
                            warn!(entry, capability, "unknown capability; skipping backend");
                            None
                        }
                    }
                }
                _ => {
                    warn!(entry, "expected name=capability=url; skipping backend");
                    None
                }
            }
        })
        .collect()
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(
            "sentra_gateway=info".parse().expect("static directive parses"),
        ))
        .init();

    let port: u16 = env_parse("SENTRA_PORT", 3000);
    let instance_id =
        std::env::var("SENTRA_INSTANCE_ID").unwrap_or_else(|_| "sentra-gateway".to_string());

    let backends = parse_backends(&std::env::var("SENTRA_BACKENDS").unwrap_or_default());
    if backends.is_empty() {
        warn!(
            "SENTRA_BACKENDS is not set — starting with an empty registry; \
             register backends through the admin interface"
        );
    }

    let breaker = BreakerConfig::default()
        .with_failure_threshold(env_parse("SENTRA_BREAKER_THRESHOLD", 5))
        .with_reset_timeout(Duration::from_millis(env_parse(
            "SENTRA_BREAKER_RESET_MS",
            30_000,
        )));

    let mut config = OrchestratorConfig::new(&instance_id)
        .with_breaker(breaker)
        .with_default_timeout_ms(env_parse("SENTRA_DEFAULT_TIMEOUT_MS", 30_000))
        .with_max_concurrent(env_parse("SENTRA_MAX_CONCURRENT", 10));
    for backend in backends {
        config = config.with_backend(backend);
    }

    info!(
        port,
        instance_id = %instance_id,
        backends = config.backends.len(),
        "orchestration gateway configuration loaded"
    );

    let server = GatewayServer::new(GatewayServerConfig {
        port,
        grace_period: Duration::from_millis(env_parse("SENTRA_GRACE_PERIOD_MS", 10_000)),
    });

    if let Err(e) = server.start(config).await {
        eprintln!("gateway error: {e}");
        std::process::exit(1);
    }
}
