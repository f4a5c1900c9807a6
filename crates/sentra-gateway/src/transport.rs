//! HTTP [`BackendTransport`] implementation.
//!
//! Guard backends are reached over plain request/response HTTP: the
//! transformed payload is POSTed as JSON to the backend's registered invoke
//! URL and the reply body is parsed as a JSON object.  The transport is
//! intentionally transparent — it never inspects guard-specific fields, so
//! new guard response shapes need no gateway changes.

use async_trait::async_trait;
use reqwest::Client;
use sentra_kernel::orchestration::{
    BackendDescriptor, BackendTransport, OrchestrationError, Payload,
};
use std::time::Duration;
use tracing::{debug, instrument};

/// Connect-phase ceiling shared by all calls; the per-call deadline still
/// bounds the total exchange.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// [`BackendTransport`] backed by a pooled reqwest [`Client`].
pub struct HttpBackendTransport {
    client: Client,
}

impl HttpBackendTransport {
    /// Build the transport with its shared connection pool.
    pub fn new() -> Self {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .expect("failed to build reqwest client");
        Self { client }
    }
}

impl Default for HttpBackendTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BackendTransport for HttpBackendTransport {
    #[instrument(skip(self, payload), fields(backend = %backend.name, url = %backend.base_address))]
    async fn call(
        &self,
        backend: &BackendDescriptor,
        payload: &Payload,
        timeout: Duration,
    ) -> Result<Payload, OrchestrationError> {
        debug!("forwarding transformed payload to guard backend");
        let timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);

        let response = self
            .client
            .post(&backend.base_address)
            .timeout(timeout)
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    OrchestrationError::Timeout {
                        backend: backend.name.clone(),
                        timeout_ms,
                    }
                } else {
                    OrchestrationError::Downstream {
                        backend: backend.name.clone(),
                        detail: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OrchestrationError::Downstream {
                backend: backend.name.clone(),
                detail: format!("status {status}: {}", truncate(&body, 256)),
            });
        }

        let value: serde_json::Value = response.json().await.map_err(|e| {
            if e.is_timeout() {
                OrchestrationError::Timeout {
                    backend: backend.name.clone(),
                    timeout_ms,
                }
            } else {
                OrchestrationError::Downstream {
                    backend: backend.name.clone(),
                    detail: format!("invalid JSON reply: {e}"),
                }
            }
        })?;

        match value {
            serde_json::Value::Object(map) => Ok(map.into_iter().collect()),
            other => Err(OrchestrationError::Downstream {
                backend: backend.name.clone(),
                detail: format!("expected a JSON object reply, got {other}"),
            }),
        }
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
