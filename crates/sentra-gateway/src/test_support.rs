//! Shared fixtures for unit tests: a scriptable in-process transport and
//! router wiring helpers.

use async_trait::async_trait;
use parking_lot::Mutex;
use sentra_kernel::orchestration::{
    BackendDescriptor, BackendTransport, Capability, OrchestrationError, Payload,
};
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Scripted behavior for one backend name.
#[derive(Clone)]
pub(crate) enum MockBehavior {
    /// Echo the payload back with a `handled_by` marker.
    Succeed,
    /// Fail with [`OrchestrationError::Downstream`].
    Fail,
    /// Fail with [`OrchestrationError::Timeout`].
    TimeOut,
    /// Sleep, then echo like `Succeed`.
    Delay(Duration),
}

/// In-process [`BackendTransport`] with per-backend scripted behavior and a
/// concurrency gauge for executor tests.
#[derive(Default)]
pub(crate) struct MockTransport {
    behaviors: Mutex<HashMap<String, MockBehavior>>,
    calls: AtomicUsize,
    current: AtomicUsize,
    peak: AtomicUsize,
    last_timeout: Mutex<Option<Duration>>,
}

impl MockTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn script(&self, backend: &str, behavior: MockBehavior) {
        self.behaviors.lock().insert(backend.to_string(), behavior);
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of calls observed in flight at once.
    pub(crate) fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    /// Deadline passed with the most recent call.
    pub(crate) fn last_timeout(&self) -> Option<Duration> {
        *self.last_timeout.lock()
    }

    fn enter(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn exit(&self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }

    fn echo(backend: &BackendDescriptor, payload: &Payload) -> Payload {
        let mut out = payload.clone();
        out.insert("handled_by".to_string(), json!(backend.name));
        out
    }
}

#[async_trait]
impl BackendTransport for MockTransport {
    async fn call(
        &self,
        backend: &BackendDescriptor,
        payload: &Payload,
        timeout: Duration,
    ) -> Result<Payload, OrchestrationError> {
        self.enter();
        *self.last_timeout.lock() = Some(timeout);
        let behavior = self
            .behaviors
            .lock()
            .get(&backend.name)
            .cloned()
            .unwrap_or(MockBehavior::Succeed);

        let result = match behavior {
            MockBehavior::Succeed => Ok(Self::echo(backend, payload)),
            MockBehavior::Fail => Err(OrchestrationError::Downstream {
                backend: backend.name.clone(),
                detail: "scripted failure".to_string(),
            }),
            MockBehavior::TimeOut => Err(OrchestrationError::Timeout {
                backend: backend.name.clone(),
                timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            }),
            MockBehavior::Delay(pause) => {
                tokio::time::sleep(pause).await;
                Ok(Self::echo(backend, payload))
            }
        };
        self.exit();
        result
    }
}

/// A descriptor pointing at a fictitious guard endpoint.
pub(crate) fn descriptor(name: &str, capability: Capability) -> BackendDescriptor {
    BackendDescriptor::new(name, capability, format!("http://{name}.internal:8080/v1/analyze"))
}
