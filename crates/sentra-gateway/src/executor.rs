//! Bounded-concurrency batch and pipeline execution.
//!
//! Batch mode fans an ordered list of requests out over spawned tasks,
//! gated by a semaphore so at most `max_concurrent` backend calls are in
//! flight at once.  Failure is isolated per slot: one failing request
//! yields one failed response and never cancels or degrades its siblings.
//!
//! Pipeline mode routes the same payload through an ordered capability
//! sequence one stage at a time; each stage's result is recorded under its
//! capability name and a stage failure never halts later stages.

use crate::router::OrchestrationRouter;
use sentra_kernel::orchestration::{
    Capability, OrchestrationError, OrchestrationRequest, OrchestrationResponse, Payload,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, instrument};

/// Runs batches and pipelines on top of a shared [`OrchestrationRouter`].
pub struct ParallelExecutor {
    router: Arc<OrchestrationRouter>,
    max_concurrent: usize,
}

impl ParallelExecutor {
    /// Create an executor with the policy-level concurrency cap.
    pub fn new(router: Arc<OrchestrationRouter>, max_concurrent: usize) -> Self {
        Self {
            router,
            // A zero cap would deadlock the semaphore; clamp to one.
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Execute `requests` concurrently, at most `max_concurrent` in flight.
    ///
    /// Responses come back in submission order, one per request.  A caller
    /// may raise or lower the cap for this batch only.
    #[instrument(skip(self, requests), fields(batch = requests.len()))]
    pub async fn submit_parallel(
        &self,
        requests: Vec<OrchestrationRequest>,
        max_concurrent: Option<usize>,
    ) -> Vec<OrchestrationResponse> {
        let cap = max_concurrent.unwrap_or(self.max_concurrent).max(1);
        let semaphore = Arc::new(Semaphore::new(cap));

        let mut handles = Vec::with_capacity(requests.len());
        for request in requests {
            // Captured up front so a panicked task can still be reported
            // in its slot.
            let slot = (request.request_id().to_string(), request.capability);
            let router = Arc::clone(&self.router);
            let semaphore = Arc::clone(&semaphore);
            let handle = tokio::spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .expect("batch semaphore is never closed");
                router.submit(request).await
            });
            handles.push((slot, handle));
        }

        let mut responses = Vec::with_capacity(handles.len());
        for ((request_id, capability), handle) in handles {
            match handle.await {
                Ok(response) => responses.push(response),
                Err(join_error) => {
                    error!(request_id = %request_id, error = %join_error, "batch task aborted");
                    responses.push(OrchestrationResponse::err(
                        request_id,
                        capability,
                        &OrchestrationError::ServiceUnavailable("batch-executor".to_string()),
                        0,
                    ));
                }
            }
        }
        responses
    }

    /// Route `payload` through `capabilities` in order, one stage at a time.
    ///
    /// Each stage gets a fresh request carrying a copy of the payload; its
    /// result is recorded under the capability's wire name.  A failed stage
    /// is recorded like any other and later stages still run.
    #[instrument(skip(self, payload), fields(stages = capabilities.len()))]
    pub async fn submit_pipeline(
        &self,
        payload: Payload,
        capabilities: Vec<Capability>,
    ) -> HashMap<String, OrchestrationResponse> {
        let mut results = HashMap::with_capacity(capabilities.len());
        for capability in capabilities {
            let request = OrchestrationRequest::new(capability).with_payload(payload.clone());
            let response = self.router.submit(request).await;
            results.insert(capability.as_str().to_string(), response);
        }
        results
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::breaker::CircuitBreakerMap;
    use crate::drain::RequestDrainer;
    use crate::events::EventBus;
    use crate::registry::InMemoryServiceRegistry;
    use crate::test_support::{descriptor, MockBehavior, MockTransport};
    use crate::transform::TransformerTable;
    use sentra_kernel::orchestration::{BreakerConfig, ServiceRegistry};
    use serde_json::json;
    use std::time::Duration;

    fn build_executor(transport: Arc<MockTransport>, cap: usize) -> ParallelExecutor {
        let mut registry = InMemoryServiceRegistry::new();
        registry
            .register(descriptor("trust-guard", Capability::TrustValidation))
            .unwrap();
        registry
            .register(descriptor("bias-guard", Capability::BiasAudit))
            .unwrap();
        registry
            .register(descriptor("prune-guard", Capability::TokenPruning))
            .unwrap();

        let router = Arc::new(OrchestrationRouter::new(
            registry.shared(),
            Arc::new(CircuitBreakerMap::new(BreakerConfig::default())),
            Arc::new(TransformerTable::with_defaults()),
            transport,
            Arc::new(EventBus::new()),
            Arc::new(RequestDrainer::new()),
        ));
        ParallelExecutor::new(router, cap)
    }

    fn trust_request(id: &str) -> OrchestrationRequest {
        OrchestrationRequest::new(Capability::TrustValidation)
            .with_request_id(id)
            .with_payload_entry("text", "hi")
    }

    #[tokio::test]
    async fn batch_preserves_submission_order() {
        let transport = Arc::new(MockTransport::new());
        let executor = build_executor(transport, 4);

        let requests = (0..8).map(|i| trust_request(&format!("r{i}"))).collect();
        let responses = executor.submit_parallel(requests, None).await;

        assert_eq!(responses.len(), 8);
        for (i, response) in responses.iter().enumerate() {
            assert!(response.success);
            assert_eq!(response.request_id, format!("r{i}"));
        }
    }

    #[tokio::test]
    async fn one_failing_backend_does_not_degrade_siblings() {
        let transport = Arc::new(MockTransport::new());
        transport.script("bias-guard", MockBehavior::Fail);
        let executor = build_executor(transport, 4);

        let requests = vec![
            trust_request("r0"),
            OrchestrationRequest::new(Capability::BiasAudit)
                .with_request_id("r1")
                .with_payload_entry("text", "hi"),
            trust_request("r2"),
        ];
        let responses = executor.submit_parallel(requests, None).await;

        assert!(responses[0].success);
        assert!(!responses[1].success);
        assert_eq!(responses[1].error_code.as_deref(), Some("DOWNSTREAM_ERROR"));
        assert!(responses[2].success);
    }

    #[tokio::test]
    async fn concurrency_stays_under_the_cap() {
        let transport = Arc::new(MockTransport::new());
        transport.script("trust-guard", MockBehavior::Delay(Duration::from_millis(20)));
        let executor = build_executor(Arc::clone(&transport), 2);

        let requests = (0..6).map(|i| trust_request(&format!("r{i}"))).collect();
        let responses = executor.submit_parallel(requests, None).await;

        assert!(responses.iter().all(|r| r.success));
        assert!(
            transport.peak_concurrency() <= 2,
            "peak concurrency {} exceeded the cap",
            transport.peak_concurrency()
        );
    }

    #[tokio::test]
    async fn per_call_cap_overrides_the_policy_cap() {
        let transport = Arc::new(MockTransport::new());
        transport.script("trust-guard", MockBehavior::Delay(Duration::from_millis(20)));
        let executor = build_executor(Arc::clone(&transport), 8);

        let requests = (0..4).map(|i| trust_request(&format!("r{i}"))).collect();
        executor.submit_parallel(requests, Some(1)).await;

        assert_eq!(transport.peak_concurrency(), 1);
    }

    #[tokio::test]
    async fn pipeline_records_every_stage_and_survives_failures() {
        let transport = Arc::new(MockTransport::new());
        transport.script("bias-guard", MockBehavior::Fail);
        let executor = build_executor(Arc::clone(&transport), 4);

        let mut payload = Payload::new();
        payload.insert("text".to_string(), json!("hi"));

        let results = executor
            .submit_pipeline(
                payload,
                vec![
                    Capability::TrustValidation,
                    Capability::BiasAudit,
                    Capability::TokenPruning,
                ],
            )
            .await;

        assert_eq!(results.len(), 3);
        assert!(results["trust"].success);
        assert!(!results["bias"].success);
        assert!(results["prune"].success, "a failed stage must not halt later stages");
        assert_eq!(transport.calls(), 3);
    }
}
