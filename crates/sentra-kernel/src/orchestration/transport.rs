//! Backend transport contract — the collaborator boundary.
//!
//! The core only requires "send payload, receive structured result-or-error
//! within a deadline".  Transport specifics (REST, gRPC, a test double) are
//! an implementation concern behind this trait; `sentra-gateway` ships a
//! reqwest-based HTTP implementation.

use super::capability::BackendDescriptor;
use super::error::OrchestrationError;
use super::types::Payload;
use async_trait::async_trait;
use std::time::Duration;

/// Kernel contract for one request/response exchange with a guard backend.
#[async_trait]
pub trait BackendTransport: Send + Sync {
    /// Send `payload` to `backend` and return its structured reply.
    ///
    /// `timeout` is a hard deadline: implementations must surface
    /// [`OrchestrationError::Timeout`] once it elapses, and
    /// [`OrchestrationError::Downstream`] when the backend answers with a
    /// failure or cannot be reached.
    async fn call(
        &self,
        backend: &BackendDescriptor,
        payload: &Payload,
        timeout: Duration,
    ) -> Result<Payload, OrchestrationError>;
}
