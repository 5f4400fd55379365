//! Pluggable inference provider trait.
//!
//! Implementations own the transport for one remote call. Retry and
//! escalation policies are layered on top by wrapping a provider, so
//! tests can substitute a scripted implementation at this seam.

use async_trait::async_trait;

use super::message::{Credentials, Inference, InferenceCall};
use crate::error::AgentError;

/// Trait for inference backends.
#[async_trait]
pub trait InferenceProvider: Send + Sync {
    /// Provider name (e.g., `"openarena"`).
    fn name(&self) -> &'static str;

    /// Executes one inference call within `call.timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Timeout`] when the deadline elapses,
    /// [`AgentError::Upstream`] on non-2xx responses,
    /// [`AgentError::EmptyResponse`] when no answer text is present, and
    /// [`AgentError::Transport`] on connection failures.
    async fn infer(
        &self,
        call: &InferenceCall,
        credentials: &Credentials,
    ) -> Result<Inference, AgentError>;
}
