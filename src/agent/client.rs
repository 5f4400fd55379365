//! Provider factory, transient retry wrapper, and per-agent client cache.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::agent::config::AgentConfig;
use crate::agent::message::{Credentials, Inference, InferenceCall};
use crate::agent::provider::InferenceProvider;
use crate::agent::providers::OpenArenaProvider;
use crate::agent::roster::AgentDescriptor;
use crate::error::AgentError;

/// Creates the production provider stack: OpenArena behind transient retry.
///
/// # Errors
///
/// Returns [`AgentError::Transport`] if the HTTP client cannot be built.
pub fn create_provider(config: &AgentConfig) -> Result<Arc<dyn InferenceProvider>, AgentError> {
    let base: Arc<dyn InferenceProvider> = Arc::new(OpenArenaProvider::new(config)?);
    Ok(Arc::new(RetryingProvider::new(
        base,
        config.transient_attempts,
        config.transient_delay,
    )))
}

/// Retries transient failures with a fixed delay.
///
/// Only errors where [`AgentError::is_transient`] holds are retried.
/// Timeouts pass straight through to the escalator.
pub struct RetryingProvider {
    inner: Arc<dyn InferenceProvider>,
    attempts: u32,
    delay: Duration,
}

impl RetryingProvider {
    /// Wraps `inner` with `attempts` tries per call (minimum 1).
    #[must_use]
    pub fn new(inner: Arc<dyn InferenceProvider>, attempts: u32, delay: Duration) -> Self {
        Self {
            inner,
            attempts: attempts.max(1),
            delay,
        }
    }
}

#[async_trait]
impl InferenceProvider for RetryingProvider {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    async fn infer(
        &self,
        call: &InferenceCall,
        credentials: &Credentials,
    ) -> Result<Inference, AgentError> {
        let mut attempt = 1;
        loop {
            match self.inner.infer(call, credentials).await {
                Err(e) if e.is_transient() && attempt < self.attempts => {
                    tracing::warn!(
                        workflow_id = %call.workflow_id,
                        attempt,
                        error = %e,
                        "transient inference failure, retrying"
                    );
                    attempt += 1;
                    if !self.delay.is_zero() {
                        tokio::time::sleep(self.delay).await;
                    }
                }
                other => return other,
            }
        }
    }
}

/// Reusable handle bound to one remote workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentClient {
    /// Agent key (or `supervisor`).
    pub key: String,
    /// Remote workflow id.
    pub workflow_id: String,
    /// System prompt sent with every call.
    pub system_prompt: String,
    /// Maximum tokens per call.
    pub max_tokens: u32,
}

impl AgentClient {
    /// Builds the client for a roster agent.
    #[must_use]
    pub fn for_agent(agent: &AgentDescriptor, max_tokens: u32) -> Self {
        Self {
            key: agent.key.clone(),
            workflow_id: agent.workflow_id.clone(),
            system_prompt: agent.system_prompt(),
            max_tokens,
        }
    }

    /// Prepares a call for `prompt`. The deadline is set by the escalator.
    #[must_use]
    pub fn call(&self, prompt: impl Into<String>) -> InferenceCall {
        InferenceCall {
            workflow_id: self.workflow_id.clone(),
            prompt: prompt.into(),
            system_prompt: self.system_prompt.clone(),
            max_tokens: self.max_tokens,
            timeout: Duration::ZERO,
        }
    }
}

/// Per-process map from agent key to its client handle.
///
/// Owned by the orchestrator and cleared wholesale when settings change.
/// The lock is held only for map operations.
#[derive(Debug, Default)]
pub struct ClientCache {
    clients: Mutex<HashMap<String, Arc<AgentClient>>>,
}

impl ClientCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached client for `key`, building it on first use.
    pub fn get_or_insert_with(
        &self,
        key: &str,
        build: impl FnOnce() -> AgentClient,
    ) -> Arc<AgentClient> {
        let mut clients = self.clients.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(clients.entry(key.to_string()).or_insert_with(|| {
            tracing::debug!(agent = key, "creating agent client");
            Arc::new(build())
        }))
    }

    /// Drops every cached client.
    pub fn invalidate(&self) {
        let mut clients = self.clients.lock().unwrap_or_else(PoisonError::into_inner);
        if !clients.is_empty() {
            tracing::debug!(count = clients.len(), "invalidating agent clients");
        }
        clients.clear();
    }

    /// Number of cached clients.
    #[must_use]
    pub fn len(&self) -> usize {
        self.clients
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
