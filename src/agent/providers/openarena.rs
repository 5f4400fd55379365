//! OpenArena inference provider using `reqwest`.
//!
//! Sends one bearer-authenticated POST per call and decodes the
//! `result.answer` envelope. The per-call deadline wraps the whole
//! request with `tokio::time::timeout`, so expiry drops the in-flight
//! future and aborts the connection.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::agent::config::AgentConfig;
use crate::agent::message::{Credentials, Inference, InferenceCall, build_payload, decode_answer};
use crate::agent::provider::InferenceProvider;
use crate::error::AgentError;

/// Provider for the OpenArena inference endpoint.
pub struct OpenArenaProvider {
    client: Client,
    endpoint: String,
    model: String,
    temperature: f32,
}

impl OpenArenaProvider {
    /// Creates a new provider from agent configuration.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Transport`] if the HTTP client cannot be built.
    pub fn new(config: &AgentConfig) -> Result<Self, AgentError> {
        let client = Client::builder()
            .build()
            .map_err(|e| AgentError::Transport {
                message: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            endpoint: config.base_url.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }

    /// Model key used in `modelparams` and when decoding answers.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    async fn send(
        &self,
        call: &InferenceCall,
        credentials: &Credentials,
    ) -> Result<Inference, AgentError> {
        let body = build_payload(call, &self.model, self.temperature);

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(credentials.expose())
            .json(&body)
            .send()
            .await
            .map_err(|e| map_reqwest_error(&e, call))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| map_reqwest_error(&e, call))?;

        tracing::debug!(status = %status, bytes = text.len(), "inference response received");

        if !status.is_success() {
            return Err(AgentError::Upstream {
                status: status.as_u16(),
                body: text,
            });
        }

        let envelope: Value = serde_json::from_str(&text).map_err(|e| AgentError::Transport {
            message: format!("response is not valid JSON: {e}"),
        })?;

        decode_answer(&envelope, &self.model)
    }
}

fn map_reqwest_error(e: &reqwest::Error, call: &InferenceCall) -> AgentError {
    if e.is_timeout() {
        AgentError::Timeout {
            timeout: call.timeout,
        }
    } else {
        AgentError::Transport {
            message: e.to_string(),
        }
    }
}

impl std::fmt::Debug for OpenArenaProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenArenaProvider")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl InferenceProvider for OpenArenaProvider {
    fn name(&self) -> &'static str {
        "openarena"
    }

    async fn infer(
        &self,
        call: &InferenceCall,
        credentials: &Credentials,
    ) -> Result<Inference, AgentError> {
        tracing::debug!(
            workflow_id = %call.workflow_id,
            timeout_secs = call.timeout.as_secs(),
            prompt_chars = call.prompt.len(),
            "sending inference call"
        );

        match tokio::time::timeout(call.timeout, self.send(call, credentials)).await {
            Ok(result) => result,
            Err(_) => Err(AgentError::Timeout {
                timeout: call.timeout,
            }),
        }
    }
}
