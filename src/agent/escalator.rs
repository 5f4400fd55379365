//! Deadline escalation for inference calls.
//!
//! A call that times out is retried exactly once with a longer deadline.
//! Any other failure is terminal at this layer (transient retries happen
//! below, in [`RetryingProvider`](super::client::RetryingProvider)).
//!
//! | Policy | First deadline | Escalated | Pause |
//! |--------|----------------|-----------|-------|
//! | Chat   | 30 s           | 120 s     | none  |
//! | Report | 120 s + 30 s/extra country, cap 300 s | 240 s + 30 s/extra country, cap 480 s | 2 s |

use std::sync::Arc;
use std::time::Duration;

use super::config::{AgentConfig, ReportDeadlines};
use super::message::{Credentials, Inference, InferenceCall};
use super::provider::InferenceProvider;
use super::result::AgentResult;
use crate::error::AgentError;

/// Deadline policy for one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadlinePolicy {
    /// Interactive chat.
    Chat,
    /// Report generation, scaled by the number of countries.
    Report {
        /// Countries in the report (at least 1 is assumed).
        countries: usize,
    },
}

/// Deadlines resolved for one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadlines {
    /// First-attempt deadline.
    pub first: Duration,
    /// Deadline for the single escalated attempt.
    pub escalated: Duration,
    /// Pause before the escalated attempt.
    pub pause: Duration,
}

fn scaled(base: Duration, per_country: Duration, countries: usize, cap: Duration) -> Duration {
    let extra = u32::try_from(countries.saturating_sub(1)).unwrap_or(u32::MAX);
    base.saturating_add(per_country.saturating_mul(extra)).min(cap)
}

impl ReportDeadlines {
    fn resolve(&self, countries: usize) -> (Duration, Duration) {
        (
            scaled(self.base, self.per_country, countries, self.cap),
            scaled(self.retry_base, self.per_country, countries, self.retry_cap),
        )
    }
}

/// Runs inference calls with timeout escalation.
#[derive(Clone)]
pub struct Escalator {
    provider: Arc<dyn InferenceProvider>,
    chat_timeout: Duration,
    chat_escalated_timeout: Duration,
    report: ReportDeadlines,
    escalation_delay: Duration,
}

impl Escalator {
    /// Creates an escalator over `provider` using the configured deadlines.
    #[must_use]
    pub fn new(provider: Arc<dyn InferenceProvider>, config: &AgentConfig) -> Self {
        Self {
            provider,
            chat_timeout: config.chat_timeout,
            chat_escalated_timeout: config.chat_escalated_timeout,
            report: config.report_deadlines,
            escalation_delay: config.escalation_delay,
        }
    }

    /// Resolves the deadlines for a policy.
    #[must_use]
    pub fn deadlines(&self, policy: DeadlinePolicy) -> Deadlines {
        match policy {
            DeadlinePolicy::Chat => Deadlines {
                first: self.chat_timeout,
                escalated: self.chat_escalated_timeout,
                pause: Duration::ZERO,
            },
            DeadlinePolicy::Report { countries } => {
                let (first, escalated) = self.report.resolve(countries);
                Deadlines {
                    first,
                    escalated,
                    pause: self.escalation_delay,
                }
            }
        }
    }

    /// Invokes `call`, escalating once on timeout.
    ///
    /// With `extended`, the first attempt already uses the escalated
    /// deadline and no further escalation happens.
    ///
    /// # Errors
    ///
    /// Returns the terminal [`AgentError`] of the last attempt.
    pub async fn invoke(
        &self,
        call: &InferenceCall,
        policy: DeadlinePolicy,
        extended: bool,
        credentials: &Credentials,
    ) -> Result<Inference, AgentError> {
        let deadlines = self.deadlines(policy);

        if extended {
            return self
                .provider
                .infer(&call.with_timeout(deadlines.escalated), credentials)
                .await;
        }

        match self
            .provider
            .infer(&call.with_timeout(deadlines.first), credentials)
            .await
        {
            Err(e) if e.is_timeout() => {
                tracing::warn!(
                    workflow_id = %call.workflow_id,
                    first_secs = deadlines.first.as_secs(),
                    escalated_secs = deadlines.escalated.as_secs(),
                    "inference timed out, escalating deadline"
                );
                if !deadlines.pause.is_zero() {
                    tokio::time::sleep(deadlines.pause).await;
                }
                self.provider
                    .infer(&call.with_timeout(deadlines.escalated), credentials)
                    .await
            }
            other => other,
        }
    }

    /// Invokes `call` for `agent_key` and folds the outcome into an [`AgentResult`].
    pub async fn call(
        &self,
        agent_key: &str,
        call: &InferenceCall,
        policy: DeadlinePolicy,
        credentials: &Credentials,
    ) -> AgentResult {
        match self.invoke(call, policy, false, credentials).await {
            Ok(inference) => {
                tracing::debug!(agent = agent_key, tokens = inference.tokens_used, "agent call succeeded");
                AgentResult::success(agent_key, inference.content)
            }
            Err(e) => {
                tracing::warn!(agent = agent_key, error = %e, "agent call failed");
                AgentResult::failure(agent_key, describe_failure(&e))
            }
        }
    }
}

impl std::fmt::Debug for Escalator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Escalator")
            .field("provider", &self.provider.name())
            .field("chat_timeout", &self.chat_timeout)
            .field("chat_escalated_timeout", &self.chat_escalated_timeout)
            .finish_non_exhaustive()
    }
}

/// Human-readable message for a terminal call failure.
#[must_use]
pub fn describe_failure(error: &AgentError) -> String {
    match error {
        AgentError::Timeout { timeout } => format!(
            "Request timed out after {}s, including an extended retry. Please try again later.",
            timeout.as_secs()
        ),
        AgentError::Upstream { status, .. } => {
            format!("The inference service returned an error (HTTP {status}).")
        }
        AgentError::EmptyResponse => "The inference service returned an empty answer.".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use test_case::test_case;

    use super::*;

    /// Replays a script of outcomes and records each deadline it saw.
    struct Scripted {
        script: Mutex<Vec<Result<Inference, AgentError>>>,
        seen: Mutex<Vec<Duration>>,
    }

    impl Scripted {
        fn new(mut script: Vec<Result<Inference, AgentError>>) -> Arc<Self> {
            script.reverse();
            Arc::new(Self {
                script: Mutex::new(script),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn seen(&self) -> Vec<Duration> {
            self.seen.lock().map(|s| s.clone()).unwrap_or_default()
        }
    }

    #[async_trait]
    impl InferenceProvider for Scripted {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn infer(
            &self,
            call: &InferenceCall,
            _credentials: &Credentials,
        ) -> Result<Inference, AgentError> {
            if let Ok(mut seen) = self.seen.lock() {
                seen.push(call.timeout);
            }
            self.script
                .lock()
                .ok()
                .and_then(|mut s| s.pop())
                .unwrap_or(Err(AgentError::EmptyResponse))
        }
    }

    fn ok(text: &str) -> Result<Inference, AgentError> {
        Ok(Inference {
            content: text.to_string(),
            tokens_used: 0,
        })
    }

    fn timeout() -> Result<Inference, AgentError> {
        Err(AgentError::Timeout {
            timeout: Duration::from_secs(1),
        })
    }

    fn escalator(provider: Arc<dyn InferenceProvider>) -> Escalator {
        let config = AgentConfig::builder()
            .without_delays()
            .build()
            .unwrap_or_else(|_| unreachable!());
        Escalator::new(provider, &config)
    }

    fn call() -> InferenceCall {
        InferenceCall {
            workflow_id: "wf".to_string(),
            prompt: "p".to_string(),
            system_prompt: String::new(),
            max_tokens: 1,
            timeout: Duration::ZERO,
        }
    }

    #[test_case(1, 120, 240 ; "one country")]
    #[test_case(2, 150, 270 ; "two countries")]
    #[test_case(5, 240, 360 ; "five countries")]
    #[test_case(7, 300, 420 ; "first deadline capped")]
    #[test_case(20, 300, 480 ; "both capped")]
    fn test_report_deadlines(countries: usize, first: u64, escalated: u64) {
        let esc = escalator(Scripted::new(Vec::new()));
        let d = esc.deadlines(DeadlinePolicy::Report { countries });
        assert_eq!(d.first, Duration::from_secs(first));
        assert_eq!(d.escalated, Duration::from_secs(escalated));
    }

    #[test]
    fn test_chat_deadlines() {
        let esc = escalator(Scripted::new(Vec::new()));
        let d = esc.deadlines(DeadlinePolicy::Chat);
        assert_eq!(d.first, Duration::from_secs(30));
        assert_eq!(d.escalated, Duration::from_secs(120));
        assert_eq!(d.pause, Duration::ZERO);
    }

    #[tokio::test]
    async fn test_timeout_then_success_makes_two_attempts() {
        let provider = Scripted::new(vec![timeout(), ok("late answer")]);
        let esc = escalator(provider.clone());
        let result = esc
            .call("api", &call(), DeadlinePolicy::Chat, &Credentials::new("t"))
            .await;
        assert_eq!(result, AgentResult::success("api", "late answer"));
        assert_eq!(
            provider.seen(),
            vec![Duration::from_secs(30), Duration::from_secs(120)]
        );
    }

    #[tokio::test]
    async fn test_double_timeout_is_failure_result() {
        let provider = Scripted::new(vec![timeout(), timeout(), ok("never")]);
        let esc = escalator(provider.clone());
        let result = esc
            .call("ccr", &call(), DeadlinePolicy::Report { countries: 2 }, &Credentials::new("t"))
            .await;
        assert!(!result.success);
        assert!(result.error_message.unwrap_or_default().contains("timed out"));
        assert_eq!(provider.seen().len(), 2);
    }

    #[tokio::test]
    async fn test_non_timeout_error_not_escalated() {
        let provider = Scripted::new(vec![
            Err(AgentError::Upstream {
                status: 500,
                body: "oops".to_string(),
            }),
            ok("never"),
        ]);
        let esc = escalator(provider.clone());
        let result = esc
            .invoke(&call(), DeadlinePolicy::Chat, false, &Credentials::new("t"))
            .await;
        assert!(matches!(result, Err(AgentError::Upstream { status: 500, .. })));
        assert_eq!(provider.seen().len(), 1);
    }

    #[tokio::test]
    async fn test_extended_starts_at_escalated_deadline() {
        let provider = Scripted::new(vec![timeout(), ok("never")]);
        let esc = escalator(provider.clone());
        let result = esc
            .invoke(&call(), DeadlinePolicy::Chat, true, &Credentials::new("t"))
            .await;
        assert!(result.is_err());
        assert_eq!(provider.seen(), vec![Duration::from_secs(120)]);
    }

    #[test]
    fn test_describe_failure() {
        let msg = describe_failure(&AgentError::Upstream {
            status: 502,
            body: "secret body".to_string(),
        });
        assert!(msg.contains("502"));
        assert!(!msg.contains("secret body"));
    }
}
