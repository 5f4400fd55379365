//! Supervisor orchestrator for multi-agent chat.
//!
//! Coordinates the chat pipeline: route → execute agents → synthesize.
//! Also serves single-workflow proxy calls, which skip routing entirely.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;

use serde::{Deserialize, Serialize};

use super::client::{AgentClient, ClientCache};
use super::config::{AgentConfig, RoutingPolicy};
use super::escalator::{DeadlinePolicy, Escalator};
use super::executor::AgentExecutor;
use super::message::{Credentials, Inference, InferenceCall, PageContext, ReportContext};
use super::prompt::{PROXY_SYSTEM_PROMPT, SUPERVISOR_SYSTEM_PROMPT, build_user_prompt};
use super::provider::InferenceProvider;
use super::result::{ChatAnswer, ChatMetadata};
use super::roster::Roster;
use super::router::{route_by_rules, route_with_ai};
use super::strategy::ExecutionStrategy;
use super::synthesizer::{concatenate, synthesize_with_ai};
use crate::core::Domain;
use crate::error::{AgentError, absorb};

/// Longest accepted query, in bytes.
const MAX_QUERY_LEN: usize = 10_000;
/// Cache key for the supervisor's own client.
const SUPERVISOR_KEY: &str = "supervisor";

/// Process-wide supervisor settings, changeable at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupervisorSettings {
    /// Routing policy.
    pub routing: RoutingPolicy,
    /// Whether multi-agent answers are merged by the supervisor workflow.
    pub synthesis: bool,
    /// Workflow for routing analysis and synthesis.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supervisor_workflow_id: Option<String>,
}

impl SupervisorSettings {
    /// Initial settings from configuration.
    #[must_use]
    pub fn from_config(config: &AgentConfig) -> Self {
        Self {
            routing: config.routing,
            synthesis: config.synthesis_enabled,
            supervisor_workflow_id: config.supervisor_workflow_id.clone(),
        }
    }
}

/// Orchestrates the multi-agent chat workflow.
///
/// Owns the agent roster, the client cache and the supervisor settings.
/// Settings are cloned at the start of each query, so an update never
/// affects a query already in flight.
pub struct Supervisor {
    escalator: Escalator,
    config: AgentConfig,
    roster: Roster,
    cache: ClientCache,
    settings: RwLock<SupervisorSettings>,
}

impl Supervisor {
    /// Creates a supervisor over `provider`.
    #[must_use]
    pub fn new(provider: Arc<dyn InferenceProvider>, config: AgentConfig, roster: Roster) -> Self {
        let escalator = Escalator::new(provider, &config);
        let settings = SupervisorSettings::from_config(&config);
        Self {
            escalator,
            config,
            roster,
            cache: ClientCache::new(),
            settings: RwLock::new(settings),
        }
    }

    /// Agent roster.
    #[must_use]
    pub const fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Agent configuration.
    #[must_use]
    pub const fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Escalator shared with the report pipeline.
    #[must_use]
    pub const fn escalator(&self) -> &Escalator {
        &self.escalator
    }

    /// Client cache (exposed for inspection).
    #[must_use]
    pub const fn cache(&self) -> &ClientCache {
        &self.cache
    }

    /// Current settings.
    #[must_use]
    pub fn settings(&self) -> SupervisorSettings {
        self.settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replaces the settings.
    ///
    /// Clears the client cache when anything changed. Returns whether the
    /// settings changed.
    pub fn update_settings(&self, new: SupervisorSettings) -> bool {
        let changed = {
            let mut current = self.settings.write().unwrap_or_else(PoisonError::into_inner);
            if *current == new {
                false
            } else {
                *current = new;
                true
            }
        };
        if changed {
            self.cache.invalidate();
            tracing::info!(settings = ?self.settings(), "supervisor settings updated");
        }
        changed
    }

    /// Answers a chat query with one or more agents.
    ///
    /// # Steps
    ///
    /// 1. Route (AI-assisted when enabled, falling back to keyword rules)
    /// 2. Execute the chosen agents
    /// 3. Synthesize when more than one agent ran and synthesis is enabled,
    ///    otherwise concatenate
    ///
    /// Agent failures are reported in the answer, not as errors.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::InvalidInput`] for an empty or oversized query
    /// or blank credentials.
    pub async fn handle_query(
        &self,
        query: &str,
        page: &PageContext,
        report: Option<&ReportContext>,
        credentials: &Credentials,
    ) -> Result<ChatAnswer, AgentError> {
        validate_query(query)?;
        if credentials.is_empty() {
            return Err(AgentError::InvalidInput {
                message: "API token is required".to_string(),
            });
        }

        let start = Instant::now();
        let settings = self.settings();

        let strategy = self.route(&settings, query, page, report, credentials).await;

        let executor = AgentExecutor::new(
            &self.escalator,
            &self.roster,
            &self.cache,
            self.config.chat_max_tokens,
        );
        let results = executor
            .execute(&strategy, query, page, report, credentials)
            .await;

        let use_synthesis = settings.synthesis && strategy.agents.len() > 1;
        let content = if use_synthesis {
            let supervisor = self.supervisor_client(&settings);
            absorb(
                synthesize_with_ai(
                    &self.escalator,
                    &supervisor,
                    query,
                    &results,
                    &self.roster,
                    report,
                    credentials,
                )
                .await,
                "response synthesis",
                || concatenate(&results, &self.roster),
            )
        } else {
            concatenate(&results, &self.roster)
        };

        let metadata = ChatMetadata {
            strategy: strategy.mode,
            agents_used: strategy.agents.clone(),
            agent_count: strategy.agents.len(),
            duration: start.elapsed(),
            report_context_used: report.is_some(),
            complexity: strategy.complexity,
            routing_policy: settings.routing.to_string(),
            reasoning: strategy.reasoning,
            failed_agents: results.failed_keys(),
            synthesized: use_synthesis,
        };

        tracing::info!(
            mode = %metadata.strategy,
            agents = metadata.agent_count,
            failed = metadata.failed_agents.len(),
            elapsed_ms = metadata.duration.as_millis(),
            "chat query answered"
        );

        Ok(ChatAnswer {
            success: results.any_success(),
            content,
            metadata,
        })
    }

    /// Forwards one question to a specific workflow.
    ///
    /// With `extended`, the call starts at the escalated chat deadline.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::InvalidInput`] for missing fields, or the
    /// terminal inference error.
    pub async fn proxy(
        &self,
        workflow_id: &str,
        query: &str,
        page: &PageContext,
        extended: bool,
        credentials: &Credentials,
    ) -> Result<Inference, AgentError> {
        validate_query(query)?;
        if workflow_id.trim().is_empty() || credentials.is_empty() {
            return Err(AgentError::InvalidInput {
                message: "Missing required fields: apiToken, workflowId, query".to_string(),
            });
        }

        let call = InferenceCall {
            workflow_id: workflow_id.to_string(),
            prompt: build_user_prompt(query, page),
            system_prompt: PROXY_SYSTEM_PROMPT.to_string(),
            max_tokens: self.config.chat_max_tokens,
            timeout: self.config.chat_timeout,
        };
        self.escalator
            .invoke(&call, DeadlinePolicy::Chat, extended, credentials)
            .await
    }

    /// Picks a strategy under the given settings.
    pub async fn route(
        &self,
        settings: &SupervisorSettings,
        query: &str,
        page: &PageContext,
        report: Option<&ReportContext>,
        credentials: &Credentials,
    ) -> ExecutionStrategy {
        match settings.routing {
            RoutingPolicy::RuleBased => route_by_rules(query, &self.roster),
            RoutingPolicy::AiAssisted => {
                let supervisor = self.supervisor_client(settings);
                absorb(
                    route_with_ai(
                        &self.escalator,
                        &supervisor,
                        query,
                        page,
                        report,
                        &self.roster,
                        credentials,
                    )
                    .await,
                    "AI routing",
                    || route_by_rules(query, &self.roster),
                )
            }
        }
    }

    /// Supervisor workflow for `settings`.
    ///
    /// Resolution: settings override, then the roster's `supervisor`
    /// workflow, then the API agent's workflow.
    fn supervisor_workflow(&self, settings: &SupervisorSettings) -> String {
        settings
            .supervisor_workflow_id
            .clone()
            .or_else(|| self.roster.supervisor_workflow_id().map(str::to_string))
            .or_else(|| {
                tracing::debug!("no supervisor workflow configured, using the API agent's");
                self.roster
                    .by_domain(Domain::Api)
                    .or_else(|| self.roster.agents().first())
                    .map(|a| a.workflow_id.clone())
            })
            .unwrap_or_default()
    }

    /// Client for the supervisor workflow.
    ///
    /// Cached per resolved workflow.
    fn supervisor_client(&self, settings: &SupervisorSettings) -> Arc<AgentClient> {
        let workflow_id = self.supervisor_workflow(settings);
        let cache_key = format!("{SUPERVISOR_KEY}:{workflow_id}");
        self.cache.get_or_insert_with(&cache_key, || AgentClient {
            key: SUPERVISOR_KEY.to_string(),
            workflow_id,
            system_prompt: SUPERVISOR_SYSTEM_PROMPT.to_string(),
            max_tokens: self.config.chat_max_tokens,
        })
    }
}

impl std::fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Supervisor")
            .field("escalator", &self.escalator)
            .field("agents", &self.roster.keys())
            .field("settings", &self.settings())
            .finish_non_exhaustive()
    }
}

fn validate_query(query: &str) -> Result<(), AgentError> {
    if query.trim().is_empty() {
        return Err(AgentError::InvalidInput {
            message: "Query cannot be empty".to_string(),
        });
    }
    if query.len() > MAX_QUERY_LEN {
        return Err(AgentError::InvalidInput {
            message: format!(
                "Query exceeds maximum length ({} bytes, max {MAX_QUERY_LEN})",
                query.len()
            ),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::agent::strategy::Mode;
    use crate::agent::synthesizer::APOLOGY;

    /// Answers every call with a fixed reply and counts calls per workflow.
    struct Fixed {
        reply: String,
        calls: Mutex<Vec<String>>,
    }

    impl Fixed {
        fn new(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.to_string(),
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl InferenceProvider for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn infer(
            &self,
            call: &InferenceCall,
            _credentials: &Credentials,
        ) -> Result<Inference, AgentError> {
            if let Ok(mut c) = self.calls.lock() {
                c.push(call.workflow_id.clone());
            }
            Ok(Inference {
                content: self.reply.clone(),
                tokens_used: 0,
            })
        }
    }

    fn supervisor(provider: Arc<dyn InferenceProvider>) -> Supervisor {
        let config = AgentConfig::builder()
            .without_delays()
            .build()
            .unwrap_or_else(|_| unreachable!());
        Supervisor::new(provider, config, Roster::defaults())
    }

    #[tokio::test]
    async fn test_rejects_empty_query_and_token() {
        let sup = supervisor(Fixed::new("x"));
        let empty = sup
            .handle_query("  ", &PageContext::default(), None, &Credentials::new("t"))
            .await;
        assert!(matches!(empty, Err(AgentError::InvalidInput { .. })));

        let no_token = sup
            .handle_query("q", &PageContext::default(), None, &Credentials::new(""))
            .await;
        assert!(matches!(no_token, Err(AgentError::InvalidInput { .. })));
    }

    #[tokio::test]
    async fn test_single_agent_answer() {
        let sup = supervisor(Fixed::new("Use OAuth client credentials."));
        let answer = sup
            .handle_query(
                "How do I authenticate with oauth?",
                &PageContext::default(),
                None,
                &Credentials::new("t"),
            )
            .await
            .unwrap_or_else(|_| unreachable!());
        assert!(answer.success);
        assert_eq!(answer.metadata.strategy, Mode::Single);
        assert_eq!(answer.metadata.agents_used, vec!["api"]);
        assert_eq!(
            answer.content,
            "**API Integration Expert:**\n\nUse OAuth client credentials."
        );
        assert!(!answer.metadata.report_context_used);
    }

    #[tokio::test]
    async fn test_ai_routing_falls_back_to_rules() {
        let fixed = Fixed::new("not a strategy");
        let sup = supervisor(fixed.clone());
        sup.update_settings(SupervisorSettings {
            routing: RoutingPolicy::AiAssisted,
            synthesis: false,
            supervisor_workflow_id: Some("sup-wf".to_string()),
        });
        let answer = sup
            .handle_query(
                "Which xml schema?",
                &PageContext::default(),
                None,
                &Credentials::new("t"),
            )
            .await
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(answer.metadata.agents_used, vec!["puf"]);
        assert_eq!(answer.metadata.routing_policy, "ai-assisted");
        let calls = fixed.calls.lock().map(|c| c.clone()).unwrap_or_default();
        assert_eq!(calls.first().map(String::as_str), Some("sup-wf"));
        assert_eq!(calls.len(), 2);
    }

    #[tokio::test]
    async fn test_synthesis_failure_falls_back_to_concatenation() {
        let fixed = Fixed::new("   ");
        let sup = supervisor(fixed);
        sup.update_settings(SupervisorSettings {
            routing: RoutingPolicy::RuleBased,
            synthesis: true,
            supervisor_workflow_id: None,
        });
        // Agents "succeed" with whitespace; the blank merge is rejected.
        let answer = sup
            .handle_query(
                "complete guide please",
                &PageContext::default(),
                None,
                &Credentials::new("t"),
            )
            .await
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(answer.metadata.agent_count, 3);
        assert!(answer.content.contains("**Country Compliance Expert:**"));
        assert_ne!(answer.content, APOLOGY);
    }

    #[test]
    fn test_update_settings_invalidates_cache() {
        let sup = supervisor(Fixed::new("x"));
        let agent = sup.roster().get("api").cloned().unwrap_or_else(|| unreachable!());
        sup.cache().get_or_insert_with("api", || AgentClient::for_agent(&agent, 10));
        assert_eq!(sup.cache().len(), 1);

        assert!(!sup.update_settings(sup.settings()));
        assert_eq!(sup.cache().len(), 1);

        let mut changed = sup.settings();
        changed.synthesis = !changed.synthesis;
        assert!(sup.update_settings(changed));
        assert!(sup.cache().is_empty());
    }

    #[test]
    fn test_stale_settings_do_not_shadow_new_supervisor_workflow() {
        let sup = supervisor(Fixed::new("x"));
        let old = sup.settings();
        assert_ne!(sup.supervisor_client(&old).workflow_id, "wf-new");

        let mut changed = sup.settings();
        changed.supervisor_workflow_id = Some("wf-new".to_string());
        assert!(sup.update_settings(changed));

        // An in-flight query finishing with the settings it started with.
        let stale = sup.supervisor_client(&old);
        assert_ne!(stale.workflow_id, "wf-new");

        let current = sup.supervisor_client(&sup.settings());
        assert_eq!(current.workflow_id, "wf-new");
        assert_eq!(current.key, SUPERVISOR_KEY);
    }

    #[tokio::test]
    async fn test_proxy_validates_fields() {
        let sup = supervisor(Fixed::new("answer"));
        let missing = sup
            .proxy("", "q", &PageContext::default(), false, &Credentials::new("t"))
            .await;
        assert!(matches!(missing, Err(AgentError::InvalidInput { .. })));

        let ok = sup
            .proxy("wf", "q", &PageContext::default(), false, &Credentials::new("t"))
            .await
            .unwrap_or_default();
        assert_eq!(ok.content, "answer");
    }
}
