//! Agent configuration with builder pattern and environment variable support.
//!
//! Configuration is resolved in order: explicit values → environment variables → defaults.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::AgentError;

/// Default inference endpoint.
pub const DEFAULT_BASE_URL: &str = "https://aiopenarena.gcs.int.thomsonreuters.com/v1/inference";
/// Default model key used in `modelparams` and when decoding answers.
pub const DEFAULT_MODEL: &str = "claude-sonnet-4";
/// Default sampling temperature.
const DEFAULT_TEMPERATURE: f32 = 0.1;
/// Default max tokens for chat calls.
const DEFAULT_CHAT_MAX_TOKENS: u32 = 4000;
/// Default max tokens for report calls.
const DEFAULT_REPORT_MAX_TOKENS: u32 = 8000;
/// First chat deadline in seconds.
const DEFAULT_CHAT_TIMEOUT_SECS: u64 = 30;
/// Escalated chat deadline in seconds.
const DEFAULT_CHAT_ESCALATED_TIMEOUT_SECS: u64 = 120;
/// First report deadline for a single country, in seconds.
const DEFAULT_REPORT_BASE_SECS: u64 = 120;
/// Upper bound for the first report deadline, in seconds.
const DEFAULT_REPORT_CAP_SECS: u64 = 300;
/// Escalated report deadline for a single country, in seconds.
const DEFAULT_REPORT_RETRY_BASE_SECS: u64 = 240;
/// Upper bound for the escalated report deadline, in seconds.
const DEFAULT_REPORT_RETRY_CAP_SECS: u64 = 480;
/// Deadline increment per additional country, in seconds.
const DEFAULT_REPORT_PER_COUNTRY_SECS: u64 = 30;
/// Pause before a report escalation, in seconds.
const DEFAULT_ESCALATION_DELAY_SECS: u64 = 2;
/// Attempts per call for transient failures.
const DEFAULT_TRANSIENT_ATTEMPTS: u32 = 2;
/// Pause between transient attempts, in seconds.
const DEFAULT_TRANSIENT_DELAY_SECS: u64 = 2;

/// How the supervisor picks agents for a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoutingPolicy {
    /// Keyword scoring against the roster.
    #[default]
    RuleBased,
    /// Ask the supervisor workflow, falling back to keyword scoring.
    AiAssisted,
}

impl RoutingPolicy {
    /// Parses a policy name (`rule-based` or `ai-assisted`).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "rule-based" | "rules" | "rule" => Some(Self::RuleBased),
            "ai-assisted" | "ai" | "llm" => Some(Self::AiAssisted),
            _ => None,
        }
    }

    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::RuleBased => "rule-based",
            Self::AiAssisted => "ai-assisted",
        }
    }
}

impl std::fmt::Display for RoutingPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deadlines for report calls, scaled by the number of countries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportDeadlines {
    /// First-attempt deadline for one country.
    pub base: Duration,
    /// Upper bound for the first-attempt deadline.
    pub cap: Duration,
    /// Escalated deadline for one country.
    pub retry_base: Duration,
    /// Upper bound for the escalated deadline.
    pub retry_cap: Duration,
    /// Increment per country beyond the first.
    pub per_country: Duration,
}

impl Default for ReportDeadlines {
    fn default() -> Self {
        Self {
            base: Duration::from_secs(DEFAULT_REPORT_BASE_SECS),
            cap: Duration::from_secs(DEFAULT_REPORT_CAP_SECS),
            retry_base: Duration::from_secs(DEFAULT_REPORT_RETRY_BASE_SECS),
            retry_cap: Duration::from_secs(DEFAULT_REPORT_RETRY_CAP_SECS),
            per_country: Duration::from_secs(DEFAULT_REPORT_PER_COUNTRY_SECS),
        }
    }
}

/// Configuration for the agent system.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Inference endpoint URL.
    pub base_url: String,
    /// Model key sent in `modelparams` and preferred when decoding answers.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Maximum tokens for chat calls.
    pub chat_max_tokens: u32,
    /// Maximum tokens for report calls.
    pub report_max_tokens: u32,
    /// First chat deadline.
    pub chat_timeout: Duration,
    /// Escalated chat deadline.
    pub chat_escalated_timeout: Duration,
    /// Report deadline policy.
    pub report_deadlines: ReportDeadlines,
    /// Pause before a report escalation.
    pub escalation_delay: Duration,
    /// Attempts per call for transient failures (at least 1).
    pub transient_attempts: u32,
    /// Pause between transient attempts.
    pub transient_delay: Duration,
    /// Initial routing policy.
    pub routing: RoutingPolicy,
    /// Whether multi-agent answers go through an LLM synthesis pass.
    pub synthesis_enabled: bool,
    /// Workflow used for routing analysis and synthesis, overriding the roster.
    pub supervisor_workflow_id: Option<String>,
    /// Roster JSON path.
    ///
    /// When unset, the roster is loaded from `ARENA_ROSTER_PATH` or the
    /// default config directory, falling back to compiled-in defaults.
    pub roster_path: Option<PathBuf>,
}

impl AgentConfig {
    /// Creates a new builder for `AgentConfig`.
    #[must_use]
    pub fn builder() -> AgentConfigBuilder {
        AgentConfigBuilder::default()
    }

    /// Creates configuration from environment variables with defaults.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Config`] if a value is invalid.
    pub fn from_env() -> Result<Self, AgentError> {
        Self::builder().from_env().build()
    }
}

/// Builder for [`AgentConfig`].
#[derive(Debug, Clone, Default)]
pub struct AgentConfigBuilder {
    base_url: Option<String>,
    model: Option<String>,
    temperature: Option<f32>,
    chat_max_tokens: Option<u32>,
    report_max_tokens: Option<u32>,
    chat_timeout: Option<Duration>,
    chat_escalated_timeout: Option<Duration>,
    report_deadlines: Option<ReportDeadlines>,
    escalation_delay: Option<Duration>,
    transient_attempts: Option<u32>,
    transient_delay: Option<Duration>,
    routing: Option<RoutingPolicy>,
    synthesis_enabled: Option<bool>,
    supervisor_workflow_id: Option<String>,
    roster_path: Option<PathBuf>,
}

impl AgentConfigBuilder {
    /// Populates unset fields from environment variables.
    #[must_use]
    pub fn from_env(mut self) -> Self {
        if self.base_url.is_none() {
            self.base_url = std::env::var("ARENA_BASE_URL").ok();
        }
        if self.model.is_none() {
            self.model = std::env::var("ARENA_MODEL").ok();
        }
        if self.routing.is_none() {
            self.routing = std::env::var("ARENA_ROUTING")
                .ok()
                .and_then(|v| RoutingPolicy::parse(&v));
        }
        if self.synthesis_enabled.is_none() {
            self.synthesis_enabled = std::env::var("ARENA_SYNTHESIS")
                .ok()
                .and_then(|v| parse_flag(&v));
        }
        if self.supervisor_workflow_id.is_none() {
            self.supervisor_workflow_id = std::env::var("ARENA_SUPERVISOR_WORKFLOW")
                .ok()
                .filter(|v| !v.trim().is_empty());
        }
        if self.roster_path.is_none() {
            self.roster_path = std::env::var("ARENA_ROSTER_PATH").ok().map(PathBuf::from);
        }
        self
    }

    /// Sets the inference endpoint URL.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the model key.
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the sampling temperature.
    #[must_use]
    pub const fn temperature(mut self, t: f32) -> Self {
        self.temperature = Some(t);
        self
    }

    /// Sets the chat max tokens.
    #[must_use]
    pub const fn chat_max_tokens(mut self, n: u32) -> Self {
        self.chat_max_tokens = Some(n);
        self
    }

    /// Sets the report max tokens.
    #[must_use]
    pub const fn report_max_tokens(mut self, n: u32) -> Self {
        self.report_max_tokens = Some(n);
        self
    }

    /// Sets the first and escalated chat deadlines.
    #[must_use]
    pub const fn chat_timeouts(mut self, first: Duration, escalated: Duration) -> Self {
        self.chat_timeout = Some(first);
        self.chat_escalated_timeout = Some(escalated);
        self
    }

    /// Sets the report deadline policy.
    #[must_use]
    pub const fn report_deadlines(mut self, deadlines: ReportDeadlines) -> Self {
        self.report_deadlines = Some(deadlines);
        self
    }

    /// Sets the pause before a report escalation.
    #[must_use]
    pub const fn escalation_delay(mut self, delay: Duration) -> Self {
        self.escalation_delay = Some(delay);
        self
    }

    /// Sets the transient retry budget.
    #[must_use]
    pub const fn transient_retry(mut self, attempts: u32, delay: Duration) -> Self {
        self.transient_attempts = Some(attempts);
        self.transient_delay = Some(delay);
        self
    }

    /// Sets the routing policy.
    #[must_use]
    pub const fn routing(mut self, policy: RoutingPolicy) -> Self {
        self.routing = Some(policy);
        self
    }

    /// Enables or disables LLM synthesis.
    #[must_use]
    pub const fn synthesis_enabled(mut self, enabled: bool) -> Self {
        self.synthesis_enabled = Some(enabled);
        self
    }

    /// Sets the supervisor workflow override.
    #[must_use]
    pub fn supervisor_workflow_id(mut self, id: impl Into<String>) -> Self {
        self.supervisor_workflow_id = Some(id.into());
        self
    }

    /// Sets the roster JSON path.
    #[must_use]
    pub fn roster_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.roster_path = Some(path.into());
        self
    }

    /// Disables every retry pause. Intended for tests.
    #[must_use]
    pub const fn without_delays(mut self) -> Self {
        self.escalation_delay = Some(Duration::ZERO);
        self.transient_delay = Some(Duration::ZERO);
        self
    }

    /// Builds the [`AgentConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Config`] if the endpoint URL does not parse or
    /// the transient attempt count is zero.
    pub fn build(self) -> Result<AgentConfig, AgentError> {
        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        reqwest::Url::parse(&base_url).map_err(|e| AgentError::Config {
            message: format!("invalid inference endpoint '{base_url}': {e}"),
        })?;

        let transient_attempts = self
            .transient_attempts
            .unwrap_or(DEFAULT_TRANSIENT_ATTEMPTS);
        if transient_attempts == 0 {
            return Err(AgentError::Config {
                message: "transient retry attempts must be at least 1".to_string(),
            });
        }

        Ok(AgentConfig {
            base_url,
            model: self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature: self.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            chat_max_tokens: self.chat_max_tokens.unwrap_or(DEFAULT_CHAT_MAX_TOKENS),
            report_max_tokens: self.report_max_tokens.unwrap_or(DEFAULT_REPORT_MAX_TOKENS),
            chat_timeout: self
                .chat_timeout
                .unwrap_or(Duration::from_secs(DEFAULT_CHAT_TIMEOUT_SECS)),
            chat_escalated_timeout: self
                .chat_escalated_timeout
                .unwrap_or(Duration::from_secs(DEFAULT_CHAT_ESCALATED_TIMEOUT_SECS)),
            report_deadlines: self.report_deadlines.unwrap_or_default(),
            escalation_delay: self
                .escalation_delay
                .unwrap_or(Duration::from_secs(DEFAULT_ESCALATION_DELAY_SECS)),
            transient_attempts,
            transient_delay: self
                .transient_delay
                .unwrap_or(Duration::from_secs(DEFAULT_TRANSIENT_DELAY_SECS)),
            routing: self.routing.unwrap_or_default(),
            synthesis_enabled: self.synthesis_enabled.unwrap_or(false),
            supervisor_workflow_id: self.supervisor_workflow_id,
            roster_path: self.roster_path,
        })
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
