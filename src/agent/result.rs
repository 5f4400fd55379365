//! Per-agent results and the chat answer returned by the supervisor.

use std::time::Duration;

use serde::Serialize;

use super::strategy::{Complexity, Mode};

/// Outcome of one agent call.
///
/// Exactly one of `content` and `error_message` is set, matching `success`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentResult {
    /// Agent that produced this result.
    pub agent_key: String,
    /// Whether the call produced content.
    pub success: bool,
    /// Answer text on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Human-readable failure on error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl AgentResult {
    /// Successful result.
    #[must_use]
    pub fn success(agent_key: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            agent_key: agent_key.into(),
            success: true,
            content: Some(content.into()),
            error_message: None,
        }
    }

    /// Failed result.
    #[must_use]
    pub fn failure(agent_key: impl Into<String>, error_message: impl Into<String>) -> Self {
        Self {
            agent_key: agent_key.into(),
            success: false,
            content: None,
            error_message: Some(error_message.into()),
        }
    }

    /// Content when successful.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        if self.success {
            self.content.as_deref()
        } else {
            None
        }
    }
}

/// Results keyed by agent, in strategy order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AgentResults(Vec<AgentResult>);

impl AgentResults {
    /// Creates an empty collection.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Appends a result, replacing any earlier entry for the same agent.
    pub fn push(&mut self, result: AgentResult) {
        if let Some(existing) = self.0.iter_mut().find(|r| r.agent_key == result.agent_key) {
            *existing = result;
        } else {
            self.0.push(result);
        }
    }

    /// Result for an agent.
    #[must_use]
    pub fn get(&self, agent_key: &str) -> Option<&AgentResult> {
        self.0.iter().find(|r| r.agent_key == agent_key)
    }

    /// Iterates in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, AgentResult> {
        self.0.iter()
    }

    /// Number of results.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no results.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether at least one agent succeeded.
    #[must_use]
    pub fn any_success(&self) -> bool {
        self.0.iter().any(|r| r.success)
    }

    /// Keys of agents that failed.
    #[must_use]
    pub fn failed_keys(&self) -> Vec<String> {
        self.0
            .iter()
            .filter(|r| !r.success)
            .map(|r| r.agent_key.clone())
            .collect()
    }
}

impl FromIterator<AgentResult> for AgentResults {
    fn from_iter<I: IntoIterator<Item = AgentResult>>(iter: I) -> Self {
        let mut results = Self::new();
        for r in iter {
            results.push(r);
        }
        results
    }
}

impl<'a> IntoIterator for &'a AgentResults {
    type Item = &'a AgentResult;
    type IntoIter = std::slice::Iter<'a, AgentResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Metadata describing how a chat answer was produced.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMetadata {
    /// Execution mode.
    pub strategy: Mode,
    /// Agents that ran, in strategy order.
    pub agents_used: Vec<String>,
    /// Number of agents that ran.
    pub agent_count: usize,
    /// Wall-clock time, serialized as `"12.34s"`.
    #[serde(serialize_with = "serialize_duration")]
    pub duration: Duration,
    /// Whether a report context was supplied.
    pub report_context_used: bool,
    /// Query complexity.
    pub complexity: Complexity,
    /// Routing policy that chose the strategy.
    pub routing_policy: String,
    /// Router explanation.
    pub reasoning: String,
    /// Agents whose call failed.
    pub failed_agents: Vec<String>,
    /// Whether LLM synthesis was attempted for this answer.
    pub synthesized: bool,
}

/// Final chat answer.
#[derive(Debug, Clone, Serialize)]
pub struct ChatAnswer {
    /// Whether any agent succeeded.
    pub success: bool,
    /// Markdown answer (an apology when nothing succeeded).
    pub content: String,
    /// Execution details.
    pub metadata: ChatMetadata,
}

/// Formats elapsed time the way responses report it, e.g. `12.34s`.
#[must_use]
pub fn format_duration(d: Duration) -> String {
    format!("{:.2}s", d.as_secs_f64())
}

#[allow(clippy::trivially_copy_pass_by_ref)]
pub(crate) fn serialize_duration<S>(d: &Duration, s: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    s.serialize_str(&format_duration(*d))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_and_failure_invariant() {
        let ok = AgentResult::success("api", "text");
        assert!(ok.success && ok.content.is_some() && ok.error_message.is_none());
        assert_eq!(ok.text(), Some("text"));

        let err = AgentResult::failure("api", "timed out");
        assert!(!err.success && err.content.is_none() && err.error_message.is_some());
        assert_eq!(err.text(), None);
    }

    #[test]
    fn test_results_one_entry_per_agent() {
        let results: AgentResults = [
            AgentResult::failure("ccr", "boom"),
            AgentResult::success("api", "a"),
            AgentResult::success("ccr", "c"),
        ]
        .into_iter()
        .collect();
        assert_eq!(results.len(), 2);
        assert_eq!(results.get("ccr").and_then(AgentResult::text), Some("c"));
        assert!(results.failed_keys().is_empty());
        assert!(results.any_success());
    }

    #[test]
    fn test_result_serialization_omits_absent_fields() {
        let json = serde_json::to_string(&AgentResult::success("puf", "x")).unwrap_or_default();
        assert!(json.contains("\"agentKey\":\"puf\""));
        assert!(!json.contains("errorMessage"));
    }

    #[test]
    fn test_duration_format() {
        assert_eq!(format_duration(Duration::from_millis(12_345)), "12.35s");
        assert_eq!(format_duration(Duration::ZERO), "0.00s");
    }
}
