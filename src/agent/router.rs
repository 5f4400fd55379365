//! Query router: decides which agents answer a query and how.
//!
//! Two policies exist. [`route_by_rules`] is deterministic keyword scoring.
//! [`route_with_ai`] asks the supervisor workflow and returns a
//! `Result`; callers absorb its failure into the rule-based strategy.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use super::client::AgentClient;
use super::escalator::{DeadlinePolicy, Escalator};
use super::message::{Credentials, PageContext, ReportContext};
use super::prompt::build_analysis_prompt;
use super::roster::Roster;
use super::strategy::{Complexity, ExecutionStrategy, Mode};
use crate::error::AgentError;

/// Top score must exceed this multiple of the runner-up to pick one agent.
///
/// A tunable heuristic, not a property of the domain.
pub const DOMINANCE_FACTOR: usize = 2;

/// Maximum agents chosen by keyword scoring.
pub const MAX_PARALLEL_AGENTS: usize = 3;

static JSON_FENCE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?s)```json\s*\n(.*?)\n?\s*```").ok());

/// Routes a query by keyword scoring.
///
/// 1. Any multi-agent trigger phrase → parallel over every agent, complex.
/// 2. No keyword hits → parallel over every agent, moderate.
/// 3. One scoring agent, or top score > [`DOMINANCE_FACTOR`] × runner-up → single.
/// 4. Otherwise parallel over the top [`MAX_PARALLEL_AGENTS`] scorers.
///
/// Ties keep roster order. Strategies over every agent list them in
/// reading order.
#[must_use]
pub fn route_by_rules(query: &str, roster: &Roster) -> ExecutionStrategy {
    let lower = query.to_lowercase();

    if roster
        .multi_agent_triggers()
        .iter()
        .any(|t| lower.contains(&t.to_lowercase()))
    {
        return ExecutionStrategy::parallel(
            roster.keys_by_domain(),
            Complexity::Complex,
            "Multi-domain query requiring comprehensive coverage",
        );
    }

    let mut scored: Vec<(&str, usize)> = roster
        .agents()
        .iter()
        .map(|a| {
            let hits = a
                .keywords
                .iter()
                .filter(|k| lower.contains(&k.to_lowercase()))
                .count();
            (a.key.as_str(), hits)
        })
        .filter(|(_, hits)| *hits > 0)
        .collect();
    // Stable sort keeps roster order among equal scores.
    scored.sort_by(|a, b| b.1.cmp(&a.1));

    match scored.as_slice() {
        [] => ExecutionStrategy::parallel(
            roster.keys_by_domain(),
            Complexity::Moderate,
            "No clear domain match, consulting every agent",
        ),
        [(key, _)] => {
            ExecutionStrategy::single(*key, format!("Query clearly targets the {key} domain"))
        }
        [(key, top), (_, second), ..] if *top > second * DOMINANCE_FACTOR => {
            ExecutionStrategy::single(*key, format!("Query clearly targets the {key} domain"))
        }
        _ => ExecutionStrategy::parallel(
            scored
                .iter()
                .take(MAX_PARALLEL_AGENTS)
                .map(|(k, _)| (*k).to_string())
                .collect(),
            Complexity::Moderate,
            "Query spans multiple domains, executing in parallel",
        ),
    }
}

/// Asks the supervisor workflow for a strategy.
///
/// # Errors
///
/// Returns the inference error if the call fails, or
/// [`AgentError::RoutingParse`] if the reply is not a usable strategy.
#[allow(clippy::too_many_arguments)]
pub async fn route_with_ai(
    escalator: &Escalator,
    supervisor: &AgentClient,
    query: &str,
    page: &PageContext,
    report: Option<&ReportContext>,
    roster: &Roster,
    credentials: &Credentials,
) -> Result<ExecutionStrategy, AgentError> {
    let prompt = build_analysis_prompt(
        &roster.supervisor_prompts().analysis,
        query,
        page,
        report,
        roster,
    );
    let reply = escalator
        .invoke(&supervisor.call(prompt), DeadlinePolicy::Chat, false, credentials)
        .await?;
    let strategy = parse_strategy(&reply.content, roster)?;
    tracing::debug!(mode = %strategy.mode, agents = ?strategy.agents, "AI routing decision");
    Ok(strategy)
}

/// Parses a supervisor reply into a strategy.
///
/// Takes the body of a fenced ```json block if present, otherwise the span
/// from the first `{` to the last `}`. Unknown agent keys are dropped and
/// duplicates removed. A `single` strategy keeps only its first agent.
///
/// # Errors
///
/// Returns [`AgentError::RoutingParse`] when no JSON object is found, the
/// mode is missing or unknown, or no known agent remains.
pub fn parse_strategy(content: &str, roster: &Roster) -> Result<ExecutionStrategy, AgentError> {
    let parse_err = |message: &str| AgentError::RoutingParse {
        message: message.to_string(),
        content: content.to_string(),
    };

    let json_str = JSON_FENCE
        .as_ref()
        .and_then(|re| re.captures(content))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .or_else(|| {
            let start = content.find('{')?;
            let end = content.rfind('}')?;
            (start < end).then(|| &content[start..=end])
        })
        .ok_or_else(|| parse_err("no JSON object in reply"))?;

    let value: Value =
        serde_json::from_str(json_str).map_err(|e| parse_err(&format!("invalid JSON: {e}")))?;

    let mode = value
        .get("strategy")
        .and_then(Value::as_str)
        .and_then(Mode::parse)
        .ok_or_else(|| parse_err("missing or unknown strategy"))?;

    let mut seen = HashSet::new();
    let mut agents: Vec<String> = value
        .get("agents")
        .and_then(Value::as_array)
        .ok_or_else(|| parse_err("missing agents array"))?
        .iter()
        .filter_map(Value::as_str)
        .filter(|k| roster.get(k).is_some())
        .filter(|k| seen.insert(*k))
        .map(str::to_string)
        .collect();

    if agents.is_empty() {
        return Err(parse_err("no known agents selected"));
    }
    if mode == Mode::Single {
        agents.truncate(1);
    }

    let complexity = value
        .get("complexity")
        .and_then(Value::as_str)
        .and_then(Complexity::parse)
        .unwrap_or_default();
    let reasoning = value
        .get("reasoning")
        .and_then(Value::as_str)
        .unwrap_or("Selected by supervisor analysis")
        .to_string();

    Ok(ExecutionStrategy {
        mode,
        agents,
        complexity,
        reasoning,
    })
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    fn roster() -> Roster {
        Roster::defaults()
    }

    #[test]
    fn test_trigger_phrase_uses_all_agents() {
        let s = route_by_rules("Give me a complete guide for Germany", &roster());
        assert_eq!(s.mode, Mode::Parallel);
        assert_eq!(s.agents, vec!["ccr", "puf", "api"]);
        assert_eq!(s.complexity, Complexity::Complex);
    }

    #[test]
    fn test_no_keywords_uses_all_agents() {
        let s = route_by_rules("hello there", &roster());
        assert_eq!(s.mode, Mode::Parallel);
        assert_eq!(s.agents.len(), 3);
        assert_eq!(s.complexity, Complexity::Moderate);
    }

    #[test_case("How do I refresh an oauth token?", "api" ; "api keyword")]
    #[test_case("Which xml schema does PUF use?", "puf" ; "format keywords")]
    #[test_case("Is there a mandate in Poland?", "ccr" ; "compliance keyword")]
    fn test_single_agent_routes(query: &str, expected: &str) {
        let s = route_by_rules(query, &roster());
        assert_eq!(s.mode, Mode::Single);
        assert_eq!(s.agents, vec![expected]);
        assert_eq!(s.complexity, Complexity::Simple);
    }

    #[test]
    fn test_dominant_score_picks_single() {
        // api: oauth, endpoint, webhook = 3; puf: format = 1
        let s = route_by_rules("oauth endpoint webhook format", &roster());
        assert_eq!(s.mode, Mode::Single);
        assert_eq!(s.agents, vec!["api"]);
    }

    #[test]
    fn test_close_scores_go_parallel_in_score_order() {
        // api: oauth, endpoint = 2; puf: xml = 1 → 2 is not > 2 × 1
        let s = route_by_rules("oauth endpoint for xml", &roster());
        assert_eq!(s.mode, Mode::Parallel);
        assert_eq!(s.agents, vec!["api", "puf"]);
    }

    #[test]
    fn test_ties_keep_roster_order() {
        // ccr: compliance = 1; api: webhook = 1
        let s = route_by_rules("webhook compliance", &roster());
        assert_eq!(s.agents, vec!["api", "ccr"]);

        // puf: xml = 1; ccr: mandate = 1
        let s = route_by_rules("mandate xml", &roster());
        assert_eq!(s.agents, vec!["puf", "ccr"]);
    }

    #[test]
    fn test_parse_fenced_json() {
        let reply = "Here you go:\n```json\n{\"strategy\": \"sequential\", \"agents\": [\"ccr\", \"api\"], \"complexity\": \"complex\", \"reasoning\": \"r\"}\n```";
        let s = parse_strategy(reply, &roster()).unwrap_or_else(|_| unreachable!());
        assert_eq!(s.mode, Mode::Sequential);
        assert_eq!(s.agents, vec!["ccr", "api"]);
        assert_eq!(s.complexity, Complexity::Complex);
        assert_eq!(s.reasoning, "r");
    }

    #[test]
    fn test_parse_bare_object_with_prose() {
        let reply = "I think {\"strategy\": \"parallel\", \"agents\": [\"puf\", \"api\"]} is best.";
        let s = parse_strategy(reply, &roster()).unwrap_or_else(|_| unreachable!());
        assert_eq!(s.mode, Mode::Parallel);
        assert_eq!(s.complexity, Complexity::Moderate);
    }

    #[test]
    fn test_parse_drops_unknown_and_duplicate_keys() {
        let reply = r#"{"strategy": "parallel", "agents": ["api", "tax", "api", "ccr"]}"#;
        let s = parse_strategy(reply, &roster()).unwrap_or_else(|_| unreachable!());
        assert_eq!(s.agents, vec!["api", "ccr"]);
    }

    #[test]
    fn test_parse_single_keeps_first_agent() {
        let reply = r#"{"strategy": "single", "agents": ["puf", "api"]}"#;
        let s = parse_strategy(reply, &roster()).unwrap_or_else(|_| unreachable!());
        assert_eq!(s.agents, vec!["puf"]);
    }

    #[test_case("no json here" ; "no object")]
    #[test_case("{not valid}" ; "invalid json")]
    #[test_case(r#"{"strategy": "swarm", "agents": ["api"]}"# ; "unknown mode")]
    #[test_case(r#"{"strategy": "single"}"# ; "missing agents")]
    #[test_case(r#"{"strategy": "single", "agents": ["tax"]}"# ; "only unknown agents")]
    fn test_parse_failures(reply: &str) {
        let result = parse_strategy(reply, &roster());
        assert!(matches!(result, Err(AgentError::RoutingParse { .. })));
    }
}
