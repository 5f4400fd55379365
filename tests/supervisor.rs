//! End-to-end chat behavior through the supervisor with a scripted provider.

mod common;

use arena_supervisor::agent::synthesizer::concatenate;
use arena_supervisor::agent::{
    AgentResult, AgentResults, Complexity, Mode, PageContext, Roster, route_by_rules,
};
use arena_supervisor::error::AgentError;
use common::{answer, creds, supervisor, timeout, upstream};

#[tokio::test]
async fn test_single_agent_for_oauth_question() {
    let (provider, supervisor) = supervisor();
    let answer = supervisor
        .handle_query(
            "How do I authenticate with the OAuth endpoint?",
            &PageContext::default(),
            None,
            &creds(),
        )
        .await
        .unwrap_or_else(|_| unreachable!());

    assert!(answer.success);
    assert_eq!(answer.metadata.strategy, Mode::Single);
    assert_eq!(answer.metadata.agents_used, vec!["api"]);
    assert_eq!(answer.metadata.complexity, Complexity::Simple);
    assert_eq!(provider.total_calls(), 1);
    assert!(answer.content.contains("answer from api"));
}

#[tokio::test]
async fn test_multi_agent_trigger_runs_every_agent_once() {
    let (provider, supervisor) = supervisor();
    let roster = Roster::defaults();
    let answer = supervisor
        .handle_query(
            "mandatory fields for Poland",
            &PageContext::default(),
            None,
            &creds(),
        )
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(answer.metadata.strategy, Mode::Parallel);
    assert_eq!(answer.metadata.complexity, Complexity::Complex);
    assert_eq!(answer.metadata.agent_count, 3);
    for key in ["ccr", "puf", "api"] {
        assert_eq!(provider.calls_to(&roster, key), 1, "{key}");
    }
    assert!(!answer.metadata.synthesized);
}

#[tokio::test]
async fn test_timeout_escalates_once_then_succeeds() {
    let (provider, supervisor) = supervisor();
    let roster = Roster::defaults();
    provider.push(&roster, "api", Err(timeout()));
    provider.push(&roster, "api", Ok(answer("escalated answer")));

    let answer = supervisor
        .handle_query(
            "How do I authenticate with the OAuth endpoint?",
            &PageContext::default(),
            None,
            &creds(),
        )
        .await
        .unwrap_or_else(|_| unreachable!());

    assert!(answer.success);
    assert!(answer.content.contains("escalated answer"));
    let deadlines = provider.deadlines_for(&roster, "api");
    assert_eq!(deadlines.len(), 2);
    assert!(deadlines[1] > deadlines[0]);
}

#[tokio::test]
async fn test_non_timeout_failure_is_not_escalated() {
    let (provider, supervisor) = supervisor();
    let roster = Roster::defaults();
    provider.push(&roster, "api", Err(upstream()));

    let answer = supervisor
        .handle_query(
            "How do I authenticate with the OAuth endpoint?",
            &PageContext::default(),
            None,
            &creds(),
        )
        .await
        .unwrap_or_else(|_| unreachable!());

    assert!(!answer.success);
    assert_eq!(provider.calls_to(&roster, "api"), 1);
    assert_eq!(answer.metadata.failed_agents, vec!["api"]);
}

#[tokio::test]
async fn test_one_failed_agent_does_not_sink_the_answer() {
    let (provider, supervisor) = supervisor();
    let roster = Roster::defaults();
    provider.fail_always(&roster, "puf", upstream);

    let answer = supervisor
        .handle_query(
            "mandatory fields for Poland",
            &PageContext::default(),
            None,
            &creds(),
        )
        .await
        .unwrap_or_else(|_| unreachable!());

    assert!(answer.success);
    assert_eq!(answer.metadata.failed_agents, vec!["puf"]);
    assert!(answer.content.contains("answer from ccr"));
    assert!(answer.content.contains("answer from api"));
    assert!(!answer.content.contains("answer from puf"));
}

#[tokio::test]
async fn test_blank_query_and_token_rejected() {
    let (provider, supervisor) = supervisor();
    let empty = supervisor
        .handle_query("   ", &PageContext::default(), None, &creds())
        .await;
    assert!(matches!(empty, Err(AgentError::InvalidInput { .. })));

    let no_token = supervisor
        .handle_query(
            "What is SDI?",
            &PageContext::default(),
            None,
            &arena_supervisor::agent::Credentials::new(" "),
        )
        .await;
    assert!(matches!(no_token, Err(AgentError::InvalidInput { .. })));
    assert_eq!(provider.total_calls(), 0);
}

#[tokio::test]
async fn test_proxy_extended_starts_at_escalated_deadline() {
    let (provider, supervisor) = supervisor();
    let roster = Roster::defaults();
    let workflow = roster
        .get("ccr")
        .map(|a| a.workflow_id.clone())
        .unwrap_or_default();

    let inference = supervisor
        .proxy(&workflow, "What is SDI?", &PageContext::default(), true, &creds())
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(inference.content, "answer from ccr");
    assert_eq!(
        provider.deadlines_for(&roster, "ccr"),
        vec![supervisor.config().chat_escalated_timeout]
    );
}

#[tokio::test]
async fn test_settings_update_reports_change() {
    let (_provider, supervisor) = supervisor();
    let mut settings = supervisor.settings();
    assert!(!supervisor.update_settings(settings.clone()));

    settings.synthesis = !settings.synthesis;
    assert!(supervisor.update_settings(settings.clone()));
    assert_eq!(supervisor.settings(), settings);
}

#[test]
fn test_concatenation_orders_by_domain_and_skips_failures() {
    let roster = Roster::defaults();
    let results: AgentResults = [
        AgentResult::success("api", "Y"),
        AgentResult::failure("puf", "down"),
        AgentResult::success("ccr", "X"),
    ]
    .into_iter()
    .collect();

    let merged = concatenate(&results, &roster);
    let x = merged.find('X').unwrap_or(usize::MAX);
    let y = merged.find('Y').unwrap_or(usize::MAX);
    assert!(x < y);
    assert!(!merged.contains("down"));
    assert!(!merged.contains("Format Specialist"));
}

#[test]
fn test_rule_routing_examples() {
    let roster = Roster::defaults();
    let single = route_by_rules("How do I authenticate with the OAuth endpoint?", &roster);
    assert_eq!(single.mode, Mode::Single);
    assert_eq!(single.agents, vec!["api"]);

    let all = route_by_rules("mandatory fields for Poland", &roster);
    assert_eq!(all.mode, Mode::Parallel);
    assert_eq!(all.agents.len(), 3);
}

#[test]
fn test_rule_routing_is_deterministic() {
    let roster = Roster::defaults();
    for query in [
        "oauth endpoint for xml",
        "webhook compliance",
        "hello there",
        "Give me a complete guide for Germany",
    ] {
        let first = route_by_rules(query, &roster);
        for _ in 0..5 {
            assert_eq!(route_by_rules(query, &roster), first, "{query}");
        }
    }
}
