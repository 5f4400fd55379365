//! Response synthesis: turns per-agent results into one answer.
//!
//! [`concatenate`] is deterministic and always available.
//! [`synthesize_with_ai`] asks the supervisor workflow to merge the answers
//! and reports any failure as [`AgentError::Synthesis`] so the caller can
//! fall back to concatenation.

use super::client::AgentClient;
use super::escalator::{DeadlinePolicy, Escalator};
use super::message::{Credentials, ReportContext};
use super::prompt::build_synthesis_prompt;
use super::result::AgentResults;
use super::roster::Roster;
use crate::core::Domain;
use crate::error::AgentError;

/// Answer used when no agent succeeded.
pub const APOLOGY: &str = "I apologize, but I was unable to generate a response. Please try again or rephrase your question.";

/// Separator between agent answers.
pub const SECTION_SEPARATOR: &str = "\n\n---\n\n";

/// Joins successful answers in compliance → format → api order.
///
/// Each answer is prefixed with a bold `**<Agent Name>:**` label. Returns
/// [`APOLOGY`] when nothing succeeded.
#[must_use]
pub fn concatenate(results: &AgentResults, roster: &Roster) -> String {
    let mut ordered: Vec<(Domain, usize, &str, &str)> = results
        .iter()
        .filter_map(|r| {
            let text = r.text()?;
            let position = roster.agents().iter().position(|a| a.key == r.agent_key)?;
            let agent = &roster.agents()[position];
            Some((agent.domain, position, agent.name.as_str(), text))
        })
        .collect();
    ordered.sort_by_key(|(domain, position, _, _)| (*domain, *position));

    if ordered.is_empty() {
        return APOLOGY.to_string();
    }

    ordered
        .iter()
        .map(|(_, _, name, text)| format!("**{name}:**\n\n{text}"))
        .collect::<Vec<_>>()
        .join(SECTION_SEPARATOR)
}

/// Merges answers through the supervisor workflow.
///
/// # Errors
///
/// Returns [`AgentError::Synthesis`] if no agent succeeded, the call fails,
/// or the reply is blank.
pub async fn synthesize_with_ai(
    escalator: &Escalator,
    supervisor: &AgentClient,
    query: &str,
    results: &AgentResults,
    roster: &Roster,
    report: Option<&ReportContext>,
    credentials: &Credentials,
) -> Result<String, AgentError> {
    if !results.any_success() {
        return Err(AgentError::Synthesis {
            message: "no successful agent answers to merge".to_string(),
        });
    }

    let prompt = build_synthesis_prompt(
        &roster.supervisor_prompts().synthesis,
        query,
        results,
        roster,
        report,
    );

    let reply = escalator
        .invoke(&supervisor.call(prompt), DeadlinePolicy::Chat, false, credentials)
        .await
        .map_err(|e| AgentError::Synthesis {
            message: e.to_string(),
        })?;

    if reply.content.trim().is_empty() {
        return Err(AgentError::Synthesis {
            message: "supervisor returned a blank answer".to_string(),
        });
    }
    Ok(reply.content)
}
