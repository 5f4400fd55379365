//! Agent executor: runs a strategy's agents and collects their results.
//!
//! Every agent in the strategy yields exactly one [`AgentResult`], so a
//! failed or unknown agent never aborts its siblings.

use futures_util::future::join_all;

use super::client::{AgentClient, ClientCache};
use super::escalator::{DeadlinePolicy, Escalator};
use super::message::{Credentials, PageContext, ReportContext};
use super::prompt::{PriorExcerpt, build_agent_prompt};
use super::result::{AgentResult, AgentResults};
use super::roster::Roster;
use super::strategy::{ExecutionStrategy, Mode};

/// Runs agents according to an [`ExecutionStrategy`].
pub struct AgentExecutor<'a> {
    escalator: &'a Escalator,
    roster: &'a Roster,
    cache: &'a ClientCache,
    max_tokens: u32,
}

impl<'a> AgentExecutor<'a> {
    /// Creates an executor over shared orchestrator state.
    #[must_use]
    pub const fn new(
        escalator: &'a Escalator,
        roster: &'a Roster,
        cache: &'a ClientCache,
        max_tokens: u32,
    ) -> Self {
        Self {
            escalator,
            roster,
            cache,
            max_tokens,
        }
    }

    /// Executes the strategy.
    ///
    /// - `single`: the first agent only; any further agent gets a failed
    ///   result without being called.
    /// - `parallel`: every agent at once; waits for all of them.
    /// - `sequential`: one at a time; each prompt carries earlier successful
    ///   answers as truncated excerpts.
    pub async fn execute(
        &self,
        strategy: &ExecutionStrategy,
        query: &str,
        page: &PageContext,
        report: Option<&ReportContext>,
        credentials: &Credentials,
    ) -> AgentResults {
        tracing::info!(
            mode = %strategy.mode,
            agents = ?strategy.agents,
            "executing agents"
        );

        match strategy.mode {
            Mode::Single => {
                let mut results = AgentResults::new();
                let mut agents = strategy.agents.iter();
                if let Some(key) = agents.next() {
                    let prompt = build_agent_prompt(query, page, report, &[]);
                    results.push(self.run(key, prompt, credentials).await);
                }
                for key in agents {
                    tracing::warn!(agent = %key, "single strategy names extra agent, skipping it");
                    results.push(AgentResult::failure(
                        key.as_str(),
                        "Skipped: single strategy runs only its first agent",
                    ));
                }
                results
            }
            Mode::Parallel => {
                let prompt = build_agent_prompt(query, page, report, &[]);
                let calls = strategy
                    .agents
                    .iter()
                    .map(|key| self.run(key, prompt.clone(), credentials));
                join_all(calls).await.into_iter().collect()
            }
            Mode::Sequential => {
                let mut results = AgentResults::new();
                let mut prior: Vec<PriorExcerpt> = Vec::new();
                for key in &strategy.agents {
                    let prompt = build_agent_prompt(query, page, report, &prior);
                    let result = self.run(key, prompt, credentials).await;
                    if let Some(text) = result.text() {
                        prior.push(PriorExcerpt::new(self.roster.name_of(key), text));
                    }
                    results.push(result);
                }
                results
            }
        }
    }

    async fn run(&self, key: &str, prompt: String, credentials: &Credentials) -> AgentResult {
        let Some(agent) = self.roster.get(key) else {
            tracing::warn!(agent = key, "strategy names an unknown agent");
            return AgentResult::failure(key, format!("Unknown agent '{key}'"));
        };
        let client = self
            .cache
            .get_or_insert_with(key, || AgentClient::for_agent(agent, self.max_tokens));
        self.escalator
            .call(key, &client.call(prompt), DeadlinePolicy::Chat, credentials)
            .await
    }
}
