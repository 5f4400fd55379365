//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use arena_supervisor::agent::{
    AgentConfig, Credentials, Inference, InferenceCall, InferenceProvider, Roster, Supervisor,
};
use arena_supervisor::error::AgentError;
use async_trait::async_trait;

/// Provider that answers from per-workflow scripts.
///
/// Unscripted calls succeed with `answer from <agent key>`.
#[derive(Default)]
pub struct ScriptedProvider {
    scripts: Mutex<HashMap<String, VecDeque<Result<Inference, AgentError>>>>,
    always_fail: Mutex<HashMap<String, fn() -> AgentError>>,
    names: HashMap<String, String>,
    calls: Mutex<Vec<(String, Duration)>>,
    prompts: Mutex<Vec<(String, String)>>,
}

impl ScriptedProvider {
    pub fn new(roster: &Roster) -> Self {
        Self {
            names: roster
                .agents()
                .iter()
                .map(|a| (a.workflow_id.clone(), a.key.clone()))
                .collect(),
            ..Self::default()
        }
    }

    /// Queues one outcome for the agent's workflow.
    pub fn push(&self, roster: &Roster, key: &str, outcome: Result<Inference, AgentError>) {
        let wf = workflow(roster, key);
        if let Ok(mut scripts) = self.scripts.lock() {
            scripts.entry(wf).or_default().push_back(outcome);
        }
    }

    /// Makes every call to the agent's workflow fail.
    pub fn fail_always(&self, roster: &Roster, key: &str, error: fn() -> AgentError) {
        let wf = workflow(roster, key);
        if let Ok(mut fails) = self.always_fail.lock() {
            fails.insert(wf, error);
        }
    }

    /// Number of calls made to the agent's workflow.
    pub fn calls_to(&self, roster: &Roster, key: &str) -> usize {
        let wf = workflow(roster, key);
        self.calls
            .lock()
            .map(|c| c.iter().filter(|(w, _)| *w == wf).count())
            .unwrap_or_default()
    }

    /// Deadlines seen by calls to the agent's workflow, in order.
    pub fn deadlines_for(&self, roster: &Roster, key: &str) -> Vec<Duration> {
        let wf = workflow(roster, key);
        self.calls
            .lock()
            .map(|c| {
                c.iter()
                    .filter(|(w, _)| *w == wf)
                    .map(|(_, d)| *d)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Prompts sent to the agent's workflow, in order.
    pub fn prompts_to(&self, roster: &Roster, key: &str) -> Vec<String> {
        let wf = workflow(roster, key);
        self.prompts
            .lock()
            .map(|p| {
                p.iter()
                    .filter(|(w, _)| *w == wf)
                    .map(|(_, prompt)| prompt.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or_default()
    }
}

#[async_trait]
impl InferenceProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn infer(
        &self,
        call: &InferenceCall,
        _credentials: &Credentials,
    ) -> Result<Inference, AgentError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((call.workflow_id.clone(), call.timeout));
        }
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push((call.workflow_id.clone(), call.prompt.clone()));
        }
        if let Some(error) = self
            .always_fail
            .lock()
            .ok()
            .and_then(|f| f.get(&call.workflow_id).copied())
        {
            return Err(error());
        }
        let scripted = self
            .scripts
            .lock()
            .ok()
            .and_then(|mut s| s.get_mut(&call.workflow_id).and_then(VecDeque::pop_front));
        scripted.unwrap_or_else(|| {
            let key = self
                .names
                .get(&call.workflow_id)
                .map_or("unknown", String::as_str);
            Ok(answer(&format!("answer from {key}")))
        })
    }
}

fn workflow(roster: &Roster, key: &str) -> String {
    roster
        .get(key)
        .map(|a| a.workflow_id.clone())
        .unwrap_or_else(|| key.to_string())
}

pub fn answer(content: &str) -> Inference {
    Inference {
        content: content.to_string(),
        tokens_used: 7,
    }
}

pub fn timeout() -> AgentError {
    AgentError::Timeout {
        timeout: Duration::from_secs(30),
    }
}

pub fn upstream() -> AgentError {
    AgentError::Upstream {
        status: 500,
        body: "boom".to_string(),
    }
}

pub fn test_config() -> AgentConfig {
    AgentConfig::builder()
        .without_delays()
        .build()
        .unwrap_or_else(|_| unreachable!())
}

/// Supervisor over a scripted provider with the built-in roster.
pub fn supervisor() -> (Arc<ScriptedProvider>, Arc<Supervisor>) {
    let roster = Roster::defaults();
    let provider = Arc::new(ScriptedProvider::new(&roster));
    let supervisor = Supervisor::new(provider.clone(), test_config(), roster);
    (provider, Arc::new(supervisor))
}

pub fn creds() -> Credentials {
    Credentials::new("test-token")
}
