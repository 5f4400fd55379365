//! Execution strategy chosen by the router for one query.

use serde::{Deserialize, Serialize};

/// How the chosen agents run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// One agent, one call.
    Single,
    /// All agents at once; wait for every call.
    Parallel,
    /// One after another, each seeing earlier answers.
    Sequential,
}

impl Mode {
    /// Parses a mode name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "single" => Some(Self::Single),
            "parallel" => Some(Self::Parallel),
            "sequential" => Some(Self::Sequential),
            _ => None,
        }
    }

    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Parallel => "parallel",
            Self::Sequential => "sequential",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Router's estimate of how broad the query is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    /// One domain.
    Simple,
    /// Unclear or two domains.
    #[default]
    Moderate,
    /// Spans every domain.
    Complex,
}

impl Complexity {
    /// Parses a complexity name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "simple" => Some(Self::Simple),
            "moderate" => Some(Self::Moderate),
            "complex" => Some(Self::Complex),
            _ => None,
        }
    }

    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Moderate => "moderate",
            Self::Complex => "complex",
        }
    }
}

impl std::fmt::Display for Complexity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which agents run for a query and how.
///
/// `agents` is never empty; for [`Mode::Single`] it has exactly one entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionStrategy {
    /// Execution mode.
    pub mode: Mode,
    /// Agent keys in execution order.
    pub agents: Vec<String>,
    /// Complexity estimate.
    pub complexity: Complexity,
    /// Short explanation.
    pub reasoning: String,
}

impl ExecutionStrategy {
    /// Strategy with a single agent.
    #[must_use]
    pub fn single(agent: impl Into<String>, reasoning: impl Into<String>) -> Self {
        Self {
            mode: Mode::Single,
            agents: vec![agent.into()],
            complexity: Complexity::Simple,
            reasoning: reasoning.into(),
        }
    }

    /// Parallel strategy over `agents`.
    #[must_use]
    pub fn parallel(
        agents: Vec<String>,
        complexity: Complexity,
        reasoning: impl Into<String>,
    ) -> Self {
        Self {
            mode: Mode::Parallel,
            agents,
            complexity,
            reasoning: reasoning.into(),
        }
    }
}
