//! Knowledge domain of a specialist agent.
//!
//! This type lives in `core` so the roster, the synthesizer, and the report
//! pipeline share one ordering instead of each hard-coding agent keys.

use serde::{Deserialize, Serialize};

/// Knowledge domain of an agent, ordered by reading priority.
///
/// The derived [`Ord`] is the fixed concatenation order used when agent
/// outputs are joined without an LLM synthesis pass: compliance first,
/// then document format, then API integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    /// Country compliance requirements (CTC mandates, clearance models).
    Compliance = 0,
    /// Document format and field-level structure.
    Format = 1,
    /// API integration (authentication, endpoints, error handling).
    Api = 2,
}

impl Domain {
    /// All domains in reading priority order.
    pub const ORDERED: [Self; 3] = [Self::Compliance, Self::Format, Self::Api];

    /// Parses a domain string (case-insensitive).
    ///
    /// Returns `None` for unknown values.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "compliance" | "ccr" => Some(Self::Compliance),
            "format" | "puf" => Some(Self::Format),
            "api" => Some(Self::Api),
            _ => None,
        }
    }

    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Compliance => "compliance",
            Self::Format => "format",
            Self::Api => "api",
        }
    }
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
