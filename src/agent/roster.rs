//! Agent roster: the read-only description of every specialist agent.
//!
//! Loaded once from JSON when a file is present, falling back to the
//! compiled-in default. A file that exists but does not parse is an error,
//! unlike a missing one.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::Domain;
use crate::error::AgentError;

/// Default roster location under the user's config directory.
const DEFAULT_ROSTER_DIR: &str = "arena-supervisor";
/// Roster filename.
const ROSTER_FILENAME: &str = "roster.json";
/// Key under `workflowIds` for the supervisor workflow.
const SUPERVISOR_WORKFLOW_KEY: &str = "supervisor";

/// Default routing analysis template.
///
/// Placeholders: `{query}`, `{pageContext}`, `{reportContext}`, `{agents}`.
pub const DEFAULT_ANALYSIS_PROMPT: &str = r#"You are the supervisor of a team of e-invoicing specialists. Decide which specialists should answer the user's question and how they should run.

## Specialists
{agents}

## Question
{query}

## Page Context
{pageContext}

## Report Context
{reportContext}

## Output Format (JSON)

Reply with a single JSON object and nothing else:
```json
{
  "strategy": "single" | "parallel" | "sequential",
  "agents": ["agent key", "..."],
  "complexity": "simple" | "moderate" | "complex",
  "reasoning": "one sentence"
}
```

Use "sequential" only when a later specialist needs an earlier one's answer."#;

/// Default synthesis template.
///
/// Placeholders: `{query}`, `{agentResponses}`, `{reportContext}`.
pub const DEFAULT_SYNTHESIS_PROMPT: &str = r"You are the supervisor of a team of e-invoicing specialists. Merge their answers into one response for the user.

## Question
{query}

## Specialist Answers
{agentResponses}

## Report Context
{reportContext}

## Instructions
- Start with compliance obligations, then document format, then API implementation.
- Remove repetition between specialists and resolve contradictions explicitly.
- Keep code samples and field names exactly as the specialists wrote them.
- Use markdown headings and lists.";

const DEFAULT_ROSTER_JSON: &str = r#"{
  "workflowIds": {
    "api": "74f9914d-b8c9-44f0-ad5c-13af2d02144c",
    "puf": "f5a1f931-82f3-4b50-a051-de3e175e3d5f",
    "ccr": "f87b828b-39cb-4a9e-9225-bb9e67ff4860"
  },
  "agents": [
    {
      "key": "api",
      "name": "API Integration Expert",
      "domain": "api",
      "role": "You are an expert on the e-invoicing REST API. Help partners implement integrations with detailed technical answers, code examples and best practices for authentication, submission, status polling and error handling.",
      "outputStructure": ["Authentication", "Endpoints", "Request/Response Examples", "Error Handling", "Best Practices"],
      "citationPolicy": "Reference concrete endpoints and parameters. Say so when you are unsure rather than guessing.",
      "keywords": ["oauth", "authenticate", "endpoint", "request", "response", "error code", "webhook", "polling", "sdk"]
    },
    {
      "key": "puf",
      "name": "Format Specialist",
      "domain": "format",
      "role": "You are an expert on the Pagero Universal Format (PUF) and national e-invoice formats such as UBL, CII and XRechnung. Explain document structure, field mappings and validation rules.",
      "outputStructure": ["Format Overview", "Mandatory Fields", "Field Mappings", "Validation Rules", "Examples"],
      "citationPolicy": "Reference schema element names exactly. Mark fields whose meaning depends on the country.",
      "keywords": ["format", "xml", "schema", "field", "validation", "ubl", "cii", "document structure", "puf"]
    },
    {
      "key": "ccr",
      "name": "Country Compliance Expert",
      "domain": "compliance",
      "role": "You are an expert on country-specific Continuous Transaction Controls (CTC), e-invoicing mandates, and compliance requirements. Provide structured answers organized by country with the technical details API integration teams need.",
      "outputStructure": ["Compliance Model", "Required Document Types", "Mandatory Fields", "Validation Rules", "Deadlines & Timelines", "Key Integration Notes"],
      "citationPolicy": "Name the regulation or tax authority behind each requirement. Say so when a mandate date is not final.",
      "keywords": ["country", "compliance", "mandate", "regulation", "penalty", "tax authority", "clearance", "certificate"]
    }
  ],
  "multiAgentTriggers": [
    "submit invoice",
    "complete guide",
    "step by step",
    "how do i implement",
    "integration for",
    "mandatory fields for"
  ]
}"#;

/// One specialist agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentDescriptor {
    /// Short routing key (e.g. `ccr`).
    pub key: String,
    /// Display name used in labels.
    pub name: String,
    /// Remote workflow that backs this agent.
    pub workflow_id: String,
    /// Routing keywords, matched case-insensitively.
    pub keywords: Vec<String>,
    /// Area of expertise.
    pub domain: Domain,
    /// Role description.
    pub role: String,
    /// Subsection headings the answer should follow.
    pub output_structure: Vec<String>,
    /// Citation guidance.
    pub citation_policy: String,
}

impl AgentDescriptor {
    /// Composes the system prompt from role, output structure and citation policy.
    #[must_use]
    pub fn system_prompt(&self) -> String {
        let mut prompt = self.role.clone();
        if !self.output_structure.is_empty() {
            prompt.push_str("\n\nStructure your answer with these sections when relevant:\n");
            for heading in &self.output_structure {
                prompt.push_str("- ");
                prompt.push_str(heading);
                prompt.push('\n');
            }
        }
        if !self.citation_policy.is_empty() {
            prompt.push_str("\nCitations: ");
            prompt.push_str(&self.citation_policy);
        }
        prompt.push_str("\n\nUse markdown formatting.");
        prompt
    }
}

/// Supervisor prompt templates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupervisorPrompts {
    /// Routing analysis template.
    pub analysis: String,
    /// Synthesis template.
    pub synthesis: String,
}

impl Default for SupervisorPrompts {
    fn default() -> Self {
        Self {
            analysis: DEFAULT_ANALYSIS_PROMPT.to_string(),
            synthesis: DEFAULT_SYNTHESIS_PROMPT.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RosterFile {
    workflow_ids: HashMap<String, String>,
    agents: Vec<AgentEntry>,
    #[serde(default)]
    multi_agent_triggers: Vec<String>,
    #[serde(default)]
    supervisor_prompts: SupervisorPrompts,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AgentEntry {
    key: String,
    name: String,
    domain: String,
    role: String,
    #[serde(default)]
    output_structure: Vec<String>,
    #[serde(default)]
    citation_policy: String,
    #[serde(default)]
    keywords: Vec<String>,
}

/// The full set of agents plus supervisor settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roster {
    agents: Vec<AgentDescriptor>,
    multi_agent_triggers: Vec<String>,
    supervisor_prompts: SupervisorPrompts,
    supervisor_workflow_id: Option<String>,
}

impl Roster {
    /// Loads the roster, falling back to the compiled-in default.
    ///
    /// Resolution order for the path:
    /// 1. Explicit `path` argument
    /// 2. `ARENA_ROSTER_PATH` environment variable
    /// 3. `~/.config/arena-supervisor/roster.json`
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Config`] if a roster file exists but cannot be
    /// read or is invalid. A missing file is not an error.
    pub fn load(path: Option<&Path>) -> Result<Self, AgentError> {
        let resolved = path
            .map(PathBuf::from)
            .or_else(|| std::env::var("ARENA_ROSTER_PATH").ok().map(PathBuf::from))
            .or_else(Self::default_path);

        match resolved {
            Some(p) if p.exists() => {
                let text = std::fs::read_to_string(&p).map_err(|e| AgentError::Config {
                    message: format!("cannot read roster {}: {e}", p.display()),
                })?;
                tracing::info!(path = %p.display(), "loaded agent roster");
                Self::from_json(&text)
            }
            _ => Ok(Self::defaults()),
        }
    }

    /// Returns the compiled-in roster.
    #[must_use]
    pub fn defaults() -> Self {
        // Validity of the embedded document is asserted in tests.
        Self::from_json(DEFAULT_ROSTER_JSON).unwrap_or_else(|e| {
            tracing::error!(error = %e, "compiled-in roster is invalid");
            Self {
                agents: Vec::new(),
                multi_agent_triggers: Vec::new(),
                supervisor_prompts: SupervisorPrompts::default(),
                supervisor_workflow_id: None,
            }
        })
    }

    /// Parses and validates a roster document.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Config`] on malformed JSON, an empty agent list,
    /// duplicate keys, unknown domains, or agents without a workflow id.
    pub fn from_json(text: &str) -> Result<Self, AgentError> {
        let file: RosterFile = serde_json::from_str(text).map_err(|e| AgentError::Config {
            message: format!("invalid roster JSON: {e}"),
        })?;

        if file.agents.is_empty() {
            return Err(AgentError::Config {
                message: "roster defines no agents".to_string(),
            });
        }

        let mut seen = HashSet::new();
        let mut agents = Vec::with_capacity(file.agents.len());
        for entry in file.agents {
            if !seen.insert(entry.key.clone()) {
                return Err(AgentError::Config {
                    message: format!("duplicate agent key '{}'", entry.key),
                });
            }
            let domain = Domain::parse(&entry.domain).ok_or_else(|| AgentError::Config {
                message: format!("agent '{}' has unknown domain '{}'", entry.key, entry.domain),
            })?;
            let workflow_id = file
                .workflow_ids
                .get(&entry.key)
                .filter(|id| !id.trim().is_empty())
                .cloned()
                .ok_or_else(|| AgentError::Config {
                    message: format!("no workflow id for agent '{}'", entry.key),
                })?;
            agents.push(AgentDescriptor {
                key: entry.key,
                name: entry.name,
                workflow_id,
                keywords: entry.keywords,
                domain,
                role: entry.role,
                output_structure: entry.output_structure,
                citation_policy: entry.citation_policy,
            });
        }

        Ok(Self {
            agents,
            multi_agent_triggers: file.multi_agent_triggers,
            supervisor_prompts: file.supervisor_prompts,
            supervisor_workflow_id: file
                .workflow_ids
                .get(SUPERVISOR_WORKFLOW_KEY)
                .filter(|id| !id.trim().is_empty())
                .cloned(),
        })
    }

    /// Default roster path under the user's config directory.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(DEFAULT_ROSTER_DIR).join(ROSTER_FILENAME))
    }

    /// Writes the compiled-in roster to `path`.
    ///
    /// Creates parent directories. Returns `false` without touching the file
    /// when it already exists and `force` is not set.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if directory creation or writing fails.
    pub fn write_default(path: &Path, force: bool) -> std::io::Result<bool> {
        if path.exists() && !force {
            return Ok(false);
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, DEFAULT_ROSTER_JSON)?;
        Ok(true)
    }

    /// All agents in roster order.
    #[must_use]
    pub fn agents(&self) -> &[AgentDescriptor] {
        &self.agents
    }

    /// All agent keys in roster order.
    ///
    /// Roster order breaks keyword-score ties when routing.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.agents.iter().map(|a| a.key.clone()).collect()
    }

    /// All agent keys in reading order: compliance, format, then API.
    ///
    /// Agents sharing a domain keep roster order.
    #[must_use]
    pub fn keys_by_domain(&self) -> Vec<String> {
        let mut agents: Vec<&AgentDescriptor> = self.agents.iter().collect();
        agents.sort_by_key(|a| a.domain);
        agents.into_iter().map(|a| a.key.clone()).collect()
    }

    /// Looks up an agent by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&AgentDescriptor> {
        self.agents.iter().find(|a| a.key == key)
    }

    /// First agent in roster order with the given domain.
    #[must_use]
    pub fn by_domain(&self, domain: Domain) -> Option<&AgentDescriptor> {
        self.agents.iter().find(|a| a.domain == domain)
    }

    /// Display name for a key, or the key itself when unknown.
    #[must_use]
    pub fn name_of<'a>(&'a self, key: &'a str) -> &'a str {
        self.get(key).map_or(key, |a| a.name.as_str())
    }

    /// Phrases that force a full multi-agent answer.
    #[must_use]
    pub fn multi_agent_triggers(&self) -> &[String] {
        &self.multi_agent_triggers
    }

    /// Supervisor prompt templates.
    #[must_use]
    pub const fn supervisor_prompts(&self) -> &SupervisorPrompts {
        &self.supervisor_prompts
    }

    /// Supervisor workflow from `workflowIds.supervisor`, if configured.
    #[must_use]
    pub fn supervisor_workflow_id(&self) -> Option<&str> {
        self.supervisor_workflow_id.as_deref()
    }
}
