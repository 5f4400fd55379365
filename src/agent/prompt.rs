//! System prompts and template builders for chat agents.
//!
//! Builders are pure string functions so the prompt layout can be tested
//! without a provider.

use std::fmt::Write;

use super::message::{PageContext, ReportContext};
use super::result::AgentResults;
use super::roster::Roster;

/// System prompt for the single-workflow chat proxy.
pub const PROXY_SYSTEM_PROMPT: &str = r"You are an expert AI assistant for the e-invoicing API. Your role is to help partners integrate with the API by answering questions about:

- API authentication (OAuth 2.0, client credentials, authorization code flows)
- E-invoicing integration (AR/AP flows, document submission, status polling)
- PUF (Pagero Universal Format) document structure
- Error handling (recipient not found, validation errors, clearance rejection)
- Best practices for polling, token management, and error recovery
- Technical implementation details (endpoints, parameters, response formats)

Guidelines:
- Provide clear, accurate, technical answers
- Include code examples when relevant
- Reference specific API endpoints and parameters when applicable
- If you don't know something, admit it rather than guessing
- Keep responses concise but comprehensive
- Use markdown formatting for better readability";

/// System prompt for supervisor calls (routing analysis and synthesis).
pub const SUPERVISOR_SYSTEM_PROMPT: &str = "You coordinate a team of e-invoicing specialists. Follow the output format in the request exactly.";

/// Maximum characters of an earlier agent's answer passed to the next one.
pub const MAX_PRIOR_EXCERPT_CHARS: usize = 1000;

/// Opening marker for report context inside an agent prompt.
pub const REPORT_CONTEXT_START: &str = "--- User's Report Context ---";
/// Closing marker for report context inside an agent prompt.
pub const REPORT_CONTEXT_END: &str = "--- End Report Context ---";

/// An earlier agent's answer threaded into a sequential prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriorExcerpt {
    /// Display name of the agent that answered.
    pub label: String,
    /// Answer truncated to [`MAX_PRIOR_EXCERPT_CHARS`] characters.
    pub excerpt: String,
}

impl PriorExcerpt {
    /// Creates an excerpt, truncating `content` on a character boundary.
    #[must_use]
    pub fn new(label: impl Into<String>, content: &str) -> Self {
        Self {
            label: label.into(),
            excerpt: content.chars().take(MAX_PRIOR_EXCERPT_CHARS).collect(),
        }
    }
}

/// Builds the user prompt for a specialist agent.
///
/// Layout: question, optional report context between the markers, earlier
/// answers in order, then page title and documentation excerpt.
#[must_use]
pub fn build_agent_prompt(
    query: &str,
    page: &PageContext,
    report: Option<&ReportContext>,
    prior: &[PriorExcerpt],
) -> String {
    let mut question = query.to_string();

    if let Some(ctx) = report {
        let _ = write!(
            question,
            "\n\n{REPORT_CONTEXT_START}\n{}{REPORT_CONTEXT_END}\n\n\
             Use the report context above when it is relevant to the question. \
             Do not repeat it back verbatim.",
            ctx.render()
        );
    }

    for p in prior {
        let _ = write!(
            question,
            "\n\n--- {} Response ---\n{}\n--- End Previous Agent Response ---",
            p.label, p.excerpt
        );
    }

    build_user_prompt(&question, page)
}

/// Wraps a question with the page title and documentation excerpt.
#[must_use]
pub fn build_user_prompt(question: &str, page: &PageContext) -> String {
    let mut prompt = format!("User Question: {question}\n\n");
    if let Some(title) = page.page.as_deref().filter(|s| !s.is_empty()) {
        let _ = write!(prompt, "Current Page: {title}\n\n");
    }
    if let Some(section) = page.current_section.as_deref().filter(|s| !s.is_empty()) {
        let _ = write!(prompt, "Current Section: {section}\n\n");
    }
    if let Some(content) = page.page_content.as_deref().filter(|s| !s.is_empty()) {
        let _ = write!(prompt, "Relevant Documentation:\n{content}\n\n");
    }
    prompt.push_str(
        "Please provide a helpful, accurate answer to the user's question based on the context provided.",
    );
    prompt
}

/// Fills the routing analysis template.
#[must_use]
pub fn build_analysis_prompt(
    template: &str,
    query: &str,
    page: &PageContext,
    report: Option<&ReportContext>,
    roster: &Roster,
) -> String {
    let mut agents = String::new();
    for a in roster.agents() {
        let _ = writeln!(
            agents,
            "- `{}` ({}, {}): {}",
            a.key,
            a.name,
            a.domain,
            a.keywords.join(", ")
        );
    }
    let report_str = report.map_or_else(
        || "No report context available".to_string(),
        ReportContext::describe,
    );

    template
        .replace("{query}", query)
        .replace("{pageContext}", &page.describe())
        .replace("{reportContext}", &report_str)
        .replace("{agents}", agents.trim_end())
}

/// Fills the synthesis template with every successful answer.
#[must_use]
pub fn build_synthesis_prompt(
    template: &str,
    query: &str,
    results: &AgentResults,
    roster: &Roster,
    report: Option<&ReportContext>,
) -> String {
    let mut responses = String::new();
    for r in results {
        if let Some(text) = r.text() {
            let _ = write!(
                responses,
                "\n### {} Response:\n\n{text}\n\n---\n",
                roster.name_of(&r.agent_key)
            );
        }
    }
    let report_str = report.map_or_else(
        || "No report context available".to_string(),
        ReportContext::render,
    );

    template
        .replace("{query}", query)
        .replace("{agentResponses}", &responses)
        .replace("{reportContext}", &report_str)
}
