//! Wire types for the inference endpoint and the context passed to agents.
//!
//! [`InferenceCall`] is the provider-agnostic request, [`build_payload`]
//! turns it into the JSON body the endpoint expects, and [`decode_answer`]
//! extracts the answer text from the response envelope.

use std::fmt::Write;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::AgentError;

/// A single remote inference request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferenceCall {
    /// Remote workflow that should answer.
    pub workflow_id: String,
    /// User prompt.
    pub prompt: String,
    /// System prompt, sent in `modelparams` and prepended to the query.
    pub system_prompt: String,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Deadline for this call.
    pub timeout: Duration,
}

impl InferenceCall {
    /// Returns a copy of this call with a different deadline.
    #[must_use]
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        Self {
            timeout,
            ..self.clone()
        }
    }
}

/// Successful inference output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Inference {
    /// Answer text, never empty.
    pub content: String,
    /// Tokens reported by the endpoint, 0 when absent.
    pub tokens_used: u64,
}

/// Bearer token for the inference endpoint.
///
/// `Debug` is redacted so the token cannot leak through logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials(String);

impl Credentials {
    /// Wraps a bearer token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the raw token for the `Authorization` header.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Whether the token is blank.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credentials(<redacted>)")
    }
}

/// Documentation page the user is looking at.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageContext {
    /// Page title.
    pub page: Option<String>,
    /// Page URL.
    pub url: Option<String>,
    /// Excerpt of the page text.
    pub page_content: Option<String>,
    /// Heading of the section in view.
    pub current_section: Option<String>,
}

impl PageContext {
    /// Whether no field carries a value.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.page.is_none()
            && self.url.is_none()
            && self.page_content.is_none()
            && self.current_section.is_none()
    }

    /// Short `Page:`/`URL:` description used by routing analysis.
    #[must_use]
    pub fn describe(&self) -> String {
        if self.is_empty() {
            return "No page context".to_string();
        }
        format!(
            "Page: {}\nURL: {}",
            self.page.as_deref().unwrap_or("Unknown"),
            self.url.as_deref().unwrap_or("Unknown")
        )
    }
}

/// One saved report section condensed for chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextSection {
    /// Section id.
    pub id: String,
    /// Section title.
    pub title: String,
    /// First words of the section, markdown stripped.
    pub summary: String,
    /// Country the section covers, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

/// Excerpts of a saved report relevant to a chat query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportContext {
    /// Report the excerpts come from.
    pub report_id: String,
    /// Countries covered by the report.
    pub countries: Vec<String>,
    /// Selected sections.
    pub relevant_sections: Vec<ContextSection>,
}

impl ReportContext {
    /// Renders the id, countries and section summaries as plain text.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = format!(
            "Report ID: {}\nCountries: {}\n\n",
            self.report_id,
            self.countries.join(", ")
        );
        for section in &self.relevant_sections {
            let _ = write!(out, "**{}**\n{}\n\n", section.title, section.summary);
        }
        out
    }

    /// One-line description used by routing analysis.
    #[must_use]
    pub fn describe(&self) -> String {
        format!(
            "Report available for: {}\nSections: {}",
            if self.countries.is_empty() {
                "Unknown".to_string()
            } else {
                self.countries.join(", ")
            },
            self.relevant_sections.len()
        )
    }
}

/// Builds the JSON request body for an inference call.
///
/// `temperature` and `max_tokens` are sent as strings; the endpoint rejects
/// numbers in `modelparams`. The query carries the system prompt ahead of
/// the user prompt.
#[must_use]
pub fn build_payload(call: &InferenceCall, model: &str, temperature: f32) -> Value {
    let query = if call.system_prompt.is_empty() {
        call.prompt.clone()
    } else {
        format!("{}\n\n{}", call.system_prompt, call.prompt)
    };

    let mut params = serde_json::Map::new();
    params.insert(
        model.to_string(),
        json!({
            "temperature": temperature.to_string(),
            "max_tokens": call.max_tokens.to_string(),
            "system_prompt": call.system_prompt,
        }),
    );

    json!({
        "workflow_id": call.workflow_id,
        "query": query,
        "is_persistence_allowed": false,
        "modelparams": Value::Object(params),
    })
}

/// Extracts the answer text from a response envelope.
///
/// Looks at `result.answer`. When it is an object, the value under `model`
/// wins if it is a non-empty string, otherwise the first non-empty string
/// value in document order. A bare non-empty string answer is accepted as is.
///
/// # Errors
///
/// Returns [`AgentError::EmptyResponse`] when no usable text is present.
pub fn decode_answer(envelope: &Value, model: &str) -> Result<Inference, AgentError> {
    let result = envelope.get("result").ok_or(AgentError::EmptyResponse)?;
    let answer = result.get("answer").ok_or(AgentError::EmptyResponse)?;

    let non_empty = |v: &Value| {
        v.as_str()
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)
    };

    let content = match answer {
        Value::String(_) => non_empty(answer),
        Value::Object(map) => map
            .get(model)
            .and_then(non_empty)
            .or_else(|| map.values().find_map(non_empty)),
        _ => None,
    }
    .ok_or(AgentError::EmptyResponse)?;

    let tokens_used = result
        .get("tokens_used")
        .or_else(|| envelope.get("tokens_used"))
        .and_then(Value::as_u64)
        .unwrap_or(0);

    Ok(Inference {
        content,
        tokens_used,
    })
}
