//! Report sections and their ids.
//!
//! Ids double as anchors in the rendered report, so they are derived from
//! the country slug through one set of functions.

use serde::{Deserialize, Serialize};

use crate::agent::result::AgentResult;
use crate::core::slugify;

/// Id of the locally built profile section.
pub const EXECUTIVE_SUMMARY_ID: &str = "executive-summary";
/// Id of the API implementation guide.
pub const API_SECTION_ID: &str = "api-implementation";

/// Id of a country's compliance section.
#[must_use]
pub fn ccr_section_id(country: &str) -> String {
    format!("ccr-{}", slugify(country))
}

/// Id of a country's document format section.
#[must_use]
pub fn format_section_id(country: &str) -> String {
    format!("format-{}", slugify(country))
}

/// Title of a country's compliance section.
#[must_use]
pub fn ccr_title(country: &str) -> String {
    format!("{country} - Country Compliance Requirements")
}

/// Title of a country's document format section.
#[must_use]
pub fn format_title(country: &str) -> String {
    format!("{country} - Document Format Requirements")
}

/// One section of an onboarding report.
///
/// `success` holds exactly when `content` is set; use the constructors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSection {
    /// Stable anchor id.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Markdown body on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Whether the section was produced.
    pub success: bool,
    /// Failure description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Country the section covers, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

impl ReportSection {
    /// Successful section.
    #[must_use]
    pub fn succeeded(
        id: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
        country: Option<&str>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            content: Some(content.into()),
            success: true,
            error: None,
            country: country.map(str::to_string),
        }
    }

    /// Failed section.
    #[must_use]
    pub fn failed(
        id: impl Into<String>,
        title: impl Into<String>,
        error: impl Into<String>,
        country: Option<&str>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            content: None,
            success: false,
            error: Some(error.into()),
            country: country.map(str::to_string),
        }
    }

    /// Section carrying an agent's outcome.
    #[must_use]
    pub fn from_result(
        id: impl Into<String>,
        title: impl Into<String>,
        country: Option<&str>,
        result: AgentResult,
    ) -> Self {
        match (result.success, result.content, result.error_message) {
            (true, Some(content), _) => Self::succeeded(id, title, content, country),
            (_, _, error) => Self::failed(
                id,
                title,
                error.unwrap_or_else(|| "No content returned".to_string()),
                country,
            ),
        }
    }

    /// Content when successful.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        if self.success {
            self.content.as_deref()
        } else {
            None
        }
    }
}
