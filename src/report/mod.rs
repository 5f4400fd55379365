//! Partner onboarding reports.
//!
//! [`ReportPipeline`] turns a [`PartnerForm`] into a validated [`Report`].
//! [`ReportHistory`] keeps recent reports in a key-value store and extracts
//! the parts relevant to a chat question.

pub mod demo;
pub mod form;
pub mod history;
pub mod pipeline;
pub mod prompt;
pub mod section;
pub mod validation;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use form::PartnerForm;
pub use history::{ReportHistory, ReportSummary};
pub use pipeline::{ReportMode, ReportPipeline, Stage};
pub use section::ReportSection;
pub use validation::{ValidationCheck, ValidationSummary};

/// A generated onboarding report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// `ONB-YYYYMMDD-XXXXXX`.
    pub report_id: String,
    /// Completion time.
    pub generated_at: DateTime<Utc>,
    /// Normalized form the report was built from.
    pub partner: PartnerForm,
    /// Countries in report order.
    pub countries: Vec<String>,
    /// Executive summary, per-country sections, then the API guide.
    pub sections: Vec<ReportSection>,
    /// Completeness checks.
    pub validation: ValidationSummary,
    /// Run details.
    pub metadata: ReportMetadata,
}

impl Report {
    /// Section by id.
    #[must_use]
    pub fn section(&self, id: &str) -> Option<&ReportSection> {
        self.sections.iter().find(|s| s.id == id)
    }
}

/// Run details attached to a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMetadata {
    /// Same as [`Report::report_id`].
    pub report_id: String,
    /// Same as [`Report::generated_at`].
    pub generated_at: DateTime<Utc>,
    /// Wall-clock time, e.g. `"41.07s"`.
    pub duration: String,
    /// Whether canned text was used.
    pub demo_mode: bool,
    /// Countries in report order.
    pub countries: Vec<String>,
    /// Sections produced.
    pub sections_succeeded: usize,
    /// Sections that failed.
    pub sections_failed: usize,
    /// `"<section title>: <error>"` for each failed section.
    pub errors: Vec<String>,
}

/// Builds a report id from the date and six random characters.
#[must_use]
pub fn new_report_id(at: DateTime<Utc>) -> String {
    let suffix: String = uuid::Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(6)
        .collect::<String>()
        .to_uppercase();
    format!("ONB-{}-{suffix}", at.format("%Y%m%d"))
}
