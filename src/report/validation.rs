//! Report completeness checks.
//!
//! Missing CCR, format, or API sections are critical and block `ready`.
//! AR/AP coverage of the API guide is advisory and uses a plain substring
//! check: `AR` (case-sensitive) or `accounts receivable` (any case), and the
//! same for `AP` / `accounts payable`.

use serde::{Deserialize, Serialize};

use super::form::PartnerForm;
use super::section::{API_SECTION_ID, ReportSection, ccr_section_id, format_section_id};

/// Outcome of one check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationCheck {
    /// What was checked.
    pub check: String,
    /// Whether it passed.
    pub passed: bool,
    /// Whether a failure blocks readiness.
    pub critical: bool,
}

/// Aggregate of all checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationSummary {
    /// Checks run.
    pub total_checks: usize,
    /// Checks passed.
    pub passed_checks: usize,
    /// Checks failed.
    pub failed_checks: usize,
    /// Failed checks marked critical.
    pub critical_failed: usize,
    /// `round(passed / total × 100)`.
    pub completeness: u32,
    /// `critical_failed == 0`.
    pub ready: bool,
    /// Individual checks in evaluation order.
    pub checks: Vec<ValidationCheck>,
}

impl ValidationSummary {
    /// Aggregates a list of checks.
    #[must_use]
    pub fn from_checks(checks: Vec<ValidationCheck>) -> Self {
        let total_checks = checks.len();
        let passed_checks = checks.iter().filter(|c| c.passed).count();
        let critical_failed = checks.iter().filter(|c| c.critical && !c.passed).count();
        Self {
            total_checks,
            passed_checks,
            failed_checks: total_checks - passed_checks,
            critical_failed,
            completeness: percent(passed_checks, total_checks),
            ready: critical_failed == 0,
            checks,
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn percent(part: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (part as f64 / total as f64 * 100.0).round() as u32
}

/// Runs every check against the generated sections.
#[must_use]
pub fn validate(form: &PartnerForm, countries: &[String], sections: &[ReportSection]) -> ValidationSummary {
    let succeeded = |id: &str| sections.iter().any(|s| s.id == id && s.success);
    let mut checks = Vec::new();

    for country in countries {
        checks.push(ValidationCheck {
            check: format!("CCR section for {country} generated"),
            passed: succeeded(&ccr_section_id(country)),
            critical: true,
        });
        checks.push(ValidationCheck {
            check: format!("Format section for {country} generated"),
            passed: succeeded(&format_section_id(country)),
            critical: true,
        });
    }

    let api_text = sections
        .iter()
        .find(|s| s.id == API_SECTION_ID)
        .and_then(ReportSection::text);
    checks.push(ValidationCheck {
        check: "API implementation guide generated".to_string(),
        passed: api_text.is_some(),
        critical: true,
    });

    let api_text = api_text.unwrap_or_default();
    if form.ar_selected() {
        checks.push(ValidationCheck {
            check: "API guide covers AR (accounts receivable)".to_string(),
            passed: mentions(api_text, "AR", "accounts receivable"),
            critical: false,
        });
    }
    if form.ap_selected() {
        checks.push(ValidationCheck {
            check: "API guide covers AP (accounts payable)".to_string(),
            passed: mentions(api_text, "AP", "accounts payable"),
            critical: false,
        });
    }

    ValidationSummary::from_checks(checks)
}

fn mentions(text: &str, acronym: &str, phrase: &str) -> bool {
    text.contains(acronym) || text.to_lowercase().contains(phrase)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::section::{ccr_title, format_title};

    fn countries() -> Vec<String> {
        vec!["Italy".to_string(), "Poland".to_string()]
    }

    fn full_sections(api: &str) -> Vec<ReportSection> {
        let mut sections = Vec::new();
        for c in countries() {
            sections.push(ReportSection::succeeded(ccr_section_id(&c), ccr_title(&c), "x", Some(&c)));
            sections.push(ReportSection::succeeded(format_section_id(&c), format_title(&c), "y", Some(&c)));
        }
        sections.push(ReportSection::succeeded(API_SECTION_ID, "API", api, None));
        sections
    }

    #[test]
    fn test_all_passing() {
        let v = validate(&PartnerForm::default(), &countries(), &full_sections("AR and AP flows"));
        assert_eq!(v.total_checks, 7);
        assert_eq!(v.passed_checks, 7);
        assert_eq!(v.completeness, 100);
        assert!(v.ready);
    }

    #[test]
    fn test_missing_coverage_is_advisory() {
        let v = validate(&PartnerForm::default(), &countries(), &full_sections("Accounts Receivable only"));
        assert_eq!(v.failed_checks, 1);
        assert_eq!(v.critical_failed, 0);
        assert!(v.ready);
        assert_eq!(v.completeness, 86);
    }

    #[test]
    fn test_failed_ccr_is_critical() {
        let mut sections = full_sections("AR AP");
        sections[0] = ReportSection::failed(ccr_section_id("Italy"), ccr_title("Italy"), "timed out", Some("Italy"));
        let v = validate(&PartnerForm::default(), &countries(), &sections);
        assert_eq!(v.critical_failed, 1);
        assert!(!v.ready);
    }

    #[test]
    fn test_missing_api_fails_coverage_too() {
        let mut sections = full_sections("AR AP");
        sections.pop();
        let form = PartnerForm {
            invoice_handling: vec!["ap".to_string()],
            ..PartnerForm::default()
        };
        let v = validate(&form, &countries(), &sections);
        assert_eq!(v.total_checks, 6);
        assert_eq!(v.failed_checks, 2);
        assert_eq!(v.critical_failed, 1);
    }

    #[test]
    fn test_summary_serializes_camel_case() {
        let json = serde_json::to_string(&ValidationSummary::from_checks(Vec::new())).unwrap_or_default();
        assert!(json.contains("\"passedChecks\":0"));
        assert!(json.contains("\"criticalFailed\":0"));
    }
}
