//! Partner onboarding form as submitted by the signup page.
//!
//! Every field is optional on the wire. Missing or blank values take the
//! same defaults the form itself falls back to, so a minimal body such as
//! `{"country1": "Italy"}` is a valid request.

use std::collections::HashSet;

use serde::{Deserialize, Deserializer, Serialize};

use crate::core::slugify;
use crate::error::AgentError;

/// Onboarding details collected from a partner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PartnerForm {
    /// Company being onboarded.
    pub partner_company_name: String,
    /// Partner-side project manager.
    pub project_manager_name: String,
    /// Project manager email.
    pub project_manager_email: String,
    /// Partner-side technical lead.
    pub technical_lead_name: String,
    /// Technical lead email.
    pub technical_lead_email: String,
    /// `reseller`, `referral`, `technology`, ...
    pub partnership_type: String,
    /// Language for code samples.
    pub programming_language: String,
    /// Checked integration targets: `erp`, `custom`, `other`, ...
    pub system_integration: Vec<String>,
    /// ERP product, when `erp` is checked.
    pub erp_details: String,
    /// Free text, when `other` is checked.
    pub other_system_details: String,
    /// Priority country.
    pub country1: String,
    /// Second country.
    pub country2: String,
    /// Third country.
    pub country3: String,
    /// Comma-separated list of further countries.
    pub additional_countries: String,
    /// Checked flows: `ar`, `ap`.
    pub invoice_handling: Vec<String>,
    /// Monthly invoice volume; numbers are accepted and kept as text.
    #[serde(deserialize_with = "string_or_number")]
    pub invoice_volume: String,
    /// Who handles first-line support.
    pub first_line_support: String,
    /// How end customers reach their account.
    pub account_access: String,
    /// Managed service or self-service.
    pub service_model: String,
}

impl Default for PartnerForm {
    fn default() -> Self {
        Self {
            partner_company_name: "Not specified".to_string(),
            project_manager_name: String::new(),
            project_manager_email: String::new(),
            technical_lead_name: String::new(),
            technical_lead_email: String::new(),
            partnership_type: "reseller".to_string(),
            programming_language: "python".to_string(),
            system_integration: vec!["custom".to_string()],
            erp_details: String::new(),
            other_system_details: String::new(),
            country1: String::new(),
            country2: String::new(),
            country3: String::new(),
            additional_countries: String::new(),
            invoice_handling: vec!["ar".to_string(), "ap".to_string()],
            invoice_volume: "1000".to_string(),
            first_line_support: "thomson-reuters".to_string(),
            account_access: "customer-direct".to_string(),
            service_model: "managed-service".to_string(),
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    })
}

impl PartnerForm {
    /// Replaces blank fields with their defaults and trims text.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        let defaults = Self::default();
        fill(&mut self.partner_company_name, defaults.partner_company_name);
        fill(&mut self.partnership_type, defaults.partnership_type);
        fill(&mut self.programming_language, defaults.programming_language);
        fill(&mut self.invoice_volume, defaults.invoice_volume);
        fill(&mut self.first_line_support, defaults.first_line_support);
        fill(&mut self.account_access, defaults.account_access);
        fill(&mut self.service_model, defaults.service_model);

        self.system_integration.retain(|s| !s.trim().is_empty());
        if self.system_integration.is_empty() {
            self.system_integration = defaults.system_integration;
        }
        self.invoice_handling.retain(|s| !s.trim().is_empty());
        if self.invoice_handling.is_empty() {
            self.invoice_handling = defaults.invoice_handling;
        }
        self
    }

    /// Countries in form order: `country1..3`, then the additional list.
    ///
    /// Entries are trimmed, blanks dropped, and duplicates (compared by
    /// slug) removed keeping the first spelling.
    #[must_use]
    pub fn countries(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        [&self.country1, &self.country2, &self.country3]
            .into_iter()
            .map(String::as_str)
            .chain(self.additional_countries.split(','))
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .filter(|c| seen.insert(slugify(c)))
            .map(str::to_string)
            .collect()
    }

    /// Checks the form can produce a report.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::InvalidInput`] when no country is given.
    pub fn validate(&self) -> Result<(), AgentError> {
        if self.countries().is_empty() {
            return Err(AgentError::InvalidInput {
                message: "At least one country is required".to_string(),
            });
        }
        Ok(())
    }

    /// Whether accounts receivable is in scope.
    #[must_use]
    pub fn ar_selected(&self) -> bool {
        self.handles("ar")
    }

    /// Whether accounts payable is in scope.
    #[must_use]
    pub fn ap_selected(&self) -> bool {
        self.handles("ap")
    }

    fn handles(&self, flow: &str) -> bool {
        self.invoice_handling
            .iter()
            .any(|h| h.trim().eq_ignore_ascii_case(flow))
    }

    /// Invoice flows in scope, e.g. `AR and AP`.
    #[must_use]
    pub fn scope_label(&self) -> String {
        self.invoice_handling
            .iter()
            .map(|h| h.trim().to_uppercase())
            .collect::<Vec<_>>()
            .join(" and ")
    }

    /// Integration targets, with ERP and "other" details spelled out.
    #[must_use]
    pub fn systems_label(&self) -> String {
        self.system_integration
            .iter()
            .map(|s| match s.as_str() {
                "erp" if !self.erp_details.trim().is_empty() => {
                    format!("ERP: {}", self.erp_details.trim())
                }
                "other" if !self.other_system_details.trim().is_empty() => {
                    format!("Other: {}", self.other_system_details.trim())
                }
                other => other.to_uppercase(),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn fill(field: &mut String, default: String) {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        *field = default;
    } else if trimmed.len() != field.len() {
        *field = trimmed.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> PartnerForm {
        serde_json::from_str::<PartnerForm>(json)
            .unwrap_or_else(|_| unreachable!())
            .normalized()
    }

    #[test]
    fn test_minimal_body_takes_defaults() {
        let form = parse(r#"{"country1": "Italy"}"#);
        assert_eq!(form.partner_company_name, "Not specified");
        assert_eq!(form.partnership_type, "reseller");
        assert_eq!(form.invoice_volume, "1000");
        assert_eq!(form.system_integration, vec!["custom"]);
        assert!(form.ar_selected() && form.ap_selected());
    }

    #[test]
    fn test_blank_fields_take_defaults() {
        let form = parse(r#"{"partnerCompanyName": "  ", "serviceModel": "", "invoiceHandling": []}"#);
        assert_eq!(form.partner_company_name, "Not specified");
        assert_eq!(form.service_model, "managed-service");
        assert_eq!(form.scope_label(), "AR and AP");
    }

    #[test]
    fn test_numeric_volume_accepted() {
        let form = parse(r#"{"invoiceVolume": 2500}"#);
        assert_eq!(form.invoice_volume, "2500");
    }

    #[test]
    fn test_countries_order_and_dedup() {
        let form = parse(
            r#"{"country1": "Italy", "country2": "", "country3": "Poland",
                "additionalCountries": " Germany, italy ,, Saudi Arabia , poland"}"#,
        );
        assert_eq!(form.countries(), vec!["Italy", "Poland", "Germany", "Saudi Arabia"]);
    }

    #[test]
    fn test_validate_requires_country() {
        let form = parse(r#"{"additionalCountries": " , "}"#);
        assert!(matches!(form.validate(), Err(AgentError::InvalidInput { .. })));
        assert!(parse(r#"{"additionalCountries": "Spain"}"#).validate().is_ok());
    }

    #[test]
    fn test_scope_only_ap() {
        let form = parse(r#"{"invoiceHandling": ["ap"]}"#);
        assert!(!form.ar_selected());
        assert!(form.ap_selected());
        assert_eq!(form.scope_label(), "AP");
    }

    #[test]
    fn test_systems_label() {
        let form = parse(
            r#"{"systemIntegration": ["erp", "custom", "other"], "erpDetails": "SAP S/4HANA",
                "otherSystemDetails": ""}"#,
        );
        assert_eq!(form.systems_label(), "ERP: SAP S/4HANA, CUSTOM, OTHER");
    }
}
