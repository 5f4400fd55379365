//! Prompt builders for the report pipeline.

use std::fmt::Write;

use super::form::PartnerForm;
use super::section::ReportSection;

/// Opening marker for earlier sections inside the API prompt.
pub const REFERENCE_START: &str = "--- Reference Material ---";
/// Closing marker for earlier sections inside the API prompt.
pub const REFERENCE_END: &str = "--- End Reference Material ---";

/// Format prompt input when the country's compliance section failed.
#[must_use]
pub fn missing_compliance(country: &str) -> String {
    format!("No compliance data available for {country}.")
}

/// Compliance requirements request for one country.
#[must_use]
pub fn ccr_prompt(form: &PartnerForm, country: &str, priority: bool) -> String {
    format!(
        "I am a {partnership} partner integrating with the e-invoicing API. \
I need comprehensive country compliance requirements for {country}{marker}.

**Scope:** {scope} (Accounts Receivable/Payable)
**Estimated Volume:** {volume} invoices per month

Please cover:

1. **Compliance Model** - Is e-invoicing mandatory or optional? What is the clearance model?
2. **Required Document Types** - What invoice types are required?
3. **Mandatory Fields & Format Requirements** - What are the mandatory fields and format?
4. **Validation Rules** - What validations are performed? Common rejection reasons?
5. **Deadlines & Timelines** - Invoice submission deadlines and response times?
6. **Key Information for API Integration** - What should the API integration team know?

Structure the answer with a clear heading for each area.",
        partnership = form.partnership_type,
        marker = if priority { " (PRIORITY)" } else { "" },
        scope = form.scope_label(),
        volume = form.invoice_volume,
    )
}

/// Document format request for one country.
///
/// `compliance` is the country's compliance section, or
/// [`missing_compliance`] when that section failed.
#[must_use]
pub fn format_prompt(form: &PartnerForm, country: &str, compliance: &str) -> String {
    format!(
        "I need the document format requirements for e-invoices exchanged in {country}, \
expressed in the API's universal document format.

**Scope:** {scope}
**Systems:** {systems}

**Compliance requirements for {country}:**
{compliance}

---

Please cover:

1. **Document Structure** - Required top-level elements and their order
2. **Mandatory Fields** - Field names, types, and cardinality for {country}
3. **Country Extensions** - Fields or codes specific to {country}
4. **Validation Rules** - Schema and business rules applied on submission
5. **Sample Document** - A minimal valid invoice in the universal format",
        scope = form.scope_label(),
        systems = form.systems_label(),
    )
}

/// API implementation guide request.
///
/// Successful sections are passed as delimited reference material.
#[must_use]
pub fn api_prompt(form: &PartnerForm, countries: &[String], references: &[&ReportSection]) -> String {
    let mut prompt = format!(
        "I am implementing the e-invoicing API integration for a {partnership} partner.

**Partner Profile:**
- Company: {company}
- Systems to integrate: {systems}
- Service Model: {service}
- Invoice handling: {scope}
- Monthly volume: {volume} invoices
- Preferred language for code samples: {language}
- Countries: {countries}
",
        partnership = form.partnership_type,
        company = form.partner_company_name,
        systems = form.systems_label(),
        service = form.service_model,
        scope = form.scope_label(),
        volume = form.invoice_volume,
        language = form.programming_language,
        countries = countries.join(", "),
    );

    if !references.is_empty() {
        let _ = write!(prompt, "\n{REFERENCE_START}\n");
        for section in references {
            if let Some(text) = section.text() {
                let _ = write!(prompt, "\n## {}\n\n{text}\n", section.title);
            }
        }
        let _ = write!(
            prompt,
            "\n{REFERENCE_END}\n\nUse the reference material above to tailor the guide. \
Do not restate it verbatim.\n"
        );
    }

    prompt.push_str(
        "
Please provide a comprehensive API implementation guide covering:

1. **Authentication Setup** - OAuth 2.0 configuration and token management
2. **Required API Endpoints** - Which endpoints are needed for this scope?
3. **Integration Architecture** - Recommended architecture for the systems
4. **Request/Response Examples** - Sample API requests and responses
5. **Webhook Configuration** - How to set up webhooks for status updates
6. **Error Handling Strategy** - Common errors and retry logic
7. **Best Practices** - Polling, rate limiting, monitoring, testing
8. **Code Samples** - Sample code for authentication and document submission",
    );
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ccr_prompt_marks_priority() {
        let form = PartnerForm::default();
        assert!(ccr_prompt(&form, "Italy", true).contains("Italy (PRIORITY)"));
        let second = ccr_prompt(&form, "Spain", false);
        assert!(second.contains("for Spain."));
        assert!(second.contains("**Scope:** AR and AP"));
    }

    #[test]
    fn test_format_prompt_carries_placeholder() {
        let prompt = format_prompt(&PartnerForm::default(), "Italy", &missing_compliance("Italy"));
        assert!(prompt.contains("No compliance data available for Italy."));
    }

    #[test]
    fn test_api_prompt_references() {
        let ok = ReportSection::succeeded("ccr-italy", "Italy - CCR", "SDI clearance", Some("Italy"));
        let countries = vec!["Italy".to_string(), "Spain".to_string()];
        let prompt = api_prompt(&PartnerForm::default(), &countries, &[&ok]);
        assert!(prompt.contains("Countries: Italy, Spain"));
        let start = prompt.find(REFERENCE_START).unwrap_or(usize::MAX);
        let end = prompt.find(REFERENCE_END).unwrap_or(0);
        assert!(start < end);
        assert!(prompt[start..end].contains("SDI clearance"));
        assert!(prompt.contains("Do not restate it verbatim."));
    }

    #[test]
    fn test_api_prompt_without_references() {
        let prompt = api_prompt(&PartnerForm::default(), &["Italy".to_string()], &[]);
        assert!(!prompt.contains(REFERENCE_START));
        assert!(prompt.contains("8. **Code Samples**"));
    }
}
