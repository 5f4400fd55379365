//! Canned section text for demo mode.
//!
//! Demo reports run the same pipeline without credentials. Text is
//! deterministic for a given form so demo output can be asserted on.

use super::form::PartnerForm;

/// Compliance section for `country`.
#[must_use]
pub fn ccr(country: &str) -> String {
    format!(
        "# {country} Compliance Requirements (DEMO DATA)

### Compliance Model
- **Mandate Status:** E-invoicing is MANDATORY for B2B and B2G transactions
- **Clearance Model:** Real-time clearance through the government platform

### Required Document Types
- B2B commercial invoices (mandatory)
- Credit notes and debit notes (mandatory)

### Mandatory Fields
- Seller VAT ID, buyer VAT ID
- Invoice number (sequential)
- Line item details with VAT

### Key Integration Notes
- TLS 1.2+ required
- Digital signature required
- Batch submission not supported"
    )
}

/// Document format section for `country`.
#[must_use]
pub fn format(country: &str) -> String {
    format!(
        "# {country} Document Format (DEMO DATA)

### Document Structure
- Header, parties, line items, tax summary, totals

### Country Extensions
- Tax authority document type code for {country}
- Recipient routing identifier

### Validation Rules
- Totals must equal the sum of line amounts plus VAT
- Dates in ISO 8601 format"
    )
}

/// API implementation guide.
#[must_use]
pub fn api(form: &PartnerForm) -> String {
    format!(
        "# API Implementation Guide (DEMO DATA)

Scope: {scope} for {company}.

## 1. Authentication Setup

**OAuth 2.0 Client Credentials Flow**

```javascript
const response = await fetch('https://api.example.com/oauth/token', {{
  method: 'POST',
  body: 'grant_type=client_credentials&client_id=YOUR_ID&client_secret=YOUR_SECRET'
}});
```

## 2. Submit Invoice

```javascript
POST /v1/documents
{{
  \"documentType\": \"invoice\",
  \"direction\": \"outbound\",
  \"document\": {{ /* universal format */ }}
}}
```

## 3. Best Practices
- Cache tokens for 50 minutes
- Use webhooks for status updates
- Implement exponential backoff for retries",
        scope = form.scope_label(),
        company = form.partner_company_name,
    )
}
