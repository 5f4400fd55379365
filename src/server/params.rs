//! Request and response bodies for the HTTP surface.
//!
//! Field names follow the browser client: camelCase, except the proxy
//! response's `tokens_used` / `model_used`.

use serde::{Deserialize, Serialize};

use crate::agent::message::PageContext;
use crate::agent::orchestrator::SupervisorSettings;
use crate::report::{PartnerForm, Report};

/// Body of `POST /api/proxy`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProxyRequest {
    /// Bearer token for the inference service.
    pub api_token: Option<String>,
    /// Workflow to call.
    pub workflow_id: Option<String>,
    /// User question.
    pub query: Option<String>,
    /// Page the question was asked from.
    pub context: Option<PageContext>,
    /// Start at the escalated deadline.
    pub extended_timeout: bool,
}

/// Successful `POST /api/proxy` reply.
#[derive(Debug, Clone, Serialize)]
pub struct ProxyResponse {
    /// Always `true`.
    pub success: bool,
    /// Answer text.
    pub content: String,
    /// Tokens reported by the service.
    pub tokens_used: u64,
    /// Model the request was sent to.
    pub model_used: String,
}

/// Body of `POST /api/generate-report`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerateReportRequest {
    /// Onboarding form.
    pub form_data: Option<PartnerForm>,
    /// Bearer token; not needed in demo mode.
    pub api_token: Option<String>,
    /// Use canned section text.
    pub demo_mode: bool,
}

/// Successful `POST /api/generate-report` reply.
#[derive(Debug, Clone, Serialize)]
pub struct ReportResponse {
    /// Always `true`; section failures are reported in `validation`.
    pub success: bool,
    /// The report.
    #[serde(flatten)]
    pub report: Report,
}

/// Body of `POST /api/chat`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChatRequest {
    /// Bearer token for the inference service.
    pub api_token: Option<String>,
    /// User question.
    pub query: Option<String>,
    /// Page the question was asked from.
    pub context: Option<PageContext>,
    /// Saved report to draw context from; the latest one when absent.
    pub report_id: Option<String>,
}

/// Reply to `PUT /api/settings`.
#[derive(Debug, Clone, Serialize)]
pub struct SettingsResponse {
    /// Whether anything changed.
    pub changed: bool,
    /// Settings now in effect.
    pub settings: SupervisorSettings,
}

/// Error reply for every endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    /// Short error summary.
    pub error: String,
    /// Details, when available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Whether the failure was a deadline expiry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_timeout: Option<bool>,
}
