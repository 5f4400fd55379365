//! HTTP handlers.
//!
//! Every reply is JSON. Status codes are limited to 200, 400 (bad or
//! missing input), 404 (unknown route or report) and 500 (upstream or
//! internal failure).

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};

use super::params::{
    ChatRequest, ErrorBody, GenerateReportRequest, ProxyRequest, ProxyResponse, ReportResponse,
    SettingsResponse,
};
use crate::agent::escalator::describe_failure;
use crate::agent::message::Credentials;
use crate::agent::orchestrator::{Supervisor, SupervisorSettings};
use crate::agent::result::ChatAnswer;
use crate::error::AgentError;
use crate::report::history::{ReportSummary, relevant_context};
use crate::report::{Report, ReportHistory, ReportMode, ReportPipeline};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    /// Chat orchestrator; also owns the escalator and roster used for reports.
    pub supervisor: Arc<Supervisor>,
    /// Saved reports.
    pub history: ReportHistory,
}

impl AppState {
    /// Bundles a supervisor and a history.
    #[must_use]
    pub fn new(supervisor: Arc<Supervisor>, history: ReportHistory) -> Self {
        Self { supervisor, history }
    }
}

/// Error reply with its status code.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    fn bad_request(error: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: ErrorBody {
                error: error.into(),
                message: None,
                is_timeout: None,
            },
        }
    }

    fn not_found(error: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            body: ErrorBody {
                error: error.into(),
                message: None,
                is_timeout: None,
            },
        }
    }

    fn rejected(rejection: &JsonRejection) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: ErrorBody {
                error: "Invalid request body".to_string(),
                message: Some(rejection.body_text()),
                is_timeout: None,
            },
        }
    }

    /// Maps an agent failure: caller mistakes are 400, the rest 500.
    fn from_agent(summary: &str, error: &AgentError) -> Self {
        match error {
            AgentError::InvalidInput { message } => Self::bad_request(message.clone()),
            other => {
                tracing::error!(error = %other, "{summary}");
                Self {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    body: ErrorBody {
                        error: summary.to_string(),
                        message: Some(describe_failure(other)),
                        is_timeout: Some(other.is_timeout()),
                    },
                }
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Token from the body, else from an `Authorization: Bearer` header.
fn credentials(body_token: Option<String>, headers: &HeaderMap) -> Option<Credentials> {
    body_token
        .filter(|t| !t.trim().is_empty())
        .or_else(|| {
            headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "))
                .map(str::to_string)
                .filter(|t| !t.trim().is_empty())
        })
        .map(Credentials::new)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Builds the router with every endpoint and the JSON 404 fallback.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/proxy", post(proxy))
        .route("/api/generate-report", post(generate_report))
        .route("/api/chat", post(chat))
        .route("/api/reports", get(list_reports).delete(clear_reports))
        .route("/api/reports/{id}", get(get_report).delete(delete_report))
        .route("/api/settings", get(get_settings).put(put_settings))
        .fallback(not_found)
        .method_not_allowed_fallback(not_found)
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message": "arena-supervisor is running",
        "services": {
            "chat": "ready",
            "onboarding": "ready",
        },
        "agents": state.supervisor.roster().keys(),
        "reports": state.history.len(),
    }))
}

async fn proxy(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<ProxyRequest>, JsonRejection>,
) -> Result<Json<ProxyResponse>, ApiError> {
    let Json(req) = payload.map_err(|r| ApiError::rejected(&r))?;
    let (Some(credentials), Some(workflow_id), Some(query)) = (
        credentials(req.api_token, &headers),
        non_blank(req.workflow_id),
        non_blank(req.query),
    ) else {
        return Err(ApiError::bad_request(
            "Missing required fields: apiToken, workflowId, query",
        ));
    };

    tracing::info!(workflow_id = %workflow_id, extended = req.extended_timeout, "proxy request");
    let page = req.context.unwrap_or_default();
    let inference = state
        .supervisor
        .proxy(&workflow_id, &query, &page, req.extended_timeout, &credentials)
        .await
        .map_err(|e| ApiError::from_agent("Proxy server error", &e))?;

    Ok(Json(ProxyResponse {
        success: true,
        content: inference.content,
        tokens_used: inference.tokens_used,
        model_used: state.supervisor.config().model.clone(),
    }))
}

async fn generate_report(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<GenerateReportRequest>, JsonRejection>,
) -> Result<Json<ReportResponse>, ApiError> {
    let Json(req) = payload.map_err(|r| ApiError::rejected(&r))?;
    let form = req
        .form_data
        .ok_or_else(|| ApiError::bad_request("Form data is required"))?
        .normalized();
    form.validate()
        .map_err(|e| ApiError::from_agent("Invalid form", &e))?;

    let credentials = credentials(req.api_token, &headers);
    let mode = match (&credentials, req.demo_mode) {
        (_, true) => ReportMode::Demo,
        (Some(c), false) => ReportMode::Live(c),
        (None, false) => {
            return Err(ApiError::bad_request(
                "API token is required (or enable demo mode)",
            ));
        }
    };

    let supervisor = &state.supervisor;
    let pipeline = ReportPipeline::new(
        supervisor.escalator(),
        supervisor.roster(),
        supervisor.config().report_max_tokens,
    );
    let report = pipeline
        .generate(&form, mode)
        .await
        .map_err(|e| ApiError::from_agent("Failed to generate report", &e))?;

    if let Err(e) = state.history.save(report.clone()) {
        tracing::warn!(error = %e, report_id = %report.report_id, "report not saved to history");
    }

    Ok(Json(ReportResponse {
        success: true,
        report,
    }))
}

async fn chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatAnswer>, ApiError> {
    let Json(req) = payload.map_err(|r| ApiError::rejected(&r))?;
    let (Some(credentials), Some(query)) =
        (credentials(req.api_token, &headers), non_blank(req.query))
    else {
        return Err(ApiError::bad_request("Missing required fields: apiToken, query"));
    };

    let report = match non_blank(req.report_id) {
        Some(id) => Some(
            state
                .history
                .get(&id)
                .ok_or_else(|| ApiError::not_found(format!("Report {id} not found")))?,
        ),
        None => state.history.latest(),
    };
    let report_context = report.as_ref().map(|r| relevant_context(&query, r));
    let page = req.context.unwrap_or_default();

    let answer = state
        .supervisor
        .handle_query(&query, &page, report_context.as_ref(), &credentials)
        .await
        .map_err(|e| ApiError::from_agent("Chat request failed", &e))?;
    Ok(Json(answer))
}

async fn list_reports(State(state): State<AppState>) -> Json<Vec<ReportSummary>> {
    Json(state.history.metadata())
}

async fn clear_reports(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "success": true, "cleared": state.history.clear() }))
}

async fn get_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Report>, ApiError> {
    state
        .history
        .get(&id)
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("Report {id} not found")))
}

async fn delete_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    if state.history.delete(&id) {
        Ok(Json(json!({ "success": true, "reportId": id })))
    } else {
        Err(ApiError::not_found(format!("Report {id} not found")))
    }
}

async fn get_settings(State(state): State<AppState>) -> Json<SupervisorSettings> {
    Json(state.supervisor.settings())
}

async fn put_settings(
    State(state): State<AppState>,
    payload: Result<Json<SupervisorSettings>, JsonRejection>,
) -> Result<Json<SettingsResponse>, ApiError> {
    let Json(settings) = payload.map_err(|r| ApiError::rejected(&r))?;
    let changed = state.supervisor.update_settings(settings);
    Ok(Json(SettingsResponse {
        changed,
        settings: state.supervisor.settings(),
    }))
}

async fn not_found() -> ApiError {
    ApiError::not_found("Not found")
}
