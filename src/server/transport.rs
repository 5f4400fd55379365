//! Listener, middleware, and shutdown for the HTTP server.

use std::time::Duration;

use axum::Router;
use axum::http::{HeaderName, HeaderValue, Method, header};
use tokio_util::sync::CancellationToken;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use super::routes::{AppState, router};

/// Origins allowed when none are configured.
pub const DEFAULT_ORIGINS: [&str; 2] = ["http://localhost:8000", "http://127.0.0.1:8000"];

/// How long browsers may cache a preflight answer.
const PREFLIGHT_MAX_AGE: Duration = Duration::from_secs(86_400);

/// Where and for whom the server listens.
#[derive(Debug, Clone)]
pub struct ServeOptions {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// CORS origins; `*` allows any.
    pub allowed_origins: Vec<String>,
}

impl Default for ServeOptions {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            allowed_origins: DEFAULT_ORIGINS.iter().map(|o| (*o).to_string()).collect(),
        }
    }
}

/// CORS policy for the browser client.
#[must_use]
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(origins.iter().filter_map(|o| HeaderValue::from_str(o).ok()))
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-requested-with"),
        ])
        .max_age(PREFLIGHT_MAX_AGE)
}

/// Router with CORS and request tracing applied.
pub fn app(state: AppState, origins: &[String]) -> Router {
    router(state)
        .layer(cors_layer(origins))
        .layer(TraceLayer::new_for_http())
}

/// Serves until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
pub async fn serve(state: AppState, options: &ServeOptions) -> anyhow::Result<()> {
    let shutdown = CancellationToken::new();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown requested");
        }
        trigger.cancel();
    });
    serve_until(state, options, shutdown).await
}

/// Serves until `shutdown` is cancelled, then drains in-flight requests.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
pub async fn serve_until(
    state: AppState,
    options: &ServeOptions,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let addr = format!("{}:{}", options.host, options.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!(
        addr = %addr,
        origins = ?options.allowed_origins,
        agents = ?state.supervisor.roster().keys(),
        "listening: POST /api/proxy, /api/generate-report, /api/chat"
    );

    axum::serve(listener, app(state, &options.allowed_origins))
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}
