//! HTTP surface for the documentation site.
//!
//! # Feature Gate
//!
//! This module requires the `server` feature flag (on by default).
//!
//! # Endpoints
//!
//! ```text
//! POST   /api/proxy             single-workflow chat proxy
//! POST   /api/generate-report   onboarding report (saved to history)
//! POST   /api/chat              multi-agent chat with report context
//! GET    /api/reports           saved report listing
//! DELETE /api/reports           clear history
//! GET    /api/reports/{id}      one saved report
//! DELETE /api/reports/{id}      delete a saved report
//! GET    /api/settings          supervisor settings
//! PUT    /api/settings          replace supervisor settings
//! GET    /health                liveness
//! ```

pub mod params;
pub mod routes;
pub mod transport;

pub use routes::{AppState, router};
pub use transport::{DEFAULT_ORIGINS, ServeOptions, app, serve, serve_until};
