//! # arena-supervisor
//!
//! Backend for an e-invoicing API guide's assistant. A supervisor routes
//! each question to specialist agents (country compliance, document
//! format, API integration) that are backed by remote inference
//! workflows, then merges their answers. The same agents assemble
//! partner onboarding reports country by country.
//!
//! ## Modules
//!
//! - [`agent`]: inference client, deadline escalation, routing, execution
//!   and synthesis
//! - [`report`]: onboarding form, report pipeline, validation, and history
//! - [`server`]: HTTP endpoints (feature `server`)
//! - [`cli`]: command-line interface
//! - [`core`]: domain enum, slugs, and the key-value store seam
//! - [`error`]: error types
//!
//! ## Example
//!
//! ```no_run
//! use arena_supervisor::agent::{Roster, route_by_rules};
//!
//! let roster = Roster::defaults();
//! let strategy = route_by_rules("Which XML schema does PUF use?", &roster);
//! assert_eq!(strategy.agents, vec!["puf"]);
//! ```

pub mod agent;
pub mod cli;
pub mod core;
pub mod error;
pub mod report;
#[cfg(feature = "server")]
pub mod server;

pub use agent::{AgentConfig, Supervisor, SupervisorSettings};
pub use error::{AgentError, CommandError, Error, Result};
pub use report::{PartnerForm, Report, ReportHistory, ReportPipeline};
