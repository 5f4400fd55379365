//! CLI layer for arena-supervisor.
//!
//! Provides the command-line interface using clap, with commands for
//! serving the HTTP API, asking the agents, previewing routing, and
//! generating onboarding reports.

pub mod commands;
pub mod output;
pub mod parser;

pub use commands::execute;
pub use output::OutputFormat;
pub use parser::{Cli, Commands};
