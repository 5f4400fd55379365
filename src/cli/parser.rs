//! Command-line argument parsing.
//!
//! Defines the CLI structure using clap derive macros.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// arena-supervisor: multi-agent e-invoicing assistant backend.
///
/// Routes questions across specialist inference workflows, generates
/// partner onboarding reports, and serves both over HTTP.
#[derive(Parser, Debug)]
#[command(name = "arena-supervisor")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the agent roster JSON.
    ///
    /// Defaults to `~/.config/arena-supervisor/roster.json`, falling back to
    /// the built-in roster when that file does not exist.
    #[arg(short, long, env = "ARENA_ROSTER_PATH", global = true)]
    pub roster: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output format (text, json).
    #[arg(long, default_value = "text", global = true)]
    pub format: String,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP server.
    #[cfg(feature = "server")]
    #[command(after_help = r#"Examples:
  arena-supervisor serve                              # 127.0.0.1:3000
  arena-supervisor serve --host 0.0.0.0 --port 8080
  arena-supervisor serve --origin https://docs.example.com --origin http://localhost:8000
"#)]
    Serve {
        /// Host to bind to.
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to.
        #[arg(long, default_value = "3000")]
        port: u16,

        /// Allowed CORS origin (repeatable, `*` for any).
        #[arg(long = "origin", env = "ARENA_ALLOWED_ORIGINS", value_delimiter = ',')]
        origins: Vec<String>,
    },

    /// Ask the specialist agents a question.
    ///
    /// Routes the question, runs the chosen agents, and prints the merged
    /// answer. With `--workflow`, sends it to that workflow directly.
    #[command(after_help = r#"Examples:
  arena-supervisor ask "How do I authenticate with the OAuth endpoint?"
  arena-supervisor ask "mandatory fields for Poland" --routing ai-assisted
  arena-supervisor ask "What is SDI?" --workflow f87b828b-39cb-4a9e-9225-bb9e67ff4860
  ARENA_API_TOKEN=... arena-supervisor --format json ask "webhook retries"
"#)]
    Ask {
        /// The question.
        query: String,

        /// Bearer token for the inference service.
        #[arg(long, env = "ARENA_API_TOKEN", hide_env_values = true)]
        token: Option<String>,

        /// Send to one workflow instead of routing.
        #[arg(long)]
        workflow: Option<String>,

        /// Routing policy (rule-based, ai-assisted).
        #[arg(long)]
        routing: Option<String>,

        /// Disable LLM synthesis of multi-agent answers.
        #[arg(long)]
        no_synthesis: bool,

        /// Title of the documentation page the question relates to.
        #[arg(long)]
        page: Option<String>,

        /// Start at the escalated deadline (with `--workflow`).
        #[arg(long)]
        extended_timeout: bool,
    },

    /// Show how a question would be routed by keyword rules.
    ///
    /// Makes no remote calls.
    #[command(after_help = r#"Examples:
  arena-supervisor route "Which XML schema does PUF use?"
  arena-supervisor --format json route "complete guide for Germany"
"#)]
    Route {
        /// The question.
        query: String,
    },

    /// Generate a partner onboarding report.
    #[command(after_help = r#"Examples:
  arena-supervisor report --form partner.json --demo
  arena-supervisor report --form partner.json --output report.json
  cat partner.json | arena-supervisor report --form - --demo
"#)]
    Report {
        /// Form JSON file (`-` for stdin).
        #[arg(long)]
        form: PathBuf,

        /// Use canned section text instead of calling agents.
        #[arg(long)]
        demo: bool,

        /// Bearer token for the inference service.
        #[arg(long, env = "ARENA_API_TOKEN", hide_env_values = true)]
        token: Option<String>,

        /// Write the full report JSON to this file.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Write the default agent roster for editing.
    #[command(after_help = r#"Examples:
  arena-supervisor init-config                    # ~/.config/arena-supervisor/roster.json
  arena-supervisor init-config --path ./roster.json --force
"#)]
    InitConfig {
        /// Target file (defaults to the standard roster path).
        #[arg(long)]
        path: Option<PathBuf>,

        /// Overwrite an existing file.
        #[arg(short, long)]
        force: bool,
    },
}
