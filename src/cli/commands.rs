//! CLI command implementations.
//!
//! Each command is synchronous at the boundary; commands that talk to the
//! inference endpoint create a tokio runtime and block on it.

#![allow(clippy::uninlined_format_args)]
#![allow(clippy::format_push_string)]

use std::io::{self, Read};
use std::path::{Path, PathBuf};

use crate::agent::client::create_provider;
use crate::agent::config::{AgentConfig, RoutingPolicy};
use crate::agent::message::{Credentials, PageContext};
use crate::agent::orchestrator::Supervisor;
use crate::agent::roster::Roster;
use crate::agent::router::route_by_rules;
use crate::cli::output::{OutputFormat, format_chat_answer, format_report, format_strategy};
use crate::cli::parser::{Cli, Commands};
use crate::error::{CommandError, Result};
use crate::report::{PartnerForm, ReportMode, ReportPipeline};

/// Executes the CLI command.
///
/// # Arguments
///
/// * `cli` - Parsed CLI arguments.
///
/// # Returns
///
/// Result with output string on success.
///
/// # Errors
///
/// Returns an error if the command fails to execute.
pub fn execute(cli: &Cli) -> Result<String> {
    let format = OutputFormat::parse(&cli.format);
    let roster = cli.roster.as_deref();

    match &cli.command {
        #[cfg(feature = "server")]
        Commands::Serve {
            host,
            port,
            origins,
        } => cmd_serve(roster, host, *port, origins),
        Commands::Ask {
            query,
            token,
            workflow,
            routing,
            no_synthesis,
            page,
            extended_timeout,
        } => {
            let params = AskParams {
                query,
                token: token.as_deref(),
                workflow: workflow.as_deref(),
                routing: routing.as_deref(),
                no_synthesis: *no_synthesis,
                page: page.as_deref(),
                extended_timeout: *extended_timeout,
            };
            cmd_ask(roster, &params, format)
        }
        Commands::Route { query } => cmd_route(roster, query, format),
        Commands::Report {
            form,
            demo,
            token,
            output,
        } => cmd_report(
            roster,
            form,
            *demo,
            token.as_deref(),
            output.as_deref(),
            format,
        ),
        Commands::InitConfig { path, force } => cmd_init_config(path.as_deref(), *force, format),
    }
}

/// Parameters for the ask command.
#[derive(Debug, Clone, Default)]
pub struct AskParams<'a> {
    /// The question.
    pub query: &'a str,
    /// Bearer token.
    pub token: Option<&'a str>,
    /// Workflow to call directly, bypassing routing.
    pub workflow: Option<&'a str>,
    /// Routing policy override.
    pub routing: Option<&'a str>,
    /// Disable synthesis of multi-agent answers.
    pub no_synthesis: bool,
    /// Page title passed as context.
    pub page: Option<&'a str>,
    /// Start at the escalated deadline.
    pub extended_timeout: bool,
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new().map_err(|e| {
        CommandError::ExecutionFailed(format!("Failed to create async runtime: {e}")).into()
    })
}

fn require_token(token: Option<&str>, hint: &str) -> Result<Credentials> {
    match token.map(str::trim) {
        Some(t) if !t.is_empty() => Ok(Credentials::new(t)),
        _ => Err(CommandError::MissingInput(format!(
            "API token is required (set ARENA_API_TOKEN or pass --token{hint})"
        ))
        .into()),
    }
}

/// Builds a supervisor from the environment plus CLI overrides.
fn build_supervisor(
    roster_path: Option<&Path>,
    routing: Option<RoutingPolicy>,
    synthesis: Option<bool>,
) -> Result<Supervisor> {
    let mut builder = AgentConfig::builder();
    if let Some(path) = roster_path {
        builder = builder.roster_path(path);
    }
    if let Some(policy) = routing {
        builder = builder.routing(policy);
    }
    if let Some(enabled) = synthesis {
        builder = builder.synthesis_enabled(enabled);
    }

    let config = builder.from_env().build().map_err(|e| {
        CommandError::ExecutionFailed(format!("Agent configuration error: {e}"))
    })?;
    let roster = Roster::load(config.roster_path.as_deref())
        .map_err(|e| CommandError::ExecutionFailed(format!("Roster error: {e}")))?;
    let provider = create_provider(&config).map_err(|e| {
        CommandError::ExecutionFailed(format!("Provider creation failed: {e}"))
    })?;

    Ok(Supervisor::new(provider, config, roster))
}

#[cfg(feature = "server")]
fn cmd_serve(roster: Option<&Path>, host: &str, port: u16, origins: &[String]) -> Result<String> {
    use std::sync::Arc;

    use crate::core::MemoryStore;
    use crate::report::ReportHistory;
    use crate::server::{AppState, DEFAULT_ORIGINS, ServeOptions, serve};

    let supervisor = build_supervisor(roster, None, None)?;
    let history = ReportHistory::new(Arc::new(MemoryStore::new()));
    let state = AppState::new(Arc::new(supervisor), history);

    let allowed_origins = if origins.is_empty() {
        DEFAULT_ORIGINS.iter().map(|o| (*o).to_string()).collect()
    } else {
        origins.to_vec()
    };
    let options = ServeOptions {
        host: host.to_string(),
        port,
        allowed_origins,
    };

    runtime()?
        .block_on(serve(state, &options))
        .map_err(|e| CommandError::ExecutionFailed(format!("Server error: {e}")))?;

    Ok(String::new())
}

fn cmd_ask(roster: Option<&Path>, params: &AskParams<'_>, format: OutputFormat) -> Result<String> {
    let credentials = require_token(params.token, "")?;

    let routing = match params.routing {
        Some(name) => Some(RoutingPolicy::parse(name).ok_or_else(|| {
            CommandError::ExecutionFailed(format!(
                "Unknown routing policy '{name}' (expected rule-based or ai-assisted)"
            ))
        })?),
        None => None,
    };
    let synthesis = params.no_synthesis.then_some(false);
    let supervisor = build_supervisor(roster, routing, synthesis)?;

    let page = PageContext {
        page: params.page.map(String::from),
        ..PageContext::default()
    };

    let rt = runtime()?;

    if let Some(workflow) = params.workflow {
        let inference = rt
            .block_on(supervisor.proxy(
                workflow,
                params.query,
                &page,
                params.extended_timeout,
                &credentials,
            ))
            .map_err(|e| CommandError::ExecutionFailed(format!("Query failed: {e}")))?;
        return Ok(match format {
            OutputFormat::Text => {
                let mut out = inference.content;
                out.push_str(&format!(
                    "\n\n[{} | {} tokens]\n",
                    workflow, inference.tokens_used
                ));
                out
            }
            OutputFormat::Json => format.to_json(&inference),
        });
    }

    let answer = rt
        .block_on(supervisor.handle_query(params.query, &page, None, &credentials))
        .map_err(|e| CommandError::ExecutionFailed(format!("Query failed: {e}")))?;

    Ok(match format {
        OutputFormat::Text => format_chat_answer(&answer),
        OutputFormat::Json => format.to_json(&answer),
    })
}

fn cmd_route(roster: Option<&Path>, query: &str, format: OutputFormat) -> Result<String> {
    if query.trim().is_empty() {
        return Err(CommandError::MissingInput("query is empty".to_string()).into());
    }
    let roster = Roster::load(roster)
        .map_err(|e| CommandError::ExecutionFailed(format!("Roster error: {e}")))?;
    let strategy = route_by_rules(query, &roster);

    Ok(match format {
        OutputFormat::Text => format_strategy(&strategy),
        OutputFormat::Json => format.to_json(&strategy),
    })
}

fn read_form(path: &Path) -> Result<PartnerForm> {
    let text = if path.as_os_str() == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(path)?
    };
    let form: PartnerForm = serde_json::from_str(&text).map_err(|e| {
        CommandError::ExecutionFailed(format!("Invalid form JSON in {}: {e}", path.display()))
    })?;
    Ok(form.normalized())
}

fn cmd_report(
    roster: Option<&Path>,
    form_path: &Path,
    demo: bool,
    token: Option<&str>,
    output: Option<&Path>,
    format: OutputFormat,
) -> Result<String> {
    let form = read_form(form_path)?;
    form.validate()?;

    let credentials = if demo {
        None
    } else {
        Some(require_token(token, " or --demo")?)
    };
    let mode = credentials.as_ref().map_or(ReportMode::Demo, ReportMode::Live);

    let supervisor = build_supervisor(roster, None, None)?;
    let pipeline = ReportPipeline::new(
        supervisor.escalator(),
        supervisor.roster(),
        supervisor.config().report_max_tokens,
    );

    let report = runtime()?
        .block_on(pipeline.generate(&form, mode))
        .map_err(|e| CommandError::ExecutionFailed(format!("Report generation failed: {e}")))?;

    let mut out = match format {
        OutputFormat::Text => format_report(&report),
        OutputFormat::Json => format.to_json(&report),
    };

    if let Some(path) = output {
        let json = serde_json::to_string_pretty(&report)
            .map_err(|e| CommandError::OutputFormat(format!("JSON serialization failed: {e}")))?;
        std::fs::write(path, json)?;
        if format == OutputFormat::Text {
            out.push_str(&format!("\nReport written to {}\n", path.display()));
        }
    }

    Ok(out)
}

fn cmd_init_config(path: Option<&Path>, force: bool, format: OutputFormat) -> Result<String> {
    let target: PathBuf = path
        .map(PathBuf::from)
        .or_else(Roster::default_path)
        .ok_or_else(|| {
            CommandError::MissingInput(
                "no config directory found; pass --path".to_string(),
            )
        })?;

    let written = Roster::write_default(&target, force)?;

    Ok(match format {
        OutputFormat::Text => {
            if written {
                format!("Wrote default roster to {}\n", target.display())
            } else {
                format!(
                    "Roster already exists at {} (use --force to overwrite)\n",
                    target.display()
                )
            }
        }
        OutputFormat::Json => format.to_json(&serde_json::json!({
            "path": target.display().to_string(),
            "written": written,
        })),
    })
}
