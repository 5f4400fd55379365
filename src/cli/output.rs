//! Output formatting for CLI commands.

use std::fmt::Write;

use serde::Serialize;

use crate::agent::result::ChatAnswer;
use crate::agent::strategy::ExecutionStrategy;
use crate::report::Report;

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

impl OutputFormat {
    /// Parses a format name; anything unrecognized is text.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }

    /// Serializes `value` as pretty JSON with a trailing newline.
    #[must_use]
    pub fn to_json<T: Serialize>(self, value: &T) -> String {
        let mut out = serde_json::to_string_pretty(value).unwrap_or_else(|e| {
            format!("{{\"error\": \"serialization failed: {e}\"}}")
        });
        out.push('\n');
        out
    }
}

/// Renders a routing decision.
#[must_use]
pub fn format_strategy(strategy: &ExecutionStrategy) -> String {
    format!(
        "Strategy:   {}\nAgents:     {}\nComplexity: {}\nReasoning:  {}\n",
        strategy.mode,
        strategy.agents.join(", "),
        strategy.complexity.as_str(),
        strategy.reasoning
    )
}

/// Renders a chat answer followed by a one-line run summary.
#[must_use]
pub fn format_chat_answer(answer: &ChatAnswer) -> String {
    let m = &answer.metadata;
    let mut out = answer.content.clone();
    if !out.ends_with('\n') {
        out.push('\n');
    }
    let _ = write!(
        out,
        "\n[{} | {} | {} agent(s): {}",
        m.strategy,
        m.routing_policy,
        m.agent_count,
        m.agents_used.join(", ")
    );
    if !m.failed_agents.is_empty() {
        let _ = write!(out, " | failed: {}", m.failed_agents.join(", "));
    }
    let _ = writeln!(out, " | {:.2}s]", m.duration.as_secs_f64());
    out
}

/// Renders a report's checklist and section status.
#[must_use]
pub fn format_report(report: &Report) -> String {
    let v = &report.validation;
    let mut out = format!(
        "Report {} for {} ({})\n",
        report.report_id,
        report.partner.partner_company_name,
        report.countries.join(", ")
    );
    let _ = writeln!(
        out,
        "Status: {} | checks {}/{} | completeness {}% | critical failures {} | {}{}",
        if v.ready { "READY" } else { "INCOMPLETE" },
        v.passed_checks,
        v.total_checks,
        v.completeness,
        v.critical_failed,
        report.metadata.duration,
        if report.metadata.demo_mode { " | demo" } else { "" }
    );

    out.push_str("\nSections:\n");
    for s in &report.sections {
        let _ = writeln!(
            out,
            "  [{}] {} ({})",
            if s.success { "ok" } else { "FAILED" },
            s.title,
            s.id
        );
    }

    out.push_str("\nChecks:\n");
    for c in &v.checks {
        let _ = writeln!(
            out,
            "  [{}] {}{}",
            if c.passed { "x" } else { " " },
            c.check,
            if c.critical { " (critical)" } else { "" }
        );
    }

    if !report.metadata.errors.is_empty() {
        out.push_str("\nErrors:\n");
        for e in &report.metadata.errors {
            let _ = writeln!(out, "  {e}");
        }
    }
    out
}
