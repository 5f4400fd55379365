//! Onboarding report pipeline.
//!
//! ```text
//! CollectingCountries → PerCountryLoop (CCR → Format, one country at a time)
//!   → ApiSynthesis → Validating → Done
//! ```
//!
//! A failed section never stops the pipeline: the format step for a country
//! whose compliance section failed gets a placeholder instead, and the API
//! guide is always attempted. Demo mode walks the same states with canned
//! text and makes no remote calls.

use std::fmt::Write;
use std::time::Instant;

use chrono::Utc;

use super::demo;
use super::form::PartnerForm;
use super::prompt::{api_prompt, ccr_prompt, format_prompt, missing_compliance};
use super::section::{
    API_SECTION_ID, EXECUTIVE_SUMMARY_ID, ReportSection, ccr_section_id, ccr_title,
    format_section_id, format_title,
};
use super::validation::validate;
use super::{Report, ReportMetadata, new_report_id};
use crate::agent::client::AgentClient;
use crate::agent::escalator::{DeadlinePolicy, Escalator};
use crate::agent::message::Credentials;
use crate::agent::result::{AgentResult, format_duration};
use crate::agent::roster::Roster;
use crate::core::Domain;
use crate::error::AgentError;

/// Pipeline state, logged as each stage begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Countries resolved and the executive summary built.
    CollectingCountries,
    /// CCR then Format for each country, strictly in order.
    PerCountryLoop,
    /// API guide built from every successful section.
    ApiSynthesis,
    /// Completeness checks.
    Validating,
    /// Report assembled.
    Done,
}

/// Where section text comes from.
#[derive(Debug, Clone, Copy)]
pub enum ReportMode<'c> {
    /// Remote agents, authenticated with the caller's token.
    Live(&'c Credentials),
    /// Canned text, no remote calls.
    Demo,
}

impl ReportMode<'_> {
    /// Whether this is demo mode.
    #[must_use]
    pub const fn is_demo(&self) -> bool {
        matches!(self, Self::Demo)
    }
}

/// Clients for the three report domains.
struct ReportAgents {
    compliance: AgentClient,
    format: AgentClient,
    api: AgentClient,
}

impl ReportAgents {
    const fn get(&self, domain: Domain) -> &AgentClient {
        match domain {
            Domain::Compliance => &self.compliance,
            Domain::Format => &self.format,
            Domain::Api => &self.api,
        }
    }
}

/// Generates onboarding reports.
pub struct ReportPipeline<'a> {
    escalator: &'a Escalator,
    roster: &'a Roster,
    max_tokens: u32,
}

impl<'a> ReportPipeline<'a> {
    /// Creates a pipeline over shared agent state.
    #[must_use]
    pub const fn new(escalator: &'a Escalator, roster: &'a Roster, max_tokens: u32) -> Self {
        Self {
            escalator,
            roster,
            max_tokens,
        }
    }

    fn agents(&self) -> Result<ReportAgents, AgentError> {
        let client = |domain: Domain| {
            self.roster
                .by_domain(domain)
                .map(|a| AgentClient::for_agent(a, self.max_tokens))
                .ok_or_else(|| AgentError::Config {
                    message: format!("roster has no {domain} agent"),
                })
        };
        Ok(ReportAgents {
            compliance: client(Domain::Compliance)?,
            format: client(Domain::Format)?,
            api: client(Domain::Api)?,
        })
    }

    /// Runs the pipeline for a normalized form.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::InvalidInput`] when the form names no country
    /// and [`AgentError::Config`] when a live run lacks an agent for one of
    /// the report domains. Section failures are recorded in the report.
    pub async fn generate(&self, form: &PartnerForm, mode: ReportMode<'_>) -> Result<Report, AgentError> {
        let start = Instant::now();
        form.validate()?;
        let agents = match mode {
            ReportMode::Live(_) => Some(self.agents()?),
            ReportMode::Demo => None,
        };

        tracing::info!(stage = ?Stage::CollectingCountries, partner = %form.partner_company_name, demo = mode.is_demo(), "generating report");
        let countries = form.countries();
        let policy = DeadlinePolicy::Report {
            countries: countries.len(),
        };
        let mut sections = vec![ReportSection::succeeded(
            EXECUTIVE_SUMMARY_ID,
            "Executive Summary",
            executive_summary(form, &countries),
            None,
        )];

        tracing::info!(stage = ?Stage::PerCountryLoop, countries = countries.len(), "collecting country sections");
        for (i, country) in countries.iter().enumerate() {
            let ccr = self
                .produce(
                    mode,
                    agents.as_ref(),
                    Domain::Compliance,
                    policy,
                    || ccr_prompt(form, country, i == 0),
                    || demo::ccr(country),
                )
                .await;
            let ccr = ReportSection::from_result(ccr_section_id(country), ccr_title(country), Some(country.as_str()), ccr);

            let compliance = ccr
                .text()
                .map_or_else(|| missing_compliance(country), str::to_string);
            let format = self
                .produce(
                    mode,
                    agents.as_ref(),
                    Domain::Format,
                    policy,
                    || format_prompt(form, country, &compliance),
                    || demo::format(country),
                )
                .await;
            let format = ReportSection::from_result(
                format_section_id(country),
                format_title(country),
                Some(country.as_str()),
                format,
            );

            tracing::info!(
                country = %country,
                ccr = ccr.success,
                format = format.success,
                "country sections done"
            );
            sections.push(ccr);
            sections.push(format);
        }

        tracing::info!(stage = ?Stage::ApiSynthesis, "building API implementation guide");
        let api = {
            let references: Vec<&ReportSection> = sections
                .iter()
                .filter(|s| s.id != EXECUTIVE_SUMMARY_ID && s.success)
                .collect();
            self.produce(
                mode,
                agents.as_ref(),
                Domain::Api,
                policy,
                || api_prompt(form, &countries, &references),
                || demo::api(form),
            )
            .await
        };
        sections.push(ReportSection::from_result(
            API_SECTION_ID,
            "API Implementation Guide",
            None,
            api,
        ));

        tracing::info!(stage = ?Stage::Validating, "validating report");
        let validation = validate(form, &countries, &sections);

        let generated_at = Utc::now();
        let report_id = new_report_id(generated_at);
        let errors: Vec<String> = sections
            .iter()
            .filter_map(|s| s.error.as_ref().map(|e| format!("{}: {e}", s.title)))
            .collect();
        let sections_succeeded = sections.iter().filter(|s| s.success).count();
        let metadata = ReportMetadata {
            report_id: report_id.clone(),
            generated_at,
            duration: format_duration(start.elapsed()),
            demo_mode: mode.is_demo(),
            countries: countries.clone(),
            sections_succeeded,
            sections_failed: sections.len() - sections_succeeded,
            errors,
        };

        tracing::info!(
            stage = ?Stage::Done,
            report_id = %report_id,
            duration = %metadata.duration,
            ready = validation.ready,
            completeness = validation.completeness,
            "report generated"
        );

        Ok(Report {
            report_id,
            generated_at,
            partner: form.clone(),
            countries,
            sections,
            validation,
            metadata,
        })
    }

    async fn produce(
        &self,
        mode: ReportMode<'_>,
        agents: Option<&ReportAgents>,
        domain: Domain,
        policy: DeadlinePolicy,
        prompt: impl FnOnce() -> String,
        canned: impl FnOnce() -> String,
    ) -> AgentResult {
        match (mode, agents) {
            (ReportMode::Live(credentials), Some(agents)) => {
                let client = agents.get(domain);
                self.escalator
                    .call(&client.key, &client.call(prompt()), policy, credentials)
                    .await
            }
            _ => AgentResult::success(domain.as_str(), canned()),
        }
    }
}

fn executive_summary(form: &PartnerForm, countries: &[String]) -> String {
    let mut out = format!("# {} Onboarding Summary\n\n## Partner Profile\n", form.partner_company_name);
    let country_list = countries
        .iter()
        .enumerate()
        .map(|(i, c)| if i == 0 { format!("{c} (priority)") } else { c.clone() })
        .collect::<Vec<_>>()
        .join(", ");

    let rows = [
        ("Partnership Type", form.partnership_type.clone()),
        ("Countries", country_list),
        ("Systems", form.systems_label()),
        ("Invoice Handling", form.scope_label()),
        ("Monthly Volume", format!("{} invoices", form.invoice_volume)),
        ("Programming Language", form.programming_language.clone()),
        ("Service Model", form.service_model.clone()),
        ("First-Line Support", form.first_line_support.clone()),
        ("Account Access", form.account_access.clone()),
    ];
    for (label, value) in rows {
        let _ = writeln!(out, "- **{label}:** {value}");
    }

    let contacts = [
        ("Project Manager", &form.project_manager_name, &form.project_manager_email),
        ("Technical Lead", &form.technical_lead_name, &form.technical_lead_email),
    ];
    let mut header_written = false;
    for (role, name, email) in contacts {
        if name.trim().is_empty() && email.trim().is_empty() {
            continue;
        }
        if !header_written {
            out.push_str("\n## Contacts\n");
            header_written = true;
        }
        let _ = match (name.trim(), email.trim()) {
            (n, "") => writeln!(out, "- **{role}:** {n}"),
            ("", e) => writeln!(out, "- **{role}:** {e}"),
            (n, e) => writeln!(out, "- **{role}:** {n} <{e}>"),
        };
    }
    out
}
