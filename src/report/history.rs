//! Saved reports and chat context extraction.
//!
//! Reports are kept as one JSON array under [`STORAGE_KEY`], newest first,
//! capped at [`MAX_REPORTS`]. Saving a report whose id is already stored
//! replaces it in place.

use std::sync::{Arc, LazyLock, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Serialize;

use super::Report;
use crate::agent::message::{ContextSection, ReportContext};
use crate::core::{Domain, KeyValueStore};

/// Store key holding the report array.
pub const STORAGE_KEY: &str = "partner_reports";
/// Reports kept; older ones are dropped on save.
pub const MAX_REPORTS: usize = 50;
/// Words kept in a section summary.
pub const SUMMARY_WORD_LIMIT: usize = 200;

static CODE_BLOCK: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"(?s)```.*?```").ok());

/// Listing entry for a saved report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    /// Report id.
    pub report_id: String,
    /// Completion time.
    pub generated_at: DateTime<Utc>,
    /// Countries covered.
    pub countries: Vec<String>,
    /// Number of sections.
    pub section_count: usize,
    /// Partner company.
    pub partner_company_name: String,
    /// Language chosen for code samples.
    pub programming_language: String,
}

impl From<&Report> for ReportSummary {
    fn from(report: &Report) -> Self {
        Self {
            report_id: report.report_id.clone(),
            generated_at: report.generated_at,
            countries: report.countries.clone(),
            section_count: report.sections.len(),
            partner_company_name: report.partner.partner_company_name.clone(),
            programming_language: report.partner.programming_language.clone(),
        }
    }
}

/// Report history over a [`KeyValueStore`].
///
/// Clones share one lock that serializes every read-modify-write.
#[derive(Clone)]
pub struct ReportHistory {
    store: Arc<dyn KeyValueStore>,
    lock: Arc<Mutex<()>>,
}

impl ReportHistory {
    /// Creates a history backed by `store`.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            lock: Arc::new(Mutex::new(())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// All saved reports, newest first.
    ///
    /// An unreadable stored value is treated as empty.
    #[must_use]
    pub fn all(&self) -> Vec<Report> {
        let Some(raw) = self.store.get(STORAGE_KEY) else {
            return Vec::new();
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "stored report history is unreadable, ignoring it");
            Vec::new()
        })
    }

    fn write(&self, reports: &[Report]) -> Result<(), serde_json::Error> {
        self.store.set(STORAGE_KEY, serde_json::to_string(reports)?);
        Ok(())
    }

    /// Saves `report` at the front, or in place if its id is already stored.
    ///
    /// # Errors
    ///
    /// Returns the serialization error if the history cannot be encoded.
    pub fn save(&self, report: Report) -> Result<(), serde_json::Error> {
        let _guard = self.lock();
        let mut reports = self.all();
        if let Some(existing) = reports.iter_mut().find(|r| r.report_id == report.report_id) {
            *existing = report;
        } else {
            reports.insert(0, report);
        }
        reports.truncate(MAX_REPORTS);
        self.write(&reports)
    }

    /// Most recent report.
    #[must_use]
    pub fn latest(&self) -> Option<Report> {
        self.all().into_iter().next()
    }

    /// Report by id.
    #[must_use]
    pub fn get(&self, report_id: &str) -> Option<Report> {
        self.all().into_iter().find(|r| r.report_id == report_id)
    }

    /// Deletes a report. Returns `false` if it was not stored.
    pub fn delete(&self, report_id: &str) -> bool {
        let _guard = self.lock();
        let mut reports = self.all();
        let before = reports.len();
        reports.retain(|r| r.report_id != report_id);
        if reports.len() == before {
            return false;
        }
        match self.write(&reports) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, report_id, "failed to rewrite report history");
                false
            }
        }
    }

    /// Removes every report. Returns `true` if anything was stored.
    pub fn clear(&self) -> bool {
        let _guard = self.lock();
        self.store.delete(STORAGE_KEY)
    }

    /// Number of saved reports.
    #[must_use]
    pub fn len(&self) -> usize {
        self.all().len()
    }

    /// Whether no report is saved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Listing entries for every saved report, newest first.
    #[must_use]
    pub fn metadata(&self) -> Vec<ReportSummary> {
        self.all().iter().map(ReportSummary::from).collect()
    }
}

impl std::fmt::Debug for ReportHistory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportHistory").finish_non_exhaustive()
    }
}

const TOPIC_KEYWORDS: [(Domain, &[&str]); 3] = [
    (
        Domain::Compliance,
        &["compliance", "mandate", "regulation", "requirement", "penalty", "tax", "clearance"],
    ),
    (
        Domain::Format,
        &["format", "xml", "schema", "field", "validation", "puf", "document"],
    ),
    (
        Domain::Api,
        &["api", "endpoint", "implementation", "code", "submit", "authenticate", "oauth"],
    ),
];

fn topic_of(query_lower: &str) -> Option<Domain> {
    TOPIC_KEYWORDS
        .iter()
        .find(|(_, words)| words.iter().any(|w| query_lower.contains(w)))
        .map(|(domain, _)| *domain)
}

fn covers(domain: Domain, id: &str, title: &str) -> bool {
    let id = id.to_lowercase();
    let title = title.to_lowercase();
    match domain {
        Domain::Compliance => title.contains("compliance") || id.contains("compliance") || id.contains("ccr"),
        Domain::Format => title.contains("format") || title.contains("document") || id.contains("puf"),
        Domain::Api => title.contains("api") || title.contains("implementation"),
    }
}

/// Selects the successful sections of `report` that bear on `query`.
///
/// If the query names any of the report's countries, sections for other
/// countries are dropped. If it matches a topic keyword (compliance first,
/// then format, then api), only sections on that topic are kept.
#[must_use]
pub fn relevant_context(query: &str, report: &Report) -> ReportContext {
    let lower = query.to_lowercase();
    let mentioned: Vec<String> = report
        .countries
        .iter()
        .map(|c| c.to_lowercase())
        .filter(|c| lower.contains(c.as_str()))
        .collect();
    let topic = topic_of(&lower);

    let relevant_sections = report
        .sections
        .iter()
        .filter(|s| s.success)
        .filter(|s| {
            mentioned.is_empty()
                || s
                    .country
                    .as_ref()
                    .is_none_or(|c| mentioned.contains(&c.to_lowercase()))
        })
        .filter(|s| topic.is_none_or(|t| covers(t, &s.id, &s.title)))
        .map(|s| ContextSection {
            id: s.id.clone(),
            title: s.title.clone(),
            summary: summarize(s.content.as_deref().unwrap_or_default()),
            country: s.country.clone(),
        })
        .collect();

    ReportContext {
        report_id: report.report_id.clone(),
        countries: report.countries.clone(),
        relevant_sections,
    }
}

/// First [`SUMMARY_WORD_LIMIT`] words of `content` with code blocks and
/// markdown markers removed. Appends `...` when truncated.
#[must_use]
pub fn summarize(content: &str) -> String {
    let without_code = CODE_BLOCK
        .as_ref()
        .map_or_else(|| content.to_string(), |re| re.replace_all(content, "").into_owned());
    let plain: String = without_code
        .chars()
        .filter(|c| !matches!(c, '#' | '*' | '`'))
        .collect();

    let words: Vec<&str> = plain.split_whitespace().collect();
    let mut summary = words
        .iter()
        .take(SUMMARY_WORD_LIMIT)
        .copied()
        .collect::<Vec<_>>()
        .join(" ");
    if words.len() > SUMMARY_WORD_LIMIT {
        summary.push_str("...");
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::MemoryStore;
    use crate::report::section::{ReportSection, ccr_section_id, ccr_title, format_section_id, format_title};
    use crate::report::validation::ValidationSummary;
    use crate::report::{PartnerForm, ReportMetadata};

    fn report(id: &str) -> Report {
        let countries = vec!["Italy".to_string(), "Poland".to_string()];
        let mut sections = vec![ReportSection::succeeded("executive-summary", "Executive Summary", "Acme", None)];
        for c in &countries {
            sections.push(ReportSection::succeeded(
                ccr_section_id(c),
                ccr_title(c),
                format!("## {c}\n**Clearance** applies."),
                Some(c.as_str()),
            ));
            sections.push(ReportSection::succeeded(format_section_id(c), format_title(c), "fields", Some(c.as_str())));
        }
        sections.push(ReportSection::failed("api-implementation", "API Implementation Guide", "timed out", None));
        Report {
            report_id: id.to_string(),
            generated_at: Utc::now(),
            partner: PartnerForm::default(),
            countries: countries.clone(),
            sections,
            validation: ValidationSummary::from_checks(Vec::new()),
            metadata: ReportMetadata {
                report_id: id.to_string(),
                generated_at: Utc::now(),
                duration: "0.01s".to_string(),
                demo_mode: true,
                countries,
                sections_succeeded: 5,
                sections_failed: 1,
                errors: Vec::new(),
            },
        }
    }

    fn history() -> ReportHistory {
        ReportHistory::new(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn test_save_newest_first_and_replace() {
        let h = history();
        h.save(report("A")).unwrap_or_else(|_| unreachable!());
        h.save(report("B")).unwrap_or_else(|_| unreachable!());
        assert_eq!(h.latest().map(|r| r.report_id), Some("B".to_string()));

        let mut again = report("A");
        again.countries = vec!["Spain".to_string()];
        h.save(again).unwrap_or_else(|_| unreachable!());
        let all = h.all();
        assert_eq!(all.len(), 2);
        assert_eq!(all[1].report_id, "A");
        assert_eq!(all[1].countries, vec!["Spain"]);
    }

    #[test]
    fn test_history_cap() {
        let h = history();
        for i in 0..(MAX_REPORTS + 5) {
            h.save(report(&format!("R{i}"))).unwrap_or_else(|_| unreachable!());
        }
        assert_eq!(h.len(), MAX_REPORTS);
        assert_eq!(h.latest().map(|r| r.report_id), Some(format!("R{}", MAX_REPORTS + 4)));
        assert!(h.get("R0").is_none());
    }

    #[test]
    fn test_delete_and_clear() {
        let h = history();
        h.save(report("A")).unwrap_or_else(|_| unreachable!());
        h.save(report("B")).unwrap_or_else(|_| unreachable!());
        assert!(h.delete("A"));
        assert!(!h.delete("A"));
        assert_eq!(h.metadata().len(), 1);
        assert!(h.clear());
        assert!(h.is_empty());
        assert!(!h.clear());
    }

    #[test]
    fn test_concurrent_saves_are_not_lost() {
        let h = history();
        let handles: Vec<_> = (0..40)
            .map(|i| {
                let h = h.clone();
                std::thread::spawn(move || h.save(report(&format!("r{i}"))).is_ok())
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap_or_default());
        }
        assert_eq!(h.len(), 40);
        assert!((0..40).all(|i| h.get(&format!("r{i}")).is_some()));
    }

    #[test]
    fn test_corrupt_store_reads_empty() {
        let store = Arc::new(MemoryStore::new());
        store.set(STORAGE_KEY, "not json".to_string());
        assert!(ReportHistory::new(store).all().is_empty());
    }

    #[test]
    fn test_context_filters_by_country_and_topic() {
        let ctx = relevant_context("What is the clearance mandate in Poland?", &report("A"));
        let ids: Vec<&str> = ctx.relevant_sections.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["ccr-poland"]);
        assert_eq!(ctx.relevant_sections[0].summary, "Poland Clearance applies.");
    }

    #[test]
    fn test_context_without_filters_keeps_successful_sections() {
        let ctx = relevant_context("hello", &report("A"));
        assert_eq!(ctx.relevant_sections.len(), 5);
        assert!(ctx.relevant_sections.iter().all(|s| s.id != "api-implementation"));
        assert_eq!(ctx.countries, vec!["Italy", "Poland"]);
    }

    #[test]
    fn test_context_topic_only() {
        let ctx = relevant_context("which xml schema?", &report("A"));
        assert!(ctx.relevant_sections.iter().all(|s| s.id.starts_with("format-")));
        assert_eq!(ctx.relevant_sections.len(), 2);
    }

    #[test]
    fn test_summarize_strips_code_and_truncates() {
        let text = format!("# Title\n```rust\nfn main() {{}}\n```\n{}", "word ".repeat(SUMMARY_WORD_LIMIT + 10));
        let summary = summarize(&text);
        assert!(summary.starts_with("Title word"));
        assert!(!summary.contains("fn main"));
        assert!(summary.ends_with("..."));
        assert_eq!(summary.split_whitespace().count(), SUMMARY_WORD_LIMIT);
    }
}
