//! Text and JSON output for every command.
//!
//! Each command builds one serializable view. `--format json` prints it as
//! pretty JSON; otherwise the matching `*_text` function renders it. With
//! `--output FILE` the JSON form is also written to that file.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use nodekeep_config::{GlobalArgs, OutputFormat};
use nodekeep_metrics::{DayTotals, TypeTotals};
use nodekeep_types::details;
use nodekeep_types::{
    ComponentRecord, FixReport, FixStatus, FixSuggestion, ImpactReport, Issue, IssueSummary,
    MetricsRecord, RiskLevel, ToolInfo, TrendReport,
};
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

pub(crate) fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

/// Print `view` in the requested format and mirror it to `--output`.
pub(crate) fn emit<T: Serialize>(
    global: &GlobalArgs,
    view: &T,
    text: impl FnOnce(&T) -> String,
) -> Result<()> {
    match global.format {
        OutputFormat::Json => println!("{}", to_json(view)?),
        OutputFormat::Text => print!("{}", text(view)),
    }
    if let Some(path) = &global.output {
        write_json(path, view)?;
    }
    Ok(())
}

fn to_json<T: Serialize>(view: &T) -> Result<String> {
    serde_json::to_string_pretty(view).context("Failed to serialize output")
}

fn write_json<T: Serialize>(path: &Path, view: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    let mut json = to_json(view)?;
    json.push('\n');
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::debug!(path = %path.display(), "output written");
    Ok(())
}

// =============================================================================
// Registry
// =============================================================================

#[derive(Debug, Serialize)]
pub(crate) struct SkippedView {
    pub path: String,
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct BuildView {
    pub tool: ToolInfo,
    pub generated_at: String,
    pub registry_path: String,
    pub components: usize,
    pub by_category: BTreeMap<String, usize>,
    pub skipped: Vec<SkippedView>,
}

pub(crate) fn build_text(view: &BuildView) -> String {
    let mut out = format!(
        "Registered {} component(s) in {}\n",
        view.components, view.registry_path
    );
    for (category, count) in &view.by_category {
        let _ = writeln!(out, "  {category:<9} {count}");
    }
    if !view.skipped.is_empty() {
        let _ = writeln!(out, "Skipped {} file(s):", view.skipped.len());
        for skipped in &view.skipped {
            let _ = writeln!(out, "  {}: {}", skipped.path, skipped.reason);
        }
    }
    out
}

#[derive(Debug, Serialize)]
pub(crate) struct ListView<'a> {
    pub tool: ToolInfo,
    pub generated_at: &'a str,
    pub components: Vec<&'a ComponentRecord>,
}

pub(crate) fn list_text(view: &ListView<'_>) -> String {
    if view.components.is_empty() {
        return "No components registered.\n".to_string();
    }
    let mut out = String::new();
    for record in &view.components {
        let label = record.label.as_deref().unwrap_or("-");
        let _ = write!(
            out,
            "{:<24} {:<8} {:<24} {}",
            record.id,
            record.category.as_str(),
            label,
            record.path
        );
        if !record.exists {
            out.push_str(" (missing)");
        }
        out.push('\n');
    }
    let _ = writeln!(out, "{} component(s)", view.components.len());
    out
}

#[derive(Debug, Serialize)]
pub(crate) struct CheckView {
    pub tool: ToolInfo,
    pub generated_at: String,
    pub in_sync: bool,
    pub issues: Vec<Issue>,
}

pub(crate) fn check_text(view: &CheckView) -> String {
    if view.in_sync {
        return "Registry is in sync with sources.\n".to_string();
    }
    let mut out = format!("Registry is stale ({} difference(s)):\n", view.issues.len());
    for issue in &view.issues {
        push_issue(&mut out, issue, false);
    }
    out.push_str("Run `nodekeep registry build` to regenerate it.\n");
    out
}

// =============================================================================
// Validation
// =============================================================================

#[derive(Debug, Serialize)]
pub(crate) struct ValidatorView {
    pub name: &'static str,
    pub processed: usize,
    pub errors: usize,
    pub warnings: usize,
}

#[derive(Debug, Serialize)]
pub(crate) struct IssueView {
    #[serde(flatten)]
    pub issue: Issue,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub advice: Vec<FixSuggestion>,
}

/// A validator that could not finish its run.
#[derive(Debug, Serialize)]
pub(crate) struct FailureView {
    pub validator: &'static str,
    pub error: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct ReportView {
    pub tool: ToolInfo,
    pub generated_at: String,
    pub summary: IssueSummary,
    pub validators: Vec<ValidatorView>,
    pub issues: Vec<IssueView>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<FailureView>,
    #[serde(skip)]
    pub verbose: bool,
}

pub(crate) fn report_text(view: &ReportView) -> String {
    let mut out = String::new();
    for validator in &view.validators {
        let _ = writeln!(
            out,
            "{:<10} processed {:>4}  errors {:>3}  warnings {:>3}",
            validator.name, validator.processed, validator.errors, validator.warnings
        );
    }
    if !view.issues.is_empty() {
        out.push('\n');
    }
    for entry in &view.issues {
        push_issue(&mut out, &entry.issue, view.verbose);
        for advice in &entry.advice {
            push_suggestion(&mut out, advice);
        }
    }
    push_failures(&mut out, &view.failures);
    let _ = writeln!(
        out,
        "\n{} issue(s): {} error(s), {} warning(s)",
        view.summary.total, view.summary.errors, view.summary.warnings
    );
    out
}

#[derive(Debug, Serialize)]
pub(crate) struct ScanView {
    pub tool: ToolInfo,
    pub generated_at: String,
    pub summary: IssueSummary,
    pub fixable: Vec<Issue>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<FailureView>,
    #[serde(skip)]
    pub verbose: bool,
}

pub(crate) fn scan_text(view: &ScanView) -> String {
    let mut out = if view.fixable.is_empty() {
        format!(
            "No auto-fixable issues ({} issue(s) in total).\n",
            view.summary.total
        )
    } else {
        let mut out = format!("{} auto-fixable issue(s):\n", view.fixable.len());
        for issue in &view.fixable {
            push_issue(&mut out, issue, view.verbose);
        }
        out.push_str("Run `nodekeep fix` to apply them, or `nodekeep fix --dry-run` to preview.\n");
        out
    };
    push_failures(&mut out, &view.failures);
    out
}

fn push_failures(out: &mut String, failures: &[FailureView]) {
    for failure in failures {
        let _ = writeln!(out, "validator {} failed: {}", failure.validator, failure.error);
    }
}

fn push_issue(out: &mut String, issue: &Issue, verbose: bool) {
    let location = issue.location().unwrap_or_else(|| "-".to_string());
    let _ = write!(
        out,
        "  [{}] {} {}  {}",
        issue.severity, issue.kind, location, issue.summary
    );
    if let Some(strategy) = &issue.strategy {
        let _ = write!(out, "  ({strategy}");
        if let Some(confidence) = issue.confidence {
            let _ = write!(out, ", {confidence}%");
        }
        out.push(')');
    }
    out.push('\n');
    if let Some(suggestion) = &issue.suggestion {
        let _ = writeln!(out, "      suggestion: {suggestion}");
    }
    if verbose {
        for (key, value) in details::parse(&issue.details) {
            let _ = writeln!(out, "      {key}: {value}");
        }
    }
}

fn push_suggestion(out: &mut String, suggestion: &FixSuggestion) {
    let _ = write!(out, "      -> {}", suggestion.description);
    match (&suggestion.file, suggestion.line) {
        (Some(file), Some(line)) => {
            let _ = write!(out, " ({file}:{line})");
        }
        (Some(file), None) => {
            let _ = write!(out, " ({file})");
        }
        _ => {}
    }
    out.push('\n');
    if let Some(example) = &suggestion.example {
        let _ = writeln!(out, "         e.g. {example}");
    }
}

// =============================================================================
// Fix
// =============================================================================

#[derive(Debug, Serialize)]
pub(crate) struct FixView {
    pub tool: ToolInfo,
    pub generated_at: String,
    pub report: FixReport,
    #[serde(skip)]
    pub verbose: bool,
}

pub(crate) fn fix_text(view: &FixView) -> String {
    let report = &view.report;
    let mut out = String::new();
    if report.dry_run {
        out.push_str("Dry run: no files were modified.\n");
    }
    for entry in &report.entries {
        let file = entry.file.as_deref().unwrap_or("-");
        let _ = write!(
            out,
            "  {:<8} {} {}  {}",
            entry.status.to_string(),
            entry.kind,
            file,
            entry.summary
        );
        if entry.status == FixStatus::Applied && entry.changes > 0 {
            let _ = write!(out, "  ({} change(s))", entry.changes);
        }
        out.push('\n');
        if let Some(reason) = &entry.reason {
            let _ = writeln!(out, "      {reason}");
        }
        if view.verbose || entry.status == FixStatus::Failed {
            for suggestion in &entry.suggestions {
                push_suggestion(&mut out, suggestion);
            }
        }
    }
    let verb = if report.dry_run { "would fix" } else { "fixed" };
    let _ = writeln!(
        out,
        "\n{verb} {}, failed {}, skipped {} ({} change(s))",
        report.fixed, report.failed, report.skipped, report.changes
    );
    out
}

// =============================================================================
// Impact
// =============================================================================

#[derive(Debug, Serialize)]
pub(crate) struct ImpactView {
    pub tool: ToolInfo,
    pub max_risk: Option<RiskLevel>,
    #[serde(flatten)]
    pub report: ImpactReport,
}

pub(crate) fn impact_text(view: &ImpactView) -> String {
    let report = &view.report;
    let mut out = format!("Impact of changing {}\n", report.target);
    let risk = view
        .max_risk
        .map_or_else(|| "none".to_string(), |r| r.to_string());
    let _ = writeln!(out, "Risk: {risk}");

    if report.dependents.is_empty() {
        out.push_str("\nNo registered component reads from it.\n");
    } else {
        let _ = writeln!(out, "\nDependents ({}):", report.dependents.len());
        for dependent in &report.dependents {
            let _ = writeln!(out, "  {} (port {})", dependent.id, dependent.port);
        }
    }
    if !report.contract_fields.is_empty() {
        let _ = writeln!(out, "\nContract fields: {}", report.contract_fields.join(", "));
    }
    if !report.risks.is_empty() {
        out.push_str("\nRisks:\n");
        for risk in &report.risks {
            let _ = writeln!(out, "  [{}] {}", risk.tier, risk.message);
        }
    }
    out.push_str("\nTest plan:\n");
    for rec in &report.recommendations {
        let _ = writeln!(out, "  {}. {}", rec.priority, rec.description);
    }
    out
}

// =============================================================================
// Metrics
// =============================================================================

#[derive(Debug, Serialize)]
pub(crate) struct TrendView<'a> {
    pub tool: ToolInfo,
    pub validator: Option<&'a str>,
    pub trend: TrendReport,
    pub latest: Option<&'a MetricsRecord>,
}

pub(crate) fn trend_text(view: &TrendView<'_>) -> String {
    let scope = view.validator.unwrap_or("all validators");
    let trend = &view.trend;
    let mut out = format!("Trend ({scope}): {}\n", trend.verdict);
    let _ = writeln!(
        out,
        "  {} run(s): {} improving, {} worsening, {} stable",
        trend.samples, trend.improving, trend.worsening, trend.stable
    );
    if let Some(latest) = view.latest {
        let _ = writeln!(
            out,
            "  latest {} at {}: {} error(s), {} warning(s)",
            latest.validator, latest.timestamp, latest.summary.errors, latest.summary.warnings
        );
    }
    out
}

#[derive(Debug, Serialize)]
pub(crate) struct MetricsView<'a> {
    pub tool: ToolInfo,
    pub path: String,
    pub total_runs: u64,
    pub by_type: &'a BTreeMap<String, TypeTotals>,
    pub by_date: &'a BTreeMap<String, DayTotals>,
    pub history: usize,
    pub history_cap: usize,
}

pub(crate) fn metrics_text(view: &MetricsView<'_>) -> String {
    if view.total_runs == 0 {
        return format!("No runs recorded in {}.\n", view.path);
    }
    let mut out = format!(
        "{} run(s) recorded ({} of at most {} in history)\n",
        view.total_runs, view.history, view.history_cap
    );
    out.push_str("\nBy type:\n");
    for (name, totals) in view.by_type {
        let _ = writeln!(
            out,
            "  {:<10} runs {:>4}  processed {:>6}  errors {:>5}  warnings {:>5}  last {}",
            name,
            totals.runs,
            totals.processed,
            totals.errors,
            totals.warnings,
            totals.last_run.as_deref().unwrap_or("-")
        );
    }
    out.push_str("\nBy date:\n");
    for (day, totals) in view.by_date {
        let _ = writeln!(
            out,
            "  {day}  runs {:>4}  errors {:>5}  warnings {:>5}",
            totals.runs, totals.errors, totals.warnings
        );
    }
    out
}
