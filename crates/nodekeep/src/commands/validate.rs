//! `scan`, `report`, and `fix`: one orchestrator run over the repository.

use std::path::PathBuf;

use anyhow::{Context, Result};
use nodekeep_config::{FixArgs, GlobalArgs, ReportArgs};
use nodekeep_fix::{FixOptions, Orchestrator, ScanOutcome, ValidatorFailure, standard_fixers};
use nodekeep_metrics::{MetricsError, MetricsStore};
use nodekeep_types::{FixReport, Issue, IssueSummary, Registry, RunCounts, ToolInfo};
use nodekeep_validate::{
    DataFlowValidator, ReferenceValidator, SyntaxValidator, Validation, Validator, Workspace,
};
use nodekeep_walk::{documentation_files, workflow_files};

use crate::config::Settings;
use crate::render::{self, FailureView, FixView, IssueView, ReportView, ScanView, ValidatorView};

/// Metrics type recorded for each fix run.
const AUTOFIX: &str = "autofix";

/// Inputs gathered once per run.
struct Inputs {
    registry: Registry,
    docs: Vec<PathBuf>,
    workflows: Vec<PathBuf>,
}

impl Inputs {
    fn gather(args: &ReportArgs, settings: &Settings) -> Result<Self> {
        let registry = nodekeep_registry::load(&settings.registry_path)?;
        let docs = documentation_files(&settings.root, &settings.docs)
            .context("Failed to collect documentation files")?;
        let workflows = if args.workflows.is_empty() {
            workflow_files(&settings.root, &settings.workflows_dir)
                .context("Failed to collect workflow files")?
        } else {
            args.workflows.clone()
        };
        tracing::info!(
            components = registry.len(),
            docs = docs.len(),
            workflows = workflows.len(),
            "inputs gathered"
        );
        Ok(Self {
            registry,
            docs,
            workflows,
        })
    }

    fn workspace<'a>(&'a self, settings: &'a Settings) -> Workspace<'a> {
        Workspace {
            root: &settings.root,
            registry: &self.registry,
            docs: &self.docs,
            workflows: &self.workflows,
        }
    }
}

fn orchestrator(settings: &Settings, inputs: &Inputs) -> Result<Orchestrator> {
    let fixers = standard_fixers(&settings.root, inputs.docs.clone(), &settings.idioms);
    let validators: Vec<Box<dyn Validator>> = vec![
        Box::new(ReferenceValidator::default()),
        Box::new(DataFlowValidator {
            idioms: settings.idioms.clone(),
        }),
        Box::new(SyntaxValidator::new(settings.checker.clone())),
    ];
    Orchestrator::new(settings.catalog.clone(), fixers, validators)
        .context("Strategy catalog does not match the available fixers")
}

/// `record` is false for dry runs, which must leave the tree untouched.
fn run_scan(
    settings: &Settings,
    inputs: &Inputs,
    record: bool,
) -> Result<(Orchestrator, ScanOutcome)> {
    let mut orchestrator = orchestrator(settings, inputs)?;
    let outcome = orchestrator.scan(&inputs.workspace(settings));
    if record {
        record_validations(settings, &outcome.validations);
    }
    Ok((orchestrator, outcome))
}

/// Metrics are best effort: a store that cannot be read or written is
/// logged and the run's own result stands.
fn with_metrics(
    settings: &Settings,
    f: impl FnOnce(&mut MetricsStore) -> Result<(), MetricsError>,
) {
    let result = MetricsStore::load(&settings.metrics_path)
        .map(|store| store.with_history_cap(settings.history_cap))
        .and_then(|mut store| f(&mut store));
    if let Err(err) = result {
        tracing::warn!(error = %err, "metrics not recorded");
    }
}

fn record_validations(settings: &Settings, validations: &[Validation]) {
    with_metrics(settings, |store| {
        for validation in validations {
            store.record(validation.validator, validation.counts())?;
        }
        Ok(())
    });
}

fn failure_views(failures: &[ValidatorFailure]) -> Vec<FailureView> {
    failures
        .iter()
        .map(|f| FailureView {
            validator: f.validator,
            error: f.error.clone(),
        })
        .collect()
}

fn all_issues(outcome: &ScanOutcome) -> Vec<Issue> {
    outcome.all_issues().cloned().collect()
}

fn validator_views(validations: &[Validation]) -> Vec<ValidatorView> {
    validations
        .iter()
        .map(|v| {
            let counts = v.counts();
            ValidatorView {
                name: v.validator,
                processed: counts.processed,
                errors: counts.errors,
                warnings: counts.warnings,
            }
        })
        .collect()
}

/// Auto-fixable issues only. Fails the run when any issue is an error or a
/// validator could not finish.
pub(crate) fn handle_scan(args: ReportArgs, global: &GlobalArgs, settings: &Settings) -> Result<bool> {
    let inputs = Inputs::gather(&args, settings)?;
    let (_, outcome) = run_scan(settings, &inputs, true)?;
    let summary = IssueSummary::from_issues(&all_issues(&outcome));
    let failures = failure_views(&outcome.failures);
    let passed = summary.errors == 0 && failures.is_empty();
    let view = ScanView {
        tool: ToolInfo::default(),
        generated_at: render::now_rfc3339(),
        summary,
        fixable: outcome.fixable,
        failures,
        verbose: args.verbose,
    };
    render::emit(global, &view, render::scan_text)?;
    Ok(passed)
}

/// Every issue, with advisory suggestions where a strategy offers them.
pub(crate) fn handle_report(args: ReportArgs, global: &GlobalArgs, settings: &Settings) -> Result<bool> {
    let inputs = Inputs::gather(&args, settings)?;
    let (orchestrator, outcome) = run_scan(settings, &inputs, true)?;
    let issues = all_issues(&outcome);
    let summary = IssueSummary::from_issues(&issues);
    let failures = failure_views(&outcome.failures);
    let passed = summary.errors == 0 && failures.is_empty();
    let view = ReportView {
        tool: ToolInfo::default(),
        generated_at: render::now_rfc3339(),
        summary,
        validators: validator_views(&outcome.validations),
        issues: issues
            .into_iter()
            .map(|issue| {
                let advice = orchestrator
                    .advise(&issue)
                    .map(|r| r.suggestions)
                    .unwrap_or_default();
                IssueView { issue, advice }
            })
            .collect(),
        failures,
        verbose: args.verbose,
    };
    render::emit(global, &view, render::report_text)?;
    Ok(passed)
}

/// Apply fixes for the auto-fixable issues. Fails the run when a fix failed.
pub(crate) fn handle_fix(args: FixArgs, global: &GlobalArgs, settings: &Settings) -> Result<bool> {
    let inputs = Inputs::gather(&args.report, settings)?;
    let (mut orchestrator, outcome) = run_scan(settings, &inputs, !args.dry_run)?;
    let options = FixOptions {
        dry_run: args.dry_run,
        backup: args.backup,
        force: args.force,
        backup_dir: settings.backup_dir.clone(),
    };
    let report = orchestrator.apply_fixes(&settings.root, &outcome.fixable, &options);
    if !report.dry_run {
        record_fix_run(settings, &report);
    }

    let passed = report.passed();
    let view = FixView {
        tool: ToolInfo::default(),
        generated_at: render::now_rfc3339(),
        report,
        verbose: args.report.verbose,
    };
    render::emit(global, &view, render::fix_text)?;
    Ok(passed)
}

fn record_fix_run(settings: &Settings, report: &FixReport) {
    let counts = RunCounts {
        processed: report.entries.len(),
        errors: report.failed,
        warnings: report.skipped,
    };
    with_metrics(settings, |store| store.record(AUTOFIX, counts));
}
