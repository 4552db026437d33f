//! One scan-and-fix run.
//!
//! ```text
//! Idle -> Scanning -> Collecting -> Applying -> Reporting -> Done
//! ```
//!
//! Issues are handled strictly in list order. A fixer error or an
//! unsuccessful [`FixResult`] is recorded as `failed` and the run moves on;
//! nothing is retried.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Result;
use nodekeep_types::{FixEntry, FixReport, FixResult, FixStatus, Issue};
use nodekeep_validate::{Validation, Validator, Workspace};
use time::OffsetDateTime;
use time::macros::format_description;

use crate::{CatalogError, FixerRegistry, StrategyCatalog};

/// Default backup location, relative to the repository root.
pub const DEFAULT_BACKUP_DIR: &str = ".nodekeep/backups";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Scanning,
    Collecting,
    Applying,
    Reporting,
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Idle => "idle",
            Phase::Scanning => "scanning",
            Phase::Collecting => "collecting",
            Phase::Applying => "applying",
            Phase::Reporting => "reporting",
            Phase::Done => "done",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixOptions {
    pub dry_run: bool,
    pub backup: bool,
    pub force: bool,
    /// Relative paths are resolved against the repository root.
    pub backup_dir: PathBuf,
}

impl Default for FixOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            backup: false,
            force: false,
            backup_dir: PathBuf::from(DEFAULT_BACKUP_DIR),
        }
    }
}

/// What a scan found.
#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    /// Every validator's result, issues annotated with their strategy.
    pub validations: Vec<Validation>,
    /// Issues whose strategy is auto-fixable, in validator order.
    pub fixable: Vec<Issue>,
    /// Validators that could not finish. The others still report.
    pub failures: Vec<ValidatorFailure>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatorFailure {
    pub validator: &'static str,
    pub error: String,
}

impl ScanOutcome {
    pub fn all_issues(&self) -> impl Iterator<Item = &Issue> {
        self.validations.iter().flat_map(|v| v.issues.iter())
    }
}

pub struct Orchestrator {
    catalog: StrategyCatalog,
    fixers: FixerRegistry,
    validators: Vec<Box<dyn Validator>>,
    phase: Phase,
}

impl fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("catalog", &self.catalog)
            .field("fixers", &self.fixers)
            .field(
                "validators",
                &self.validators.iter().map(|v| v.name()).collect::<Vec<_>>(),
            )
            .field("phase", &self.phase)
            .finish()
    }
}

impl Orchestrator {
    /// Fails if an auto-fixable strategy has no registered fixer.
    pub fn new(
        catalog: StrategyCatalog,
        fixers: FixerRegistry,
        validators: Vec<Box<dyn Validator>>,
    ) -> Result<Self, CatalogError> {
        catalog.check_fixers(&fixers)?;
        Ok(Self {
            catalog,
            fixers,
            validators,
            phase: Phase::Idle,
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn catalog(&self) -> &StrategyCatalog {
        &self.catalog
    }

    fn enter(&mut self, phase: Phase) {
        tracing::debug!(from = %self.phase, to = %phase, "orchestrator phase");
        self.phase = phase;
    }

    /// Run every validator and collect the auto-fixable issues.
    pub fn scan(&mut self, workspace: &Workspace<'_>) -> ScanOutcome {
        self.enter(Phase::Scanning);
        let mut validations = Vec::with_capacity(self.validators.len());
        let mut failures = Vec::new();
        for validator in &self.validators {
            let mut run = match validator.validate(workspace) {
                Ok(run) => run,
                Err(err) => {
                    let error = format!("{err:#}");
                    tracing::warn!(validator = validator.name(), error = %error, "validator failed");
                    failures.push(ValidatorFailure {
                        validator: validator.name(),
                        error,
                    });
                    continue;
                }
            };
            for issue in &mut run.issues {
                self.catalog.annotate(issue);
            }
            tracing::info!(
                validator = run.validator,
                processed = run.processed,
                issues = run.issues.len(),
                "validator finished"
            );
            validations.push(run);
        }

        self.enter(Phase::Collecting);
        let fixable: Vec<Issue> = validations
            .iter()
            .flat_map(|v| v.issues.iter())
            .filter(|i| self.catalog.is_auto_fixable(i.kind))
            .cloned()
            .collect();
        tracing::debug!(fixable = fixable.len(), "collected auto-fixable issues");
        ScanOutcome {
            validations,
            fixable,
            failures,
        }
    }

    /// Suggestions from an advisory (non-auto-fixable) strategy's fixer.
    pub fn advise(&self, issue: &Issue) -> Option<FixResult> {
        let strategy = self.catalog.get(issue.kind)?;
        if strategy.auto_fixable {
            return None;
        }
        let fixer = self.fixers.get(issue.kind)?;
        match fixer.fix(issue) {
            Ok(result) => Some(result),
            Err(err) => {
                tracing::warn!(kind = %issue.kind, error = %err, "advisory fixer failed");
                None
            }
        }
    }

    /// Apply fixes for `issues` under `options`.
    pub fn apply_fixes(&mut self, root: &Path, issues: &[Issue], options: &FixOptions) -> FixReport {
        self.enter(Phase::Applying);
        let mut report = FixReport {
            dry_run: options.dry_run,
            ..FixReport::default()
        };
        let mut backups = Backups::new(root, options);

        for issue in issues {
            let entry = self.apply_one(root, issue, options, &mut backups);
            tracing::debug!(
                kind = %entry.kind,
                status = %entry.status,
                file = entry.file.as_deref().unwrap_or("-"),
                "fix decision"
            );
            report.push(entry);
        }

        self.enter(Phase::Reporting);
        tracing::info!(
            fixed = report.fixed,
            failed = report.failed,
            skipped = report.skipped,
            dry_run = report.dry_run,
            "fix run finished"
        );
        self.enter(Phase::Done);
        report
    }

    fn apply_one(
        &self,
        root: &Path,
        issue: &Issue,
        options: &FixOptions,
        backups: &mut Backups,
    ) -> FixEntry {
        let strategy = self.catalog.get(issue.kind);
        let mut entry = FixEntry {
            kind: issue.kind,
            summary: issue.summary.clone(),
            file: issue.file.clone(),
            strategy: strategy.map_or_else(|| "none".to_string(), |s| s.name.clone()),
            status: FixStatus::Skipped,
            changes: 0,
            reason: None,
            suggestions: Vec::new(),
        };

        if options.dry_run {
            entry.status = FixStatus::DryRun;
            return entry;
        }
        let Some(strategy) = strategy.filter(|s| s.auto_fixable) else {
            entry.reason = Some("not auto-fixable".to_string());
            return entry;
        };
        if strategy.requires_confirmation && !options.force {
            entry.reason = Some("requires confirmation".to_string());
            return entry;
        }
        let Some(fixer) = self.fixers.get(issue.kind) else {
            entry.status = FixStatus::Failed;
            entry.reason = Some(format!("no fixer registered for '{}'", issue.kind));
            return entry;
        };

        if options.backup {
            for target in fixer.targets(issue) {
                backups.save(root, &target);
            }
        }

        match fixer.fix(issue) {
            Ok(result) if result.success => {
                entry.status = FixStatus::Applied;
                entry.changes = result.changes;
            }
            Ok(result) => {
                entry.status = FixStatus::Failed;
                entry.reason = result.error;
                entry.suggestions = result.suggestions;
            }
            Err(err) => {
                entry.status = FixStatus::Failed;
                entry.reason = Some(format!("{err:#}"));
            }
        }
        entry
    }
}

/// Copy-before-mutate backups for one run, under `<dir>/<timestamp>/`.
struct Backups {
    dir: PathBuf,
    saved: BTreeSet<PathBuf>,
}

impl Backups {
    fn new(root: &Path, options: &FixOptions) -> Self {
        let base = if options.backup_dir.is_absolute() {
            options.backup_dir.clone()
        } else {
            root.join(&options.backup_dir)
        };
        Self {
            dir: base.join(run_stamp()),
            saved: BTreeSet::new(),
        }
    }

    /// Best effort. A failed backup is logged and the fix goes ahead.
    fn save(&mut self, root: &Path, rel: &Path) {
        if !self.saved.insert(rel.to_path_buf()) {
            return;
        }
        let dest = self.dir.join(rel);
        let copied = dest
            .parent()
            .map_or(Ok(()), std::fs::create_dir_all)
            .and_then(|()| std::fs::copy(root.join(rel), &dest));
        match copied {
            Ok(_) => tracing::debug!(file = %rel.display(), to = %dest.display(), "backed up"),
            Err(err) => tracing::warn!(file = %rel.display(), error = %err, "backup failed"),
        }
    }
}

fn run_stamp() -> String {
    OffsetDateTime::now_utc()
        .format(format_description!(
            "[year][month][day]T[hour][minute][second]Z"
        ))
        .unwrap_or_else(|_| "backup".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use nodekeep_types::{FixStrategy, IssueKind, Registry, RiskLevel, Severity};

    use crate::Fixer;

    struct Scripted {
        kind: IssueKind,
        outcome: fn() -> Result<FixResult>,
    }

    impl Fixer for Scripted {
        fn name(&self) -> &'static str {
            "scripted"
        }
        fn kind(&self) -> IssueKind {
            self.kind
        }
        fn fix(&self, _issue: &Issue) -> Result<FixResult> {
            (self.outcome)()
        }
    }

    struct Fixed(Vec<Issue>);

    impl Validator for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }
        fn validate(&self, _ws: &Workspace<'_>) -> Result<Validation> {
            Ok(Validation {
                validator: "fixed",
                processed: self.0.len(),
                issues: self.0.clone(),
            })
        }
    }

    struct Broken;

    impl Validator for Broken {
        fn name(&self) -> &'static str {
            "broken"
        }
        fn validate(&self, _ws: &Workspace<'_>) -> Result<Validation> {
            Err(anyhow!("disk on fire"))
        }
    }

    fn strategy(kind: IssueKind, auto: bool, confirm: bool) -> FixStrategy {
        FixStrategy {
            name: format!("fix-{kind}"),
            kind,
            fixer: "scripted".to_string(),
            risk: RiskLevel::Low,
            auto_fixable: auto,
            confidence: 50,
            requires_confirmation: confirm,
        }
    }

    fn orchestrator(
        strategies: Vec<FixStrategy>,
        fixers: Vec<Scripted>,
        issues: Vec<Issue>,
    ) -> Orchestrator {
        let catalog = StrategyCatalog::from_strategies(strategies).unwrap();
        let mut registry = FixerRegistry::new();
        for f in fixers {
            registry.register(Box::new(f));
        }
        Orchestrator::new(catalog, registry, vec![Box::new(Fixed(issues))]).unwrap()
    }

    fn issue(kind: IssueKind) -> Issue {
        Issue::new(kind, Severity::Warning, kind.as_str())
    }

    #[test]
    fn scan_keeps_only_auto_fixable_and_annotates() {
        let mut orch = orchestrator(
            vec![
                strategy(IssueKind::MissingDependency, true, false),
                strategy(IssueKind::DataFlowMismatch, false, true),
            ],
            vec![Scripted {
                kind: IssueKind::MissingDependency,
                outcome: || Ok(FixResult::applied(1)),
            }],
            vec![
                issue(IssueKind::MissingDependency),
                issue(IssueKind::DataFlowMismatch),
                issue(IssueKind::BrokenLink),
            ],
        );
        let reg = Registry::from_records(vec![], "t");
        let ws = Workspace {
            root: Path::new("."),
            registry: &reg,
            docs: &[],
            workflows: &[],
        };
        let outcome = orch.scan(&ws);
        assert_eq!(orch.phase(), Phase::Collecting);
        assert_eq!(outcome.all_issues().count(), 3);
        assert_eq!(outcome.fixable.len(), 1);
        assert_eq!(
            outcome.fixable[0].strategy.as_deref(),
            Some("fix-missing_dependency")
        );
        assert_eq!(outcome.fixable[0].confidence, Some(50));
    }

    #[test]
    fn failing_validator_does_not_stop_the_others() {
        let catalog =
            StrategyCatalog::from_strategies(vec![strategy(IssueKind::MissingDependency, true, false)])
                .unwrap();
        let mut fixers = FixerRegistry::new();
        fixers.register(Box::new(Scripted {
            kind: IssueKind::MissingDependency,
            outcome: || Ok(FixResult::applied(1)),
        }));
        let validators: Vec<Box<dyn Validator>> = vec![
            Box::new(Broken),
            Box::new(Fixed(vec![issue(IssueKind::MissingDependency)])),
        ];
        let mut orch = Orchestrator::new(catalog, fixers, validators).unwrap();
        let reg = Registry::from_records(vec![], "t");
        let ws = Workspace {
            root: Path::new("."),
            registry: &reg,
            docs: &[],
            workflows: &[],
        };

        let outcome = orch.scan(&ws);
        assert_eq!(outcome.validations.len(), 1);
        assert_eq!(outcome.fixable.len(), 1);
        assert_eq!(
            outcome.failures,
            vec![ValidatorFailure {
                validator: "broken",
                error: "disk on fire".to_string(),
            }]
        );
    }

    #[test]
    fn unresolved_auto_fixable_strategy_is_fatal() {
        let catalog =
            StrategyCatalog::from_strategies(vec![strategy(IssueKind::MissingDependency, true, false)])
                .unwrap();
        let err = Orchestrator::new(catalog, FixerRegistry::new(), vec![]).unwrap_err();
        assert!(matches!(err, CatalogError::UnresolvedFixer { .. }));
    }

    #[test]
    fn dry_run_counts_every_issue_as_fixed() {
        let mut orch = orchestrator(
            vec![strategy(IssueKind::MissingDependency, true, false)],
            vec![Scripted {
                kind: IssueKind::MissingDependency,
                outcome: || Err(anyhow!("must not run")),
            }],
            vec![],
        );
        let issues = vec![issue(IssueKind::MissingDependency), issue(IssueKind::BrokenLink)];
        let options = FixOptions {
            dry_run: true,
            ..FixOptions::default()
        };
        let report = orch.apply_fixes(Path::new("."), &issues, &options);
        assert_eq!(report.fixed, 2);
        assert_eq!(report.failed, 0);
        assert!(report.entries.iter().all(|e| e.status == FixStatus::DryRun));
        assert_eq!(orch.phase(), Phase::Done);
    }

    #[test]
    fn confirmation_skips_unless_forced() {
        let build = || {
            orchestrator(
                vec![strategy(IssueKind::SourceNotWriting, true, true)],
                vec![Scripted {
                    kind: IssueKind::SourceNotWriting,
                    outcome: || Ok(FixResult::applied(2)),
                }],
                vec![],
            )
        };
        let issues = vec![issue(IssueKind::SourceNotWriting)];

        let report = build().apply_fixes(Path::new("."), &issues, &FixOptions::default());
        assert_eq!(report.skipped, 1);
        assert_eq!(report.entries[0].reason.as_deref(), Some("requires confirmation"));

        let forced = FixOptions {
            force: true,
            ..FixOptions::default()
        };
        let report = build().apply_fixes(Path::new("."), &issues, &forced);
        assert_eq!(report.fixed, 1);
        assert_eq!(report.changes, 2);
    }

    #[test]
    fn failures_are_recorded_and_the_run_continues() {
        let mut orch = orchestrator(
            vec![
                strategy(IssueKind::MissingDependency, true, false),
                strategy(IssueKind::OrphanedReference, true, false),
                strategy(IssueKind::SourceNotWriting, true, false),
            ],
            vec![
                Scripted {
                    kind: IssueKind::MissingDependency,
                    outcome: || Err(anyhow!("boom")),
                },
                Scripted {
                    kind: IssueKind::OrphanedReference,
                    outcome: || Ok(FixResult::failed("no matching construct found")),
                },
                Scripted {
                    kind: IssueKind::SourceNotWriting,
                    outcome: || Ok(FixResult::applied(1)),
                },
            ],
            vec![],
        );
        let issues = vec![
            issue(IssueKind::MissingDependency),
            issue(IssueKind::OrphanedReference),
            issue(IssueKind::SourceNotWriting),
        ];
        let report = orch.apply_fixes(Path::new("."), &issues, &FixOptions::default());
        assert_eq!((report.failed, report.fixed), (2, 1));
        assert!(!report.passed());
        assert_eq!(report.entries[0].reason.as_deref(), Some("boom"));
        assert_eq!(
            report.entries[1].reason.as_deref(),
            Some("no matching construct found")
        );
    }

    #[test]
    fn advise_runs_only_advisory_strategies() {
        let orch = orchestrator(
            vec![strategy(IssueKind::DataFlowMismatch, false, true)],
            vec![Scripted {
                kind: IssueKind::DataFlowMismatch,
                outcome: || Ok(FixResult::manual(vec![])),
            }],
            vec![],
        );
        let advice = orch.advise(&issue(IssueKind::DataFlowMismatch)).unwrap();
        assert!(advice.requires_manual_fix);
        assert!(orch.advise(&issue(IssueKind::BrokenLink)).is_none());
    }
}
