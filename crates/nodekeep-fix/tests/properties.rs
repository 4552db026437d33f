//! Property-based tests for the fix orchestrator.

use nodekeep_extract::DataFlowIdioms;
use nodekeep_fix::{FixOptions, Orchestrator, StrategyCatalog, standard_fixers};
use nodekeep_types::{FixStatus, Issue, IssueKind, Severity};
use proptest::prelude::*;

fn orchestrator(root: &std::path::Path) -> Orchestrator {
    let fixers = standard_fixers(root, Vec::new(), &DataFlowIdioms::default());
    Orchestrator::new(StrategyCatalog::builtin().unwrap(), fixers, Vec::new()).unwrap()
}

fn issues(kinds: &[IssueKind]) -> Vec<Issue> {
    kinds
        .iter()
        .map(|k| {
            Issue::new(*k, Severity::Warning, k.as_str())
                .at("src/GhostNode.jsx", Some(1))
                .with_details("file: src/GhostNode.jsx\nfields: value\nreference: GhostNode")
        })
        .collect()
}

proptest! {
    /// Dry runs count every issue as fixed and write nothing.
    #[test]
    fn dry_run_fixes_everything_and_writes_nothing(
        kinds in prop::collection::vec(prop::sample::select(IssueKind::ALL.to_vec()), 0..12),
    ) {
        let dir = tempfile::tempdir().unwrap();
        let mut orch = orchestrator(dir.path());
        let options = FixOptions { dry_run: true, backup: true, force: true, ..FixOptions::default() };
        let report = orch.apply_fixes(dir.path(), &issues(&kinds), &options);

        prop_assert_eq!(report.fixed, kinds.len());
        prop_assert_eq!(report.failed + report.skipped, 0);
        prop_assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    /// Every issue yields exactly one entry, in order, and the tallies agree.
    #[test]
    fn report_tallies_match_entries(
        kinds in prop::collection::vec(prop::sample::select(IssueKind::ALL.to_vec()), 0..12),
        force in any::<bool>(),
    ) {
        let dir = tempfile::tempdir().unwrap();
        let mut orch = orchestrator(dir.path());
        let options = FixOptions { force, ..FixOptions::default() };
        let report = orch.apply_fixes(dir.path(), &issues(&kinds), &options);

        prop_assert_eq!(report.entries.len(), kinds.len());
        prop_assert_eq!(report.fixed + report.failed + report.skipped, kinds.len());
        for (entry, kind) in report.entries.iter().zip(&kinds) {
            prop_assert_eq!(entry.kind, *kind);
            prop_assert!(entry.status != FixStatus::DryRun);
        }
    }
}
