//! BDD-style scenario tests for the validators, run against real trees
//! built into a registry.

use std::fs;
use std::path::PathBuf;

use nodekeep_extract::BestEffortExtractor;
use nodekeep_registry::{BuildOptions, scan};
use nodekeep_types::details;
use nodekeep_types::{IssueKind, Registry, Severity};
use nodekeep_validate::{
    DataFlowValidator, ReferenceValidator, SyntaxValidator, Validator, Workspace,
};
use tempfile::TempDir;

// ============================================================================
// Helpers
// ============================================================================

const CAT: &str = r#"import { Handle } from 'reactflow';

export default function CatNode({ id }) {
  return <Handle type="source" id="out" />;
}
"#;

const DOG: &str = r#"import { Handle } from 'reactflow';

export default function DogNode({ data }) {
  return <Handle type="target" id="in" data-upstream="CatNode" />;
}
"#;

const PETS: &str = r#"{
  "name": "pets",
  "nodes": [
    { "id": "1", "type": "catNode" },
    { "id": "2", "type": "dogNode" }
  ],
  "edges": [
    { "id": "e1", "source": "1", "sourceHandle": "out", "target": "2", "targetHandle": "in" }
  ]
}"#;

fn tree(files: &[(&str, &str)]) -> TempDir {
    let tmp = TempDir::new().expect("failed to create tempdir");
    for (rel, body) in files {
        let path = tmp.path().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, body).unwrap();
    }
    tmp
}

fn registry(tmp: &TempDir) -> Registry {
    scan(tmp.path(), &BuildOptions::default(), &BestEffortExtractor)
        .unwrap()
        .registry
}

// ============================================================================
// Scenario: data flow between CatNode and DogNode
// ============================================================================

#[test]
fn given_cat_feeding_dog_without_a_write_when_validating_then_one_source_not_writing() {
    let tmp = tree(&[
        ("src/nodes/input/CatNode.jsx", CAT),
        ("src/nodes/process/DogNode.jsx", DOG),
        ("workflows/pets.json", PETS),
    ]);
    let reg = registry(&tmp);
    assert_eq!(reg.len(), 2);

    let workflows = vec![PathBuf::from("workflows/pets.json")];
    let ws = Workspace {
        root: tmp.path(),
        registry: &reg,
        docs: &[],
        workflows: &workflows,
    };
    let run = DataFlowValidator::default().validate(&ws).unwrap();

    assert_eq!(run.validator, "dataflow");
    assert_eq!(run.processed, 1);
    let source_not_writing: Vec<_> = run
        .issues
        .iter()
        .filter(|i| i.kind == IssueKind::SourceNotWriting)
        .collect();
    assert_eq!(source_not_writing.len(), 1);
    assert_eq!(run.issues.len(), 1);
    let parsed = details::parse(&source_not_writing[0].details);
    assert_eq!(parsed[details::CONSUMER], "dogNode");
}

#[test]
fn given_malformed_workflow_when_validating_then_mismatch_not_failure() {
    let tmp = tree(&[("src/CatNode.jsx", CAT), ("workflows/bad.json", "{ nope")]);
    let reg = registry(&tmp);
    let workflows = vec![PathBuf::from("workflows/bad.json")];
    let ws = Workspace {
        root: tmp.path(),
        registry: &reg,
        docs: &[],
        workflows: &workflows,
    };
    let run = DataFlowValidator::default().validate(&ws).unwrap();
    assert_eq!(run.issues.len(), 1);
    assert_eq!(run.issues[0].kind, IssueKind::DataFlowMismatch);
}

// ============================================================================
// Scenario: documentation references
// ============================================================================

#[test]
fn given_doc_with_typo_when_validating_then_orphan_with_suggestion() {
    let tmp = tree(&[
        ("src/FooBazNode.jsx", "export default function FooBazNode() {}"),
        ("README.md", "# Nodes\n\nSee FooBarNode for details.\n"),
    ]);
    let reg = registry(&tmp);
    let docs = vec![PathBuf::from("README.md")];
    let ws = Workspace {
        root: tmp.path(),
        registry: &reg,
        docs: &docs,
        workflows: &[],
    };
    let run = ReferenceValidator::default().validate(&ws).unwrap();

    assert_eq!(run.issues.len(), 1);
    let issue = &run.issues[0];
    assert_eq!(issue.kind, IssueKind::OrphanedReference);
    assert_eq!(issue.suggestion.as_deref(), Some("fooBazNode"));
    assert_eq!(issue.line, Some(3));
    assert_eq!(run.counts().errors, 1);
}

#[test]
fn given_unreadable_doc_when_validating_then_run_fails_with_path() {
    let tmp = TempDir::new().unwrap();
    let reg = Registry::from_records(vec![], "t");
    let docs = vec![PathBuf::from("GONE.md")];
    let ws = Workspace {
        root: tmp.path(),
        registry: &reg,
        docs: &docs,
        workflows: &[],
    };
    let err = ReferenceValidator::default().validate(&ws).unwrap_err();
    assert!(err.to_string().contains("GONE.md"));
}

// ============================================================================
// Scenario: syntax fallback
// ============================================================================

#[test]
fn given_no_checker_when_validating_then_fallback_findings_are_warnings() {
    let tmp = tree(&[
        ("src/CatNode.jsx", CAT),
        ("src/BrokenNode.jsx", "export default function BrokenNode() {\n  return (1;\n"),
    ]);
    let reg = registry(&tmp);
    let ws = Workspace {
        root: tmp.path(),
        registry: &reg,
        docs: &[],
        workflows: &[],
    };
    let run = SyntaxValidator::new(None).validate(&ws).unwrap();

    assert_eq!(run.processed, 2);
    assert_eq!(run.issues.len(), 2);
    assert!(run.issues.iter().all(|i| i.severity == Severity::Warning));
    assert!(run.issues.iter().all(|i| i.file.as_deref() == Some("src/BrokenNode.jsx")));
    assert_eq!(run.counts().errors, 0);
}
