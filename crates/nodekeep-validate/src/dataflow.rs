//! Workflow edges against component data-flow idioms.
//!
//! For an edge `A.out -> B.in` carrying field `f`:
//!
//! * `A` must write `f` through a recognized write call, else
//!   `source_not_writing` (anchored in `A`'s source).
//! * Every recompute hook in `B` that reads `data.f` must list `f` in its
//!   dependency array, else `missing_dependency` (anchored in `B`'s source).
//!
//! Edges that cannot be resolved against the registry (unknown instance,
//! unregistered type, undeclared port, no field) become `data_flow_mismatch`.
//! A field written but never read is not an issue.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use anyhow::Result;
use nodekeep_extract::DataFlowIdioms;
use nodekeep_extract::dataflow::{recompute_blocks, write_calls};
use nodekeep_types::details::{self, Details};
use nodekeep_types::{ComponentRecord, Issue, IssueKind, Registry, Severity, Workflow, WorkflowEdge};

use crate::{Validation, Validator, Workspace, workflow};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataFlowValidator {
    pub idioms: DataFlowIdioms,
}

impl Validator for DataFlowValidator {
    fn name(&self) -> &'static str {
        "dataflow"
    }

    fn validate(&self, workspace: &Workspace<'_>) -> Result<Validation> {
        let mut issues = Vec::new();
        let mut processed = 0;
        for rel in workspace.workflows {
            let wf_path = nodekeep_walk::to_slash(rel);
            match workflow::load(&workspace.root.join(rel)) {
                Ok(wf) => {
                    processed += wf.edges.len();
                    let name = workflow::display_name(rel, &wf);
                    issues.extend(self.check_workflow(
                        workspace.root,
                        workspace.registry,
                        &wf_path,
                        &name,
                        &wf,
                    ));
                }
                Err(err) => {
                    tracing::warn!(workflow = %wf_path, error = %format!("{err:#}"), "unreadable workflow");
                    issues.push(
                        Issue::new(
                            IssueKind::DataFlowMismatch,
                            Severity::Error,
                            format!("workflow {wf_path} could not be read"),
                        )
                        .at(wf_path.clone(), None)
                        .with_details(
                            Details::new()
                                .with(details::WORKFLOW, &wf_path)
                                .with(details::PROBLEM, format!("{err:#}"))
                                .render(),
                        ),
                    );
                }
            }
        }
        Ok(Validation {
            validator: self.name(),
            processed,
            issues,
        })
    }
}

/// Component source text keyed by identity; `None` when unreadable.
struct Sources<'a> {
    root: &'a Path,
    cache: HashMap<String, Option<String>>,
}

impl<'a> Sources<'a> {
    fn new(root: &'a Path) -> Self {
        Self {
            root,
            cache: HashMap::new(),
        }
    }

    fn get(&mut self, record: &ComponentRecord) -> Option<&str> {
        let root = self.root;
        self.cache
            .entry(record.id.clone())
            .or_insert_with(|| match nodekeep_extract::read_source(&root.join(&record.path)) {
                Ok(text) => Some(text),
                Err(err) => {
                    tracing::warn!(id = %record.id, error = %err, "component source unreadable");
                    None
                }
            })
            .as_deref()
    }
}

impl DataFlowValidator {
    /// Check every edge of one workflow.
    pub fn check_workflow(
        &self,
        root: &Path,
        registry: &Registry,
        wf_path: &str,
        wf_name: &str,
        wf: &Workflow,
    ) -> Vec<Issue> {
        let mut issues = Vec::new();
        let mut sources = Sources::new(root);
        let mut seen: BTreeSet<(IssueKind, String, String)> = BTreeSet::new();
        let mismatch = |edge: &WorkflowEdge, problem: String, expected: Option<String>| {
            let mut info = Details::new()
                .with(details::WORKFLOW, wf_name)
                .with(details::FILE, wf_path)
                .with(details::EDGE, edge.label())
                .with(details::PROBLEM, &problem);
            if let Some(expected) = expected {
                info = info.with(details::EXPECTED, expected);
            }
            Issue::new(
                IssueKind::DataFlowMismatch,
                Severity::Error,
                format!("edge {} in {wf_name}: {problem}", edge.label()),
            )
            .at(wf_path, None)
            .with_details(info.render())
        };

        for edge in &wf.edges {
            let (up, down) = match (
                resolve(registry, wf, &edge.source),
                resolve(registry, wf, &edge.target),
            ) {
                (Ok(up), Ok(down)) => (up, down),
                (Err(problem), _) | (_, Err(problem)) => {
                    issues.push(mismatch(edge, problem, None));
                    continue;
                }
            };

            if let Some(handle) = &edge.source_handle
                && up.output(handle).is_none()
            {
                issues.push(mismatch(
                    edge,
                    format!("'{handle}' is not an output port of {}", up.id),
                    Some(port_list(&up.outputs)),
                ));
                continue;
            }
            if let Some(handle) = &edge.target_handle
                && down.input(handle).is_none()
            {
                issues.push(mismatch(
                    edge,
                    format!("'{handle}' is not an input port of {}", down.id),
                    Some(port_list(&down.inputs)),
                ));
                continue;
            }
            let Some(field) = edge.field() else {
                issues.push(mismatch(edge, "edge carries no data field".to_string(), None));
                continue;
            };

            match sources.get(up) {
                None => {
                    issues.push(mismatch(
                        edge,
                        format!("source of {} could not be read", up.id),
                        None,
                    ));
                    continue;
                }
                Some(src) => {
                    let calls = write_calls(src, &self.idioms);
                    let writes = calls.iter().any(|c| c.object.keys.iter().any(|k| k == field));
                    if !writes
                        && seen.insert((IssueKind::SourceNotWriting, up.id.clone(), field.to_string()))
                    {
                        issues.push(
                            Issue::new(
                                IssueKind::SourceNotWriting,
                                Severity::Warning,
                                format!("{} never writes '{field}' consumed by {}", up.id, down.id),
                            )
                            .at(up.path.clone(), calls.first().map(|c| c.line))
                            .with_details(
                                Details::new()
                                    .with(details::FILE, &up.path)
                                    .with(details::FIELDS, field)
                                    .with(details::NODE, &up.id)
                                    .with(details::CONSUMER, &down.id)
                                    .with(details::WORKFLOW, wf_name)
                                    .with(details::EDGE, edge.label())
                                    .render(),
                            ),
                        );
                    }
                }
            }

            let Some(src) = sources.get(down) else {
                issues.push(mismatch(
                    edge,
                    format!("source of {} could not be read", down.id),
                    None,
                ));
                continue;
            };
            let stale_hook = recompute_blocks(src, &self.idioms)
                .into_iter()
                .find(|b| b.uncovered(src).iter().any(|a| a.field == field));
            if let Some(block) = stale_hook
                && seen.insert((IssueKind::MissingDependency, down.id.clone(), field.to_string()))
            {
                issues.push(
                    Issue::new(
                        IssueKind::MissingDependency,
                        Severity::Warning,
                        format!(
                            "{} in {} reads '{field}' but does not list it as a dependency",
                            block.hook, down.id
                        ),
                    )
                    .at(down.path.clone(), Some(block.line))
                    .with_details(
                        Details::new()
                            .with(details::FILE, &down.path)
                            .with(details::FIELDS, field)
                            .with(details::NODE, &down.id)
                            .with(details::SOURCE, &up.id)
                            .with(details::WORKFLOW, wf_name)
                            .with(details::EDGE, edge.label())
                            .render(),
                    ),
                );
            }
        }

        tracing::debug!(
            workflow = wf_name,
            edges = wf.edges.len(),
            issues = issues.len(),
            "data-flow check complete"
        );
        issues
    }
}

fn resolve<'r>(
    registry: &'r Registry,
    wf: &Workflow,
    instance: &str,
) -> Result<&'r ComponentRecord, String> {
    let node = wf
        .node(instance)
        .ok_or_else(|| format!("unknown node instance '{instance}'"))?;
    let id = nodekeep_text::component_id(&node.kind);
    registry
        .get(&id)
        .ok_or_else(|| format!("component type '{}' is not registered", node.kind))
}

fn port_list(ports: &[nodekeep_types::Port]) -> String {
    if ports.is_empty() {
        return "(no ports declared)".to_string();
    }
    ports.iter().map(|p| p.id.as_str()).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use nodekeep_types::{Category, Port, WorkflowNode};

    fn record(id: &str, inputs: Vec<Port>, outputs: Vec<Port>) -> ComponentRecord {
        ComponentRecord {
            id: id.to_string(),
            file_name: format!("{}.jsx", nodekeep_text::type_name(id)),
            path: format!("src/{}.jsx", nodekeep_text::type_name(id)),
            absolute_path: String::new(),
            category: Category::Unknown,
            label: None,
            export_name: None,
            inputs,
            outputs,
            exists: true,
        }
    }

    fn fixture(cat_src: &str, dog_src: &str) -> (tempfile::TempDir, Registry) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("src")).unwrap();
        std::fs::write(dir.path().join("src/CatNode.jsx"), cat_src).unwrap();
        std::fs::write(dir.path().join("src/DogNode.jsx"), dog_src).unwrap();
        let registry = Registry::from_records(
            vec![
                record("catNode", vec![], vec![Port::new("out")]),
                record("dogNode", vec![Port::new("in").with_upstream("catNode")], vec![]),
            ],
            "t",
        );
        (dir, registry)
    }

    fn workflow(edges: Vec<WorkflowEdge>) -> Workflow {
        Workflow {
            name: Some("pets".into()),
            nodes: vec![
                WorkflowNode {
                    id: "c".into(),
                    kind: "catNode".into(),
                },
                WorkflowNode {
                    id: "d".into(),
                    kind: "DogNode".into(),
                },
            ],
            edges,
        }
    }

    fn edge(source_handle: Option<&str>, target_handle: Option<&str>) -> WorkflowEdge {
        WorkflowEdge {
            id: None,
            source: "c".into(),
            source_handle: source_handle.map(String::from),
            target: "d".into(),
            target_handle: target_handle.map(String::from),
            data: None,
        }
    }

    fn run(dir: &Path, registry: &Registry, wf: &Workflow) -> Vec<Issue> {
        DataFlowValidator::default().check_workflow(dir, registry, "workflows/pets.json", "pets", wf)
    }

    #[test]
    fn writer_and_covered_reader_are_clean() {
        let (dir, reg) = fixture(
            "updateNodeData(id, { out: 1 });",
            "useEffect(() => { use(data.out); }, [data.out]);",
        );
        let issues = run(dir.path(), &reg, &workflow(vec![edge(Some("out"), Some("in"))]));
        assert!(issues.is_empty(), "{issues:?}");
    }

    #[test]
    fn silent_upstream_is_source_not_writing() {
        let (dir, reg) = fixture("export default function CatNode() {}", "export default function DogNode() {}");
        let issues = run(dir.path(), &reg, &workflow(vec![edge(Some("out"), Some("in"))]));
        assert_eq!(issues.len(), 1);
        let issue = &issues[0];
        assert_eq!(issue.kind, IssueKind::SourceNotWriting);
        assert_eq!(issue.file.as_deref(), Some("src/CatNode.jsx"));
        let parsed = details::parse(&issue.details);
        assert_eq!(parsed[details::CONSUMER], "dogNode");
        assert_eq!(parsed[details::FIELDS], "out");
    }

    #[test]
    fn uncovered_read_is_missing_dependency() {
        let (dir, reg) = fixture(
            "updateNodeData(id, { out: 1 });",
            "\n\nuseEffect(() => { use(data.out); }, [id]);",
        );
        let issues = run(dir.path(), &reg, &workflow(vec![edge(Some("out"), Some("in"))]));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::MissingDependency);
        assert_eq!(issues[0].line, Some(3));
        assert_eq!(issues[0].file.as_deref(), Some("src/DogNode.jsx"));
    }

    #[test]
    fn duplicate_edges_report_once() {
        let (dir, reg) = fixture("", "");
        let wf = workflow(vec![edge(Some("out"), Some("in")), edge(Some("out"), Some("in"))]);
        assert_eq!(run(dir.path(), &reg, &wf).len(), 1);
    }

    #[test]
    fn explicit_edge_field_wins_over_handles() {
        let (dir, reg) = fixture("updateNodeData(id, { result: 1 });", "");
        let mut e = edge(Some("out"), Some("in"));
        e.data = Some(nodekeep_types::EdgeData {
            field: Some("result".into()),
        });
        assert!(run(dir.path(), &reg, &workflow(vec![e])).is_empty());
    }

    #[test]
    fn unresolvable_edges_are_mismatches() {
        let (dir, reg) = fixture("", "");
        let mut unknown_instance = edge(Some("out"), Some("in"));
        unknown_instance.source = "ghost".into();
        let bad_port = edge(Some("nope"), Some("in"));
        let no_field = edge(None, None);

        let issues = run(
            dir.path(),
            &reg,
            &workflow(vec![unknown_instance, bad_port, no_field]),
        );
        assert_eq!(issues.len(), 3);
        assert!(issues.iter().all(|i| i.kind == IssueKind::DataFlowMismatch));
        assert!(issues.iter().all(|i| i.severity == Severity::Error));
        let expected = details::parse(&issues[1].details);
        assert_eq!(expected[details::EXPECTED], "out");
    }

    #[test]
    fn unregistered_type_is_a_mismatch() {
        let (dir, reg) = fixture("", "");
        let mut wf = workflow(vec![edge(Some("out"), Some("in"))]);
        wf.nodes[1].kind = "BirdNode".into();
        let issues = run(dir.path(), &reg, &wf);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].summary.contains("BirdNode"));
    }
}
