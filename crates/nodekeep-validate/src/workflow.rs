//! Loading saved workflow documents.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use nodekeep_types::Workflow;

/// Parse one workflow JSON document.
pub fn load(path: &Path) -> Result<Workflow> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read workflow {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse workflow {}", path.display()))
}

/// Display name of a workflow: its `name` field, else the file stem.
pub fn display_name(path: &Path, workflow: &Workflow) -> String {
    workflow.name.clone().unwrap_or_else(|| {
        path.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    })
}

/// Find the workflow named `name` among `candidates` (relative to `root`).
///
/// Matches the file stem first, then the document's `name` field. Documents
/// that fail to parse are skipped.
pub fn find(root: &Path, candidates: &[PathBuf], name: &str) -> Option<PathBuf> {
    if let Some(hit) = candidates
        .iter()
        .find(|p| p.file_stem().is_some_and(|s| s.to_string_lossy() == name))
    {
        return Some(hit.clone());
    }
    candidates
        .iter()
        .find(|p| {
            load(&root.join(p))
                .ok()
                .and_then(|w| w.name)
                .is_some_and(|n| n == name)
        })
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_parses_react_flow_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pets.json");
        std::fs::write(
            &path,
            r#"{"nodes":[{"id":"1","type":"catNode","position":{"x":0,"y":0}}],
                "edges":[{"source":"1","sourceHandle":"out","target":"2","targetHandle":"in"}]}"#,
        )
        .unwrap();
        let wf = load(&path).unwrap();
        assert_eq!(wf.nodes.len(), 1);
        assert_eq!(wf.edges[0].field(), Some("out"));
        assert_eq!(display_name(&path, &wf), "pets");
    }

    #[test]
    fn load_reports_parse_errors_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "[").unwrap();
        let err = load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("bad.json"));
    }

    #[test]
    fn find_by_stem_then_name_field() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.json"), r#"{"name":"Pets"}"#).unwrap();
        std::fs::write(dir.path().join("b.json"), r#"{}"#).unwrap();
        let candidates = vec![PathBuf::from("a.json"), PathBuf::from("b.json")];
        assert_eq!(find(dir.path(), &candidates, "b"), Some(PathBuf::from("b.json")));
        assert_eq!(find(dir.path(), &candidates, "Pets"), Some(PathBuf::from("a.json")));
        assert_eq!(find(dir.path(), &candidates, "nope"), None);
    }
}
