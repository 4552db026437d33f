use std::path::PathBuf;

use anyhow::Result;
use nodekeep_edit::{Snapshot, TextEdit};
use nodekeep_extract::DataFlowIdioms;
use nodekeep_extract::dataflow::{RecomputeBlock, recompute_blocks};
use nodekeep_types::{FixResult, Issue, IssueKind, details};

use crate::fixer::{Fixer, IssueInputs};

/// Appends missing fields to the dependency array of a recompute hook.
///
/// Only the hook nearest to the issue line whose body reads one of the
/// fields without listing it is edited; others wait for the next run.
#[derive(Debug, Clone)]
pub struct MissingDependencyFixer {
    root: PathBuf,
    idioms: DataFlowIdioms,
}

impl MissingDependencyFixer {
    pub fn new(root: impl Into<PathBuf>, idioms: DataFlowIdioms) -> Self {
        Self {
            root: root.into(),
            idioms,
        }
    }
}

/// Text to insert before the closing `]` of `inner` (the array contents).
/// Returns `(offset into inner, text)`.
pub(crate) fn append_to_list(inner: &str, items: &[String]) -> (usize, String) {
    let kept = inner.trim_end();
    let joined = items.join(", ");
    let text = if kept.trim().is_empty() {
        return (0, joined);
    } else if kept.ends_with(',') {
        format!(" {joined}")
    } else {
        format!(", {joined}")
    };
    (kept.len(), text)
}

fn distance(block: &RecomputeBlock, line: Option<usize>) -> usize {
    line.map_or(0, |l| block.line.abs_diff(l))
}

impl Fixer for MissingDependencyFixer {
    fn name(&self) -> &'static str {
        "missing-dependency"
    }

    fn kind(&self) -> IssueKind {
        IssueKind::MissingDependency
    }

    fn fix(&self, issue: &Issue) -> Result<FixResult> {
        let inputs = IssueInputs::of(issue);
        let file = inputs.require(details::FILE)?;
        let fields = inputs.list(details::FIELDS)?;

        let snapshot = Snapshot::read(&self.root.join(file))?;
        let src = snapshot.content();

        let mut best: Option<(RecomputeBlock, Vec<String>)> = None;
        for block in recompute_blocks(src, &self.idioms) {
            let exprs: Vec<String> = block
                .uncovered(src)
                .into_iter()
                .filter(|a| fields.contains(&a.field))
                .map(|a| a.expr)
                .collect();
            if exprs.is_empty() {
                continue;
            }
            let closer = best
                .as_ref()
                .is_none_or(|(b, _)| distance(&block, issue.line) < distance(b, issue.line));
            if closer {
                best = Some((block, exprs));
            }
        }

        let Some((block, exprs)) = best else {
            return Ok(FixResult::failed("no matching construct found"));
        };
        let Some(deps) = &block.deps else {
            return Ok(FixResult::failed("no matching construct found"));
        };

        let inner_start = deps.span.start + 1;
        let inner = &src[inner_start..deps.span.end - 1];
        let (offset, text) = append_to_list(inner, &exprs);
        snapshot.commit(&[TextEdit::insert(inner_start + offset, text)])?;

        tracing::debug!(
            file,
            hook = %block.hook,
            line = block.line,
            added = %exprs.join(", "),
            "added dependencies"
        );
        Ok(FixResult::applied(exprs.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nodekeep_types::Severity;

    fn run(src: &str, fields: &str, line: Option<usize>) -> (FixResult, String) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("DogNode.jsx"), src).unwrap();
        let issue = Issue::new(IssueKind::MissingDependency, Severity::Warning, "dep")
            .at("DogNode.jsx", line)
            .with_details(format!("file: DogNode.jsx\nfields: {fields}"));
        let fixer = MissingDependencyFixer::new(dir.path(), DataFlowIdioms::default());
        let result = fixer.fix(&issue).unwrap();
        let after = std::fs::read_to_string(dir.path().join("DogNode.jsx")).unwrap();
        (result, after)
    }

    #[test]
    fn appends_access_expression_to_deps() {
        let (result, after) = run(
            "useEffect(() => { f(data.value); }, [id]);",
            "value",
            Some(1),
        );
        assert!(result.success);
        assert_eq!(result.changes, 1);
        assert_eq!(after, "useEffect(() => { f(data.value); }, [id, data.value]);");
    }

    #[test]
    fn empty_and_trailing_comma_arrays() {
        let (_, after) = run("useMemo(() => data?.x, []);", "x", None);
        assert_eq!(after, "useMemo(() => data?.x, [data?.x]);");

        let (_, after) = run("useMemo(() => data.x, [\n  id,\n]);", "x", None);
        assert_eq!(after, "useMemo(() => data.x, [\n  id, data.x\n]);");
    }

    #[test]
    fn only_the_nearest_hook_is_edited() {
        let src = "useEffect(() => { a(data.v); }, []);\n\n\n\nuseEffect(() => { b(data.v); }, []);\n";
        let (result, after) = run(src, "v", Some(5));
        assert!(result.success);
        assert_eq!(
            after,
            "useEffect(() => { a(data.v); }, []);\n\n\n\nuseEffect(() => { b(data.v); }, [data.v]);\n"
        );
    }

    #[test]
    fn no_qualifying_hook_fails() {
        let src = "useEffect(() => { f(data.value); }, [data.value]);";
        let (result, after) = run(src, "value", None);
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("no matching construct found"));
        assert_eq!(after, src);
    }

    #[test]
    fn append_to_list_cases() {
        assert_eq!(append_to_list("", &["a".into()]), (0, "a".to_string()));
        assert_eq!(append_to_list("  ", &["a".into()]), (0, "a".to_string()));
        assert_eq!(append_to_list("x", &["a".into(), "b".into()]), (1, ", a, b".to_string()));
        assert_eq!(append_to_list("x, ", &["a".into()]), (2, " a".to_string()));
    }
}
