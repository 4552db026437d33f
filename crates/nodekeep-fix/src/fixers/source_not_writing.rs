use std::path::PathBuf;

use anyhow::Result;
use nodekeep_edit::{Snapshot, TextEdit};
use nodekeep_extract::DataFlowIdioms;
use nodekeep_extract::dataflow::write_calls;
use nodekeep_types::{FixResult, Issue, IssueKind, details};

use super::missing_dependency::append_to_list;
use crate::fixer::{Fixer, IssueInputs};

/// Adds fields a consumer expects to the upstream component's first write
/// call, each with a placeholder value guessed from its name.
///
/// The placeholder is rarely what the author wants, which is why the
/// strategy asks for confirmation.
#[derive(Debug, Clone)]
pub struct SourceNotWritingFixer {
    root: PathBuf,
    idioms: DataFlowIdioms,
}

impl SourceNotWritingFixer {
    pub fn new(root: impl Into<PathBuf>, idioms: DataFlowIdioms) -> Self {
        Self {
            root: root.into(),
            idioms,
        }
    }
}

/// Placeholder value for a field, by name.
pub(crate) fn placeholder(field: &str) -> &'static str {
    let lower = field.to_ascii_lowercase();
    if lower.ends_with('s') || ["list", "items", "array"].iter().any(|w| lower.contains(w)) {
        "[]"
    } else if ["text", "name", "label", "title", "message", "prompt", "content", "str"]
        .iter()
        .any(|w| lower.contains(w))
    {
        "''"
    } else {
        "null"
    }
}

impl Fixer for SourceNotWritingFixer {
    fn name(&self) -> &'static str {
        "source-not-writing"
    }

    fn kind(&self) -> IssueKind {
        IssueKind::SourceNotWriting
    }

    fn fix(&self, issue: &Issue) -> Result<FixResult> {
        let inputs = IssueInputs::of(issue);
        let file = inputs.require(details::FILE)?;
        let fields = inputs.list(details::FIELDS)?;

        let snapshot = Snapshot::read(&self.root.join(file))?;
        let src = snapshot.content();
        let Some(call) = write_calls(src, &self.idioms).into_iter().next() else {
            return Ok(FixResult::failed("no update call with a data object found"));
        };

        let missing: Vec<String> = fields
            .iter()
            .filter(|f| !call.object.keys.contains(f))
            .map(|f| format!("{f}: {}", placeholder(f)))
            .collect();
        if missing.is_empty() {
            return Ok(FixResult::applied(0));
        }

        let inner = call.object.span.start + 1..call.object.span.end - 1;
        let edit = if src[inner.clone()].trim().is_empty() {
            TextEdit::replace(inner, format!(" {} ", missing.join(", ")))
        } else {
            let (offset, text) = append_to_list(&src[inner.clone()], &missing);
            TextEdit::insert(inner.start + offset, text)
        };
        snapshot.commit(&[edit])?;

        tracing::debug!(
            file,
            callee = %call.callee,
            line = call.line,
            added = %missing.join(", "),
            "added written fields"
        );
        Ok(FixResult::applied(missing.len()))
    }
}
