use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::Result;
use nodekeep_edit::{Snapshot, TextEdit};
use nodekeep_types::{FixResult, Issue, IssueKind, details};

use crate::fixer::{Fixer, IssueInputs};

/// Replaces a wrong component reference with the suggested identity in every
/// documentation file that mentions it.
///
/// The replacement keeps the token's presentation: a capitalized token gets
/// the capitalized type name (`FooBarNode` -> `FooBazNode`). Changes are
/// counted per line touched.
#[derive(Debug, Clone)]
pub struct OrphanedReferenceFixer {
    root: PathBuf,
    docs: Vec<PathBuf>,
}

impl OrphanedReferenceFixer {
    /// `docs` are relative to `root`.
    pub fn new(root: impl Into<PathBuf>, docs: Vec<PathBuf>) -> Self {
        Self {
            root: root.into(),
            docs,
        }
    }

    fn replacement(token: &str, suggestion: &str) -> String {
        if token.chars().next().is_some_and(char::is_uppercase) {
            nodekeep_text::type_name(suggestion)
        } else {
            suggestion.to_string()
        }
    }

    fn docs_containing(&self, token: &str) -> Vec<PathBuf> {
        self.docs
            .iter()
            .filter(|rel| {
                std::fs::read_to_string(self.root.join(rel))
                    .is_ok_and(|text| !nodekeep_text::find_whole_word(&text, token).is_empty())
            })
            .cloned()
            .collect()
    }
}

impl Fixer for OrphanedReferenceFixer {
    fn name(&self) -> &'static str {
        "orphaned-reference"
    }

    fn kind(&self) -> IssueKind {
        IssueKind::OrphanedReference
    }

    fn fix(&self, issue: &Issue) -> Result<FixResult> {
        let inputs = IssueInputs::of(issue);
        let token = inputs.require(details::REFERENCE)?;
        let Some(suggestion) = issue.suggestion.as_deref() else {
            return Ok(FixResult::failed(format!(
                "no registered component is close enough to '{token}'"
            )));
        };
        let replacement = Self::replacement(token, suggestion);

        let mut changed_lines = 0;
        for rel in self.docs_containing(token) {
            let snapshot = Snapshot::read(&self.root.join(&rel))?;
            let hits = nodekeep_text::find_whole_word(snapshot.content(), token);
            let lines: BTreeSet<usize> = hits
                .iter()
                .map(|at| nodekeep_text::line_of_offset(snapshot.content(), *at))
                .collect();
            let edits: Vec<TextEdit> = hits
                .iter()
                .map(|at| TextEdit::replace(*at..*at + token.len(), replacement.clone()))
                .collect();
            snapshot.commit(&edits)?;
            tracing::debug!(
                file = %nodekeep_walk::to_slash(&rel),
                from = token,
                to = %replacement,
                lines = lines.len(),
                "replaced reference"
            );
            changed_lines += lines.len();
        }
        Ok(FixResult::applied(changed_lines))
    }

    fn targets(&self, issue: &Issue) -> Vec<PathBuf> {
        match IssueInputs::of(issue).get(details::REFERENCE) {
            Some(token) => self.docs_containing(token),
            None => Vec::new(),
        }
    }
}
