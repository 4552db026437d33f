use anyhow::Result;
use nodekeep_types::{FixResult, FixSuggestion, Issue, IssueKind, details};

use crate::fixer::{Fixer, IssueInputs};

/// Explains a workflow/component mismatch. Never edits anything: deciding
/// which side of an edge is wrong needs a human.
#[derive(Debug, Clone, Copy, Default)]
pub struct DataFlowAdvisor;

impl Fixer for DataFlowAdvisor {
    fn name(&self) -> &'static str {
        "data-flow-advisor"
    }

    fn kind(&self) -> IssueKind {
        IssueKind::DataFlowMismatch
    }

    fn fix(&self, issue: &Issue) -> Result<FixResult> {
        let inputs = IssueInputs::of(issue);
        let file = inputs.get(details::FILE).or(issue.file.as_deref());
        let mut suggestions = Vec::new();

        let problem = inputs.get(details::PROBLEM).unwrap_or(&issue.summary);
        suggestions.push(FixSuggestion {
            description: format!("Resolve: {problem}"),
            file: file.map(String::from),
            line: issue.line,
            example: None,
        });

        if let Some(expected) = inputs.get(details::EXPECTED) {
            suggestions.push(FixSuggestion {
                description: format!("Expected one of: {expected}"),
                file: file.map(String::from),
                line: issue.line,
                example: None,
            });
        }

        if let Some(edge) = inputs.get(details::EDGE) {
            let workflow = inputs.get(details::WORKFLOW).unwrap_or("the workflow");
            suggestions.push(FixSuggestion {
                description: format!(
                    "Check edge {edge} in {workflow} against the component ports"
                ),
                file: None,
                line: None,
                example: Some(format!("\"sourceHandle\" and \"targetHandle\" of {edge}")),
            });
        }

        Ok(FixResult::manual(suggestions))
    }
}
