//! Issue taxonomy.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The closed set of issue kinds.
///
/// Wire names mix separators on purpose: they are the names existing
/// configuration and reports already use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum IssueKind {
    #[serde(rename = "orphaned-reference")]
    OrphanedReference,
    #[serde(rename = "missing-file")]
    MissingFile,
    #[serde(rename = "broken-link")]
    BrokenLink,
    #[serde(rename = "missing_dependency")]
    MissingDependency,
    #[serde(rename = "source_not_writing")]
    SourceNotWriting,
    #[serde(rename = "data_flow_mismatch")]
    DataFlowMismatch,
    #[serde(rename = "syntax-error")]
    SyntaxError,
    #[serde(rename = "stale-registry")]
    StaleRegistry,
}

impl IssueKind {
    pub const ALL: [IssueKind; 8] = [
        IssueKind::OrphanedReference,
        IssueKind::MissingFile,
        IssueKind::BrokenLink,
        IssueKind::MissingDependency,
        IssueKind::SourceNotWriting,
        IssueKind::DataFlowMismatch,
        IssueKind::SyntaxError,
        IssueKind::StaleRegistry,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IssueKind::OrphanedReference => "orphaned-reference",
            IssueKind::MissingFile => "missing-file",
            IssueKind::BrokenLink => "broken-link",
            IssueKind::MissingDependency => "missing_dependency",
            IssueKind::SourceNotWriting => "source_not_writing",
            IssueKind::DataFlowMismatch => "data_flow_mismatch",
            IssueKind::SyntaxError => "syntax-error",
            IssueKind::StaleRegistry => "stale-registry",
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IssueKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IssueKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s.trim())
            .ok_or_else(|| format!("unknown issue kind '{s}'"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => f.write_str("error"),
            Severity::Warning => f.write_str("warning"),
        }
    }
}

/// One detected inconsistency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub kind: IssueKind,
    pub severity: Severity,
    #[serde(default)]
    pub file: Option<String>,
    /// 1-based line number.
    #[serde(default)]
    pub line: Option<usize>,
    pub summary: String,
    /// Structured `key: value` lines, see [`crate::details`].
    #[serde(default)]
    pub details: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// Name of the resolved fix strategy, if the kind has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,
    /// Heuristic confidence percentage (0-100) of the resolved strategy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<u8>,
}

impl Issue {
    pub fn new(kind: IssueKind, severity: Severity, summary: impl Into<String>) -> Self {
        Self {
            kind,
            severity,
            file: None,
            line: None,
            summary: summary.into(),
            details: String::new(),
            suggestion: None,
            strategy: None,
            confidence: None,
        }
    }

    pub fn at(mut self, file: impl Into<String>, line: Option<usize>) -> Self {
        self.file = Some(file.into());
        self.line = line;
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = details.into();
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// `file:line` when anchored, the bare file otherwise.
    pub fn location(&self) -> Option<String> {
        match (&self.file, self.line) {
            (Some(f), Some(l)) => Some(format!("{f}:{l}")),
            (Some(f), None) => Some(f.clone()),
            _ => None,
        }
    }
}

/// Error/warning totals over a set of issues.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueSummary {
    pub total: usize,
    pub errors: usize,
    pub warnings: usize,
}

impl IssueSummary {
    pub fn from_issues(issues: &[Issue]) -> Self {
        let errors = issues.iter().filter(|i| i.is_error()).count();
        Self {
            total: issues.len(),
            errors,
            warnings: issues.len() - errors,
        }
    }
}
