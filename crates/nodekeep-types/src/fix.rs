//! Fix strategies, fixer results, and the orchestrator's report.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::IssueKind;

/// Informational risk level of a strategy or an impact entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Low => f.write_str("low"),
            RiskLevel::Medium => f.write_str("medium"),
            RiskLevel::High => f.write_str("high"),
        }
    }
}

/// Policy governing whether and how an issue kind may be repaired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixStrategy {
    pub name: String,
    pub kind: IssueKind,
    /// Name of the fixer implementation this strategy dispatches to.
    pub fixer: String,
    #[serde(default)]
    pub risk: RiskLevel,
    #[serde(default)]
    pub auto_fixable: bool,
    /// Heuristic confidence percentage (0-100).
    pub confidence: u8,
    #[serde(default)]
    pub requires_confirmation: bool,
}

/// A concrete edit a human should make.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixSuggestion {
    pub description: String,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub line: Option<usize>,
    #[serde(default)]
    pub example: Option<String>,
}

/// Outcome of one fixer invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixResult {
    pub success: bool,
    pub changes: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub requires_manual_fix: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<FixSuggestion>,
}

impl FixResult {
    pub fn applied(changes: usize) -> Self {
        Self {
            success: true,
            changes,
            ..Self::default()
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::default()
        }
    }

    /// Advisory outcome: nothing applied, edits described instead.
    pub fn manual(suggestions: Vec<FixSuggestion>) -> Self {
        Self {
            success: false,
            error: Some("requires manual fix".to_string()),
            requires_manual_fix: true,
            suggestions,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixStatus {
    Applied,
    DryRun,
    Skipped,
    Failed,
}

impl fmt::Display for FixStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FixStatus::Applied => f.write_str("applied"),
            FixStatus::DryRun => f.write_str("dry-run"),
            FixStatus::Skipped => f.write_str("skipped"),
            FixStatus::Failed => f.write_str("failed"),
        }
    }
}

/// Per-issue line of a [`FixReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixEntry {
    pub kind: IssueKind,
    pub summary: String,
    #[serde(default)]
    pub file: Option<String>,
    pub strategy: String,
    pub status: FixStatus,
    pub changes: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<FixSuggestion>,
}

/// Result of one orchestrator run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixReport {
    pub dry_run: bool,
    /// Applied fixes, or would-be fixes in dry-run mode.
    pub fixed: usize,
    pub failed: usize,
    pub skipped: usize,
    /// Total changes reported by fixers.
    pub changes: usize,
    pub entries: Vec<FixEntry>,
}

impl FixReport {
    /// A run passes unless a fix failed; skips do not count against it.
    pub fn passed(&self) -> bool {
        self.failed == 0
    }

    pub fn push(&mut self, entry: FixEntry) {
        match entry.status {
            FixStatus::Applied | FixStatus::DryRun => self.fixed += 1,
            FixStatus::Skipped => self.skipped += 1,
            FixStatus::Failed => self.failed += 1,
        }
        self.changes += entry.changes;
        self.entries.push(entry);
    }
}
