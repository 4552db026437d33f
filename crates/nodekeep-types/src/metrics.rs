//! Per-run metrics records and trend verdicts.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunCounts {
    pub processed: usize,
    pub errors: usize,
    pub warnings: usize,
}

impl RunCounts {
    pub fn issue_total(&self) -> usize {
        self.errors + self.warnings
    }
}

/// Aggregate counts of one validation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsRecord {
    /// RFC 3339 timestamp.
    pub timestamp: String,
    /// Validator type, e.g. `reference`, `dataflow`, `syntax`, `autofix`.
    pub validator: String,
    pub summary: RunCounts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Improving,
    Worsening,
    Stable,
    InsufficientData,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trend::Improving => f.write_str("improving"),
            Trend::Worsening => f.write_str("worsening"),
            Trend::Stable => f.write_str("stable"),
            Trend::InsufficientData => f.write_str("insufficient data"),
        }
    }
}

/// Pairwise comparison tallies plus the majority verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendReport {
    pub verdict: Trend,
    pub improving: usize,
    pub worsening: usize,
    pub stable: usize,
    /// Number of history entries considered.
    pub samples: usize,
}
