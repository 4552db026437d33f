//! # nodekeep-types
//!
//! **Tier 0 (Core Types)**
//!
//! This crate defines the core data structures and contracts for `nodekeep`.
//! It contains only data types, Serde definitions, and `SCHEMA_VERSION`.
//!
//! ## Stability Policy
//!
//! **JSON-first stability**: the persisted registry and metrics documents are
//! the primary contract. UI-side tooling reads `registry.json` directly, so
//! renamed or removed fields bump `SCHEMA_VERSION`.
//!
//! ## What belongs here
//! * Pure data structs (records, issues, fix results, reports)
//! * Serialization/Deserialization logic
//! * Structured issue details (`details`)
//!
//! ## What does NOT belong here
//! * File I/O
//! * CLI argument parsing
//! * Validation or fix logic

pub mod details;
mod fix;
mod impact;
mod issue;
mod metrics;
mod registry;
mod workflow;

pub use fix::{FixEntry, FixReport, FixResult, FixStatus, FixStrategy, FixSuggestion, RiskLevel};
pub use impact::{Dependent, ImpactReport, RiskEntry, TestRecommendation};
pub use issue::{Issue, IssueKind, IssueSummary, Severity};
pub use metrics::{MetricsRecord, RunCounts, Trend, TrendReport};
pub use registry::{Category, ComponentRecord, Port, Registry, RegistrySummary};
pub use workflow::{EdgeData, Workflow, WorkflowEdge, WorkflowNode};

/// The current schema version for persisted documents.
pub const SCHEMA_VERSION: u32 = 1;

/// Name and version of the tool that produced a document.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ToolInfo {
    pub name: String,
    pub version: String,
}

impl Default for ToolInfo {
    fn default() -> Self {
        Self {
            name: "nodekeep".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
