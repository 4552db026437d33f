//! # nodekeep-validate
//!
//! **Tier 3 (Validation)**
//!
//! The three validators that turn drift into [`Issue`]s:
//!
//! * [`reference::ReferenceValidator`]: component names, source paths, and
//!   links inside documentation
//! * [`dataflow::DataFlowValidator`]: saved workflow edges against what the
//!   connected components write and recompute on
//! * [`syntax::SyntaxValidator`]: an external checker with a heuristic
//!   fallback
//!
//! Validators never fail on a single bad input; per-item problems become
//! issues. An `Err` from [`Validator::validate`] means the run itself could
//! not proceed (e.g. the documentation tree could not be walked).
//!
//! ## What does NOT belong here
//! * Deciding whether an issue is fixable (use nodekeep-fix)
//! * Persisting results (use nodekeep-metrics)

pub mod dataflow;
pub mod reference;
pub mod syntax;
pub mod workflow;

use std::path::{Path, PathBuf};

use anyhow::Result;
use nodekeep_types::{Issue, Registry, RunCounts};

pub use dataflow::DataFlowValidator;
pub use reference::ReferenceValidator;
pub use syntax::{CheckerCommand, SyntaxValidator};

/// Everything a validator may look at during one run.
#[derive(Debug, Clone, Copy)]
pub struct Workspace<'a> {
    pub root: &'a Path,
    pub registry: &'a Registry,
    /// Documentation files, relative to `root`.
    pub docs: &'a [PathBuf],
    /// Saved workflow documents, relative to `root`.
    pub workflows: &'a [PathBuf],
}

/// Issues from one validator plus how many inputs it looked at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validation {
    /// Validator type as recorded in metrics: `reference`, `dataflow`, `syntax`.
    pub validator: &'static str,
    pub processed: usize,
    pub issues: Vec<Issue>,
}

impl Validation {
    pub fn counts(&self) -> RunCounts {
        let errors = self.issues.iter().filter(|i| i.is_error()).count();
        RunCounts {
            processed: self.processed,
            errors,
            warnings: self.issues.len() - errors,
        }
    }
}

pub trait Validator {
    fn name(&self) -> &'static str;

    fn validate(&self, workspace: &Workspace<'_>) -> Result<Validation>;
}
