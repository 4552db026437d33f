//! # nodekeep-fix
//!
//! **Tier 3 (Repair)**
//!
//! Maps issue kinds to fix strategies, strategies to fixers, and drives a
//! scan-and-fix run under dry-run, backup, and confirmation policy.
//!
//! ## What belongs here
//! * The strategy catalog (embedded `strategies.toml`, or a configured list)
//! * The [`Fixer`] capability and the four built-in fixers
//! * The [`Orchestrator`] and its [`FixReport`](nodekeep_types::FixReport)
//!
//! ## What does NOT belong here
//! * Finding issues (use nodekeep-validate)
//! * Span edits and atomic writes (use nodekeep-edit)
//!
//! ## Example
//! ```ignore
//! use nodekeep_fix::{FixOptions, Orchestrator, StrategyCatalog, standard_fixers};
//!
//! let fixers = standard_fixers(root, docs, &idioms);
//! let mut orch = Orchestrator::new(StrategyCatalog::builtin()?, fixers, validators)?;
//! let scan = orch.scan(&workspace);
//! let report = orch.apply_fixes(root, &scan.fixable, &FixOptions::default());
//! ```

mod catalog;
mod fixer;
pub mod fixers;
mod orchestrator;

pub use catalog::{CatalogError, StrategyCatalog};
pub use fixer::{Fixer, FixerRegistry};
pub use fixers::standard_fixers;
pub use orchestrator::{
    DEFAULT_BACKUP_DIR, FixOptions, Orchestrator, Phase, ScanOutcome, ValidatorFailure,
};
