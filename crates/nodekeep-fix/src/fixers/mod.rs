//! Built-in fixers.

mod data_flow;
mod missing_dependency;
mod orphaned_reference;
mod source_not_writing;

use std::path::{Path, PathBuf};

use nodekeep_extract::DataFlowIdioms;

pub use data_flow::DataFlowAdvisor;
pub use missing_dependency::MissingDependencyFixer;
pub use orphaned_reference::OrphanedReferenceFixer;
pub use source_not_writing::SourceNotWritingFixer;

use crate::FixerRegistry;

/// The four built-in fixers, wired to one repository.
pub fn standard_fixers(root: &Path, docs: Vec<PathBuf>, idioms: &DataFlowIdioms) -> FixerRegistry {
    FixerRegistry::new()
        .with(Box::new(OrphanedReferenceFixer::new(root, docs)))
        .with(Box::new(MissingDependencyFixer::new(root, idioms.clone())))
        .with(Box::new(SourceNotWritingFixer::new(root, idioms.clone())))
        .with(Box::new(DataFlowAdvisor))
}
