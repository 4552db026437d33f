//! # nodekeep-extract
//!
//! **Tier 2 (Extraction)**
//!
//! Best-effort structural extraction over component sources. Nothing here
//! parses JavaScript; recognizers work on a masked copy of the source where
//! strings and comments are blanked out, so brackets and keywords inside them
//! cannot mislead the scan.
//!
//! ## What belongs here
//! * Component metadata: identity, category, ports, export name, label
//! * Data-flow idioms: write calls, field reads, recompute hooks
//! * Lexical helpers (masking, bracket matching, balance)
//!
//! ## What does NOT belong here
//! * Directory traversal (use nodekeep-walk)
//! * Judging whether a component is *wrong* (use nodekeep-validate)

pub mod dataflow;
pub mod lexer;
pub mod metadata;

use std::path::{Path, PathBuf};

use nodekeep_types::ComponentRecord;
use thiserror::Error;

pub use dataflow::{
    DataFlowIdioms, DepsArray, FieldAccess, ObjectLiteral, RecomputeBlock, WriteCall,
};

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is not valid UTF-8")]
    NotUtf8 { path: String },

    #[error("cannot derive a component identity from {path}")]
    NoIdentity { path: String },
}

/// Produces a [`ComponentRecord`] from one source file.
///
/// The registry builder only depends on this trait, so a real parser can be
/// swapped in without touching the build pipeline.
pub trait StructuralExtractor {
    /// Extract metadata for `rel` (relative to `root`).
    fn extract(&self, root: &Path, rel: &Path) -> Result<ComponentRecord, ExtractError>;
}

/// Regex and bracket-matching extractor for JSX/TSX components.
#[derive(Debug, Clone, Copy, Default)]
pub struct BestEffortExtractor;

impl StructuralExtractor for BestEffortExtractor {
    fn extract(&self, root: &Path, rel: &Path) -> Result<ComponentRecord, ExtractError> {
        let abs = root.join(rel);
        let source = read_source(&abs)?;
        record_from_source(root, rel, &source)
    }
}

/// Read a source file as UTF-8.
pub fn read_source(path: &Path) -> Result<String, ExtractError> {
    let bytes = std::fs::read(path).map_err(|source| ExtractError::Io {
        path: path.display().to_string(),
        source,
    })?;
    String::from_utf8(bytes).map_err(|_| ExtractError::NotUtf8 {
        path: path.display().to_string(),
    })
}

/// Build a record from source text already in memory.
pub fn record_from_source(
    root: &Path,
    rel: &Path,
    source: &str,
) -> Result<ComponentRecord, ExtractError> {
    let file_name = rel
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let id = nodekeep_text::id_from_file_name(&file_name).ok_or_else(|| {
        ExtractError::NoIdentity {
            path: nodekeep_walk::to_slash(rel),
        }
    })?;

    let masked = lexer::mask_non_code(source);
    let (inputs, outputs) = metadata::ports(source, &masked);
    let abs = root.join(rel);

    Ok(ComponentRecord {
        id,
        file_name,
        path: nodekeep_walk::to_slash(rel),
        absolute_path: absolute(&abs).display().to_string(),
        category: metadata::infer_category(rel),
        label: metadata::label(source, &masked),
        export_name: metadata::export_name(source, &masked),
        inputs,
        outputs,
        exists: abs.is_file(),
    })
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
