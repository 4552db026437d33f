//! # nodekeep-walk
//!
//! **Tier 2 (Utilities)**
//!
//! Source scanner. Provides filesystem traversal with gitignore support and
//! the filters that decide which files are component sources, documentation,
//! or saved workflows.
//!
//! ## What belongs here
//! * Filesystem traversal respecting ignore files
//! * Component source / documentation / workflow selection
//!
//! ## What does NOT belong here
//! * Reading file contents (use nodekeep-extract)
//! * File modification

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ignore::WalkBuilder;

/// Directories never descended into, ignore files or not.
const ALWAYS_SKIPPED: &[&str] = &[".git", "node_modules", ".nodekeep"];

/// Documentation extensions picked up when a documentation path is a directory.
pub const DOC_EXTENSIONS: &[&str] = &["md", "mdx", "markdown"];

/// Which files count as component sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFilter {
    /// File extensions without the dot.
    pub extensions: Vec<String>,
    /// Required file stem suffix, e.g. `Node`. Empty accepts every stem.
    pub suffix: String,
}

impl Default for SourceFilter {
    fn default() -> Self {
        Self {
            extensions: ["jsx", "tsx", "js", "ts"].map(String::from).to_vec(),
            suffix: "Node".to_string(),
        }
    }
}

impl SourceFilter {
    pub fn matches(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        if !self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)) {
            return false;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            return false;
        };
        // Test and story files share the stem suffix but are not components.
        if stem.contains('.') {
            return false;
        }
        if self.suffix.is_empty() {
            return !stem.is_empty();
        }
        stem.len() > self.suffix.len() && stem.ends_with(&self.suffix)
    }
}

/// List every file under `root`, relative to `root`, sorted.
///
/// Hidden entries and [`ALWAYS_SKIPPED`] directories are not visited.
pub fn list_files(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.exists() {
        anyhow::bail!("Path not found: {}", root.display());
    }

    let mut files: Vec<PathBuf> = Vec::new();
    let mut builder = WalkBuilder::new(root);
    builder.hidden(true);
    builder.git_ignore(true);
    builder.git_exclude(true);
    builder.git_global(false);
    builder.require_git(false);
    builder.follow_links(false);
    builder.filter_entry(|entry| {
        let name = entry.file_name().to_string_lossy();
        !ALWAYS_SKIPPED.iter().any(|s| *s == name)
    });

    for entry in builder.build() {
        let entry = entry.with_context(|| format!("Failed to walk {}", root.display()))?;
        if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            continue;
        }
        let path = entry.path().to_path_buf();
        let rel = path.strip_prefix(root).unwrap_or(&path).to_path_buf();
        files.push(rel);
    }

    files.sort_by(|a, b| a.to_string_lossy().cmp(&b.to_string_lossy()));
    Ok(files)
}

/// Component source files under `root/dir`, relative to `root`.
///
/// A missing source directory yields an empty list, not an error.
pub fn component_sources(root: &Path, dir: &Path, filter: &SourceFilter) -> Result<Vec<PathBuf>> {
    let base = root.join(dir);
    if !base.exists() {
        tracing::warn!(dir = %base.display(), "component directory does not exist");
        return Ok(Vec::new());
    }
    let files = list_files(&base)?
        .into_iter()
        .map(|rel| dir.join(rel))
        .filter(|p| filter.matches(p))
        .collect::<Vec<_>>();
    tracing::debug!(count = files.len(), "component sources found");
    Ok(files)
}

/// Documentation files named by `paths` (files or directories), relative to
/// `root`, sorted and de-duplicated. Missing paths are skipped.
pub fn documentation_files(root: &Path, paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for rel in paths {
        let abs = root.join(rel);
        if abs.is_file() {
            out.push(rel.clone());
        } else if abs.is_dir() {
            for file in list_files(&abs)? {
                if has_extension(&file, DOC_EXTENSIONS) {
                    out.push(rel.join(file));
                }
            }
        } else {
            tracing::debug!(path = %abs.display(), "documentation path missing, skipped");
        }
    }
    out.sort_by(|a, b| a.to_string_lossy().cmp(&b.to_string_lossy()));
    out.dedup();
    Ok(out)
}

/// Saved workflow documents (`*.json`) under `root/dir`, relative to `root`.
pub fn workflow_files(root: &Path, dir: &Path) -> Result<Vec<PathBuf>> {
    let base = root.join(dir);
    if !base.is_dir() {
        return Ok(Vec::new());
    }
    Ok(list_files(&base)?
        .into_iter()
        .filter(|p| has_extension(p, &["json"]))
        .map(|rel| dir.join(rel))
        .collect())
}

/// Repo-relative path rendered with `/` separators.
pub fn to_slash(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            std::path::Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn has_extension(path: &Path, exts: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| exts.iter().any(|x| x.eq_ignore_ascii_case(e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn filter_requires_extension_and_suffix() {
        let f = SourceFilter::default();
        assert!(f.matches(Path::new("src/nodes/CatNode.jsx")));
        assert!(f.matches(Path::new("CatNode.TSX")));
        assert!(!f.matches(Path::new("src/nodes/Cat.jsx")));
        assert!(!f.matches(Path::new("src/nodes/CatNode.css")));
        assert!(!f.matches(Path::new("src/nodes/Node.jsx")));
        assert!(!f.matches(Path::new("src/nodes/CatNode.test.jsx")));
    }

    #[test]
    fn empty_suffix_accepts_any_stem() {
        let f = SourceFilter {
            extensions: vec!["js".into()],
            suffix: String::new(),
        };
        assert!(f.matches(Path::new("anything.js")));
    }

    #[test]
    fn to_slash_joins_normal_components() {
        assert_eq!(to_slash(Path::new("./src/nodes/CatNode.jsx")), "src/nodes/CatNode.jsx");
    }

    #[test]
    fn list_files_missing_root_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(list_files(&dir.path().join("nope")).is_err());
    }

    #[test]
    fn list_files_skips_node_modules_and_state_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("node_modules/pkg")).unwrap();
        fs::create_dir_all(dir.path().join(".nodekeep")).unwrap();
        fs::write(dir.path().join("node_modules/pkg/XNode.js"), "").unwrap();
        fs::write(dir.path().join(".nodekeep/registry.json"), "{}").unwrap();
        fs::write(dir.path().join("a.txt"), "").unwrap();
        let files = list_files(dir.path()).unwrap();
        assert_eq!(files, vec![PathBuf::from("a.txt")]);
    }

    #[test]
    fn component_sources_missing_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let files =
            component_sources(dir.path(), Path::new("src"), &SourceFilter::default()).unwrap();
        assert!(files.is_empty());
    }
}
