//! Documentation cross-references.
//!
//! Three checks run over every documentation line:
//!
//! 1. Capitalized tokens ending with the component suffix must name a
//!    registered component (`orphaned-reference`). The nearest registered
//!    identity within [`SUGGESTION_THRESHOLD`] edits is attached as a
//!    suggestion.
//! 2. Source-file paths (`src/nodes/CatNode.jsx`) must exist (`missing-file`).
//! 3. Relative Markdown links must resolve (`broken-link`).
//!
//! Paths and links inside fenced code blocks are not checked; component
//! references are, since code samples name components too.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

use anyhow::Result;
use nodekeep_text::SUGGESTION_THRESHOLD;
use nodekeep_types::details::{self, Details};
use nodekeep_types::{Issue, IssueKind, Registry, Severity};
use regex::Regex;

use crate::{Validation, Validator, Workspace};

static TYPE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Z][A-Za-z0-9_]*\b").expect("valid regex literal"));

static SOURCE_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:^|[\s(\[`'"])((?:\.{1,2}/)?(?:[\w.-]+/)+[\w.-]+\.(?:jsx|tsx|js|ts))\b"#)
        .expect("valid regex literal")
});

static MD_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\[[^\]]*\]\(\s*<?([^)\s>]+)>?(?:\s+"[^"]*")?\s*\)"#).expect("valid regex literal")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceValidator {
    /// Suffix that marks a token as a component reference.
    pub suffix: String,
}

impl Default for ReferenceValidator {
    fn default() -> Self {
        Self {
            suffix: "Node".to_string(),
        }
    }
}

impl Validator for ReferenceValidator {
    fn name(&self) -> &'static str {
        "reference"
    }

    fn validate(&self, workspace: &Workspace<'_>) -> Result<Validation> {
        let mut issues = Vec::new();
        for rel in workspace.docs {
            let doc = nodekeep_walk::to_slash(rel);
            match std::fs::read_to_string(workspace.root.join(rel)) {
                Ok(text) => {
                    issues.extend(self.check_document(
                        workspace.root,
                        &doc,
                        &text,
                        workspace.registry,
                    ));
                }
                Err(err) => {
                    tracing::warn!(doc = %doc, error = %err, "unreadable document");
                    issues.push(unreadable(&doc, &err));
                }
            }
        }
        tracing::debug!(
            docs = workspace.docs.len(),
            issues = issues.len(),
            "reference validation complete"
        );
        Ok(Validation {
            validator: self.name(),
            processed: workspace.docs.len(),
            issues,
        })
    }
}

fn unreadable(doc: &str, err: &std::io::Error) -> Issue {
    Issue::new(
        IssueKind::MissingFile,
        Severity::Error,
        format!("document {doc} could not be read"),
    )
    .at(doc, None)
    .with_details(
        Details::new()
            .with(details::FILE, doc)
            .with(details::PROBLEM, err.to_string())
            .render(),
    )
}

impl ReferenceValidator {
    /// Check one document. `doc` is its repo-relative path.
    pub fn check_document(
        &self,
        root: &Path,
        doc: &str,
        text: &str,
        registry: &Registry,
    ) -> Vec<Issue> {
        let mut issues = Vec::new();
        // token -> lines; `order` keeps first-seen order
        let mut orphans: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        let mut order: Vec<String> = Vec::new();
        let doc_dir = Path::new(doc).parent().unwrap_or(Path::new(""));
        let mut in_fence = false;

        for (idx, line) in text.lines().enumerate() {
            let line_no = idx + 1;
            let fence = line.trim_start().starts_with("```") || line.trim_start().starts_with("~~~");
            if fence {
                in_fence = !in_fence;
            }

            for m in TYPE_TOKEN.find_iter(line) {
                let token = m.as_str();
                if !self.is_reference(token) {
                    continue;
                }
                if registry.contains(&nodekeep_text::component_id(token)) {
                    continue;
                }
                let lines = orphans.entry(token.to_string()).or_default();
                if lines.is_empty() {
                    order.push(token.to_string());
                }
                if lines.last() != Some(&line_no) {
                    lines.push(line_no);
                }
            }

            if in_fence || fence {
                continue;
            }

            for cap in SOURCE_PATH.captures_iter(line) {
                let path = &cap[1];
                if !path_exists(root, doc_dir, path) {
                    issues.push(
                        Issue::new(
                            IssueKind::MissingFile,
                            Severity::Error,
                            format!("referenced file '{path}' does not exist"),
                        )
                        .at(doc, Some(line_no))
                        .with_details(
                            Details::new()
                                .with(details::FILE, doc)
                                .with(details::REFERENCE, path)
                                .render(),
                        ),
                    );
                }
            }

            for cap in MD_LINK.captures_iter(line) {
                let target = &cap[1];
                let Some(resolved) = resolve_link(doc_dir, target) else {
                    continue;
                };
                if !link_exists(root, &resolved) {
                    issues.push(
                        Issue::new(
                            IssueKind::BrokenLink,
                            Severity::Warning,
                            format!("link target '{target}' does not exist"),
                        )
                        .at(doc, Some(line_no))
                        .with_details(
                            Details::new()
                                .with(details::FILE, doc)
                                .with(details::REFERENCE, target)
                                .with(details::EXPECTED, nodekeep_walk::to_slash(&resolved))
                                .render(),
                        ),
                    );
                }
            }
        }

        for token in order {
            let lines = &orphans[&token];
            issues.push(orphan_issue(doc, &token, lines, registry));
        }

        issues.sort_by_key(|i| i.line);
        issues
    }

    fn is_reference(&self, token: &str) -> bool {
        token.len() > self.suffix.len() && token.ends_with(&self.suffix)
    }
}

fn orphan_issue(doc: &str, token: &str, lines: &[usize], registry: &Registry) -> Issue {
    let id = nodekeep_text::component_id(token);
    let suggestion = nodekeep_text::nearest(&id, registry.ids(), SUGGESTION_THRESHOLD);

    let line_list: Vec<String> = lines.iter().map(ToString::to_string).collect();
    let mut info = Details::new()
        .with(details::FILE, doc)
        .with(details::REFERENCE, token)
        .with_list("lines", &line_list);

    let mut issue = Issue::new(
        IssueKind::OrphanedReference,
        Severity::Error,
        format!("'{token}' does not match any registered component"),
    )
    .at(doc, lines.first().copied());

    if let Some(s) = suggestion {
        info = info.with("distance", s.distance);
        issue = issue.with_suggestion(s.id);
    }
    issue.with_details(info.render())
}

fn path_exists(root: &Path, doc_dir: &Path, path: &str) -> bool {
    let rel = Path::new(path);
    root.join(normalize(rel)).exists() || root.join(normalize(&doc_dir.join(rel))).exists()
}

/// Repo-relative path a link points at, or `None` for links that are not
/// local file links (external, anchor-only, site routes).
fn resolve_link(doc_dir: &Path, target: &str) -> Option<PathBuf> {
    if target.is_empty() || target.starts_with('#') || target.starts_with('?') {
        return None;
    }
    if target.starts_with("//") || has_uri_scheme(target) {
        return None;
    }
    let path_part = target.split(['#', '?']).next().unwrap_or_default();
    if path_part.is_empty() {
        return None;
    }
    let decoded = path_part.replace("%20", " ");
    let resolved = match decoded.strip_prefix('/') {
        Some(abs) => normalize(Path::new(abs)),
        None => normalize(&doc_dir.join(&decoded)),
    };
    Some(resolved)
}

fn link_exists(root: &Path, resolved: &Path) -> bool {
    let abs = root.join(resolved);
    if abs.exists() {
        return true;
    }
    abs.extension().is_none() && abs.with_extension("md").exists()
}

fn has_uri_scheme(target: &str) -> bool {
    let Some((scheme, _)) = target.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    first.is_ascii_alphabetic()
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '.' | '-'))
}

/// Collapse `.` and `..` without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            Component::Normal(s) => out.push(s),
            Component::RootDir | Component::Prefix(_) => {}
        }
    }
    out
}
