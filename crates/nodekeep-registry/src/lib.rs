//! # nodekeep-registry
//!
//! **Tier 3 (Registry Store)**
//!
//! Builds the component registry from a fresh scan, persists it as the single
//! source of truth, loads it back for validators, and compares a persisted
//! registry with a fresh scan.
//!
//! A build never merges: each one regenerates every record and replaces the
//! persisted document wholesale.
//!
//! ## What belongs here
//! * `scan` / `build` / `save` / `load` / `check`
//! * Identity collision handling
//!
//! ## What does NOT belong here
//! * How metadata is recognized (use nodekeep-extract)
//! * Cross-reference validation (use nodekeep-validate)

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use nodekeep_extract::StructuralExtractor;
use nodekeep_types::details::{self, Details};
use nodekeep_types::{ComponentRecord, Issue, IssueKind, Registry, SCHEMA_VERSION, Severity};
use nodekeep_walk::SourceFilter;
use thiserror::Error;

/// Registry location relative to the repository root.
pub const DEFAULT_REGISTRY_PATH: &str = ".nodekeep/registry.json";

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("registry missing at {path}: no registry build has been run")]
    Missing { path: String },

    #[error("failed to read registry {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("registry {path} is malformed: {source}")]
    Malformed {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("registry {path} has schema version {found}, expected {expected}")]
    SchemaMismatch {
        path: String,
        found: u32,
        expected: u32,
    },
}

/// Where component sources live and which files count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    /// Component source directory, relative to the root.
    pub source_dir: PathBuf,
    pub filter: SourceFilter,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("src"),
            filter: SourceFilter::default(),
        }
    }
}

/// A source file left out of the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedSource {
    pub path: String,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct BuildOutcome {
    pub registry: Registry,
    pub skipped: Vec<SkippedSource>,
}

/// Scan and extract without persisting.
///
/// Per-file extraction failures are logged and reported in
/// [`BuildOutcome::skipped`]; they never abort the scan. When two files derive
/// the same identity, the first in sorted path order wins.
pub fn scan(
    root: &Path,
    options: &BuildOptions,
    extractor: &dyn StructuralExtractor,
) -> Result<BuildOutcome> {
    let files = nodekeep_walk::component_sources(root, &options.source_dir, &options.filter)?;

    let mut records: BTreeMap<String, ComponentRecord> = BTreeMap::new();
    let mut skipped = Vec::new();

    for rel in &files {
        let path = nodekeep_walk::to_slash(rel);
        match extractor.extract(root, rel) {
            Ok(record) => {
                if let Some(existing) = records.get(&record.id) {
                    let reason = format!(
                        "identity '{}' already registered by {}",
                        record.id, existing.path
                    );
                    tracing::warn!(file = %path, %reason, "skipping colliding component");
                    skipped.push(SkippedSource { path, reason });
                    continue;
                }
                tracing::debug!(id = %record.id, file = %path, "extracted component");
                records.insert(record.id.clone(), record);
            }
            Err(err) => {
                tracing::warn!(file = %path, error = %err, "extraction failed, skipping");
                skipped.push(SkippedSource {
                    path,
                    reason: err.to_string(),
                });
            }
        }
    }

    let registry = Registry::from_records(records.into_values().collect(), now_rfc3339());
    tracing::info!(
        components = registry.len(),
        skipped = skipped.len(),
        "registry scan complete"
    );
    Ok(BuildOutcome { registry, skipped })
}

/// Scan, then unconditionally replace the registry at `registry_path`.
pub fn build(
    root: &Path,
    options: &BuildOptions,
    extractor: &dyn StructuralExtractor,
    registry_path: &Path,
) -> Result<BuildOutcome> {
    let outcome = scan(root, options, extractor)?;
    save(&outcome.registry, registry_path)?;
    Ok(outcome)
}

/// Persist a registry atomically as pretty JSON.
pub fn save(registry: &Registry, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(registry).context("Failed to serialize registry")?;
    nodekeep_edit::write_atomic(path, json.as_bytes())
        .with_context(|| format!("Failed to write registry {}", path.display()))?;
    tracing::debug!(path = %path.display(), "registry saved");
    Ok(())
}

/// Load a persisted registry.
pub fn load(path: &Path) -> Result<Registry, RegistryError> {
    let display = path.display().to_string();
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(RegistryError::Missing { path: display });
        }
        Err(source) => return Err(RegistryError::Io { path: display, source }),
    };
    let registry: Registry =
        serde_json::from_str(&text).map_err(|source| RegistryError::Malformed {
            path: display.clone(),
            source,
        })?;
    if registry.schema_version != SCHEMA_VERSION {
        return Err(RegistryError::SchemaMismatch {
            path: display,
            found: registry.schema_version,
            expected: SCHEMA_VERSION,
        });
    }
    Ok(registry)
}

/// Compare a persisted registry with a fresh scan.
///
/// Reports components the registry does not know about, records whose file
/// is gone, and records whose extracted metadata changed. Absolute paths and
/// timestamps are not compared.
pub fn check(persisted: &Registry, fresh: &Registry) -> Vec<Issue> {
    let mut issues = Vec::new();

    for record in fresh.records() {
        match persisted.get(&record.id) {
            None => issues.push(
                stale(format!("component '{}' is not registered", record.id))
                    .at(record.path.clone(), None)
                    .with_details(
                        Details::new()
                            .with(details::NODE, &record.id)
                            .with(details::PROBLEM, "unregistered")
                            .render(),
                    ),
            ),
            Some(old) => {
                let drift = drifted_fields(old, record);
                if !drift.is_empty() {
                    issues.push(
                        stale(format!(
                            "registry entry for '{}' is out of date ({})",
                            record.id,
                            drift.join(", ")
                        ))
                        .at(record.path.clone(), None)
                        .with_details(
                            Details::new()
                                .with(details::NODE, &record.id)
                                .with(details::PROBLEM, "drifted")
                                .with_list(details::FIELDS, &drift)
                                .render(),
                        ),
                    );
                }
            }
        }
    }

    for record in persisted.records() {
        if !fresh.contains(&record.id) {
            issues.push(
                stale(format!(
                    "registered component '{}' has no source file",
                    record.id
                ))
                .at(record.path.clone(), None)
                .with_details(
                    Details::new()
                        .with(details::NODE, &record.id)
                        .with(details::PROBLEM, "vanished")
                        .render(),
                ),
            );
        }
    }

    issues
}

fn stale(summary: String) -> Issue {
    Issue::new(IssueKind::StaleRegistry, Severity::Warning, summary)
        .with_suggestion("run `nodekeep registry build`")
}

fn drifted_fields(old: &ComponentRecord, new: &ComponentRecord) -> Vec<&'static str> {
    let mut out = Vec::new();
    if old.path != new.path {
        out.push("path");
    }
    if old.category != new.category {
        out.push("category");
    }
    if old.label != new.label {
        out.push("label");
    }
    if old.export_name != new.export_name {
        out.push("export_name");
    }
    if old.inputs != new.inputs {
        out.push("inputs");
    }
    if old.outputs != new.outputs {
        out.push("outputs");
    }
    out
}

fn now_rfc3339() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nodekeep_types::{Category, Port};

    fn record(id: &str) -> ComponentRecord {
        ComponentRecord {
            id: id.to_string(),
            file_name: format!("{id}.jsx"),
            path: format!("src/{id}.jsx"),
            absolute_path: format!("/repo/src/{id}.jsx"),
            category: Category::Input,
            label: None,
            export_name: None,
            inputs: vec![],
            outputs: vec![Port::new("out")],
            exists: true,
        }
    }

    fn registry(records: Vec<ComponentRecord>) -> Registry {
        Registry::from_records(records, "2026-01-01T00:00:00Z")
    }

    #[test]
    fn check_identical_registries_is_clean() {
        let a = registry(vec![record("catNode")]);
        assert!(check(&a, &a.clone()).is_empty());
    }

    #[test]
    fn check_ignores_absolute_path_and_timestamp() {
        let a = registry(vec![record("catNode")]);
        let mut moved = record("catNode");
        moved.absolute_path = "/elsewhere/src/catNode.jsx".into();
        let b = Registry::from_records(vec![moved], "2027-01-01T00:00:00Z");
        assert!(check(&a, &b).is_empty());
    }

    #[test]
    fn check_reports_each_kind_of_drift() {
        let persisted = registry(vec![record("catNode"), record("goneNode")]);
        let mut changed = record("catNode");
        changed.outputs.push(Port::new("extra"));
        let fresh = registry(vec![changed, record("newNode")]);

        let issues = check(&persisted, &fresh);
        assert_eq!(issues.len(), 3);
        assert!(issues.iter().all(|i| i.kind == IssueKind::StaleRegistry));
        assert!(issues.iter().all(|i| i.severity == Severity::Warning));

        let problems: Vec<String> = issues
            .iter()
            .map(|i| details::parse(&i.details)[details::PROBLEM].clone())
            .collect();
        assert_eq!(problems, vec!["drifted", "unregistered", "vanished"]);
        assert!(issues[0].summary.contains("outputs"));
    }

    #[test]
    fn load_missing_file_is_registry_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(&dir.path().join("registry.json")).unwrap_err();
        assert!(matches!(err, RegistryError::Missing { .. }));
        assert!(err.to_string().contains("registry missing"));
    }

    #[test]
    fn load_malformed_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(load(&path), Err(RegistryError::Malformed { .. })));
    }

    #[test]
    fn load_rejects_other_schema_versions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.json");
        let mut reg = registry(vec![]);
        reg.schema_version = SCHEMA_VERSION + 1;
        save(&reg, &path).unwrap();
        assert!(matches!(load(&path), Err(RegistryError::SchemaMismatch { .. })));
    }
}
