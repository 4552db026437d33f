//! The fixer capability and the kind -> fixer map.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Result, bail};
use nodekeep_types::details;
use nodekeep_types::{FixResult, Issue, IssueKind};

/// One repair capability for one issue kind.
///
/// `fix` returning `Err` and returning a [`FixResult`] with `success: false`
/// are both recorded as a failed fix; neither stops the run.
pub trait Fixer {
    /// Name strategies refer to in their `fixer` field.
    fn name(&self) -> &'static str;

    fn kind(&self) -> IssueKind;

    fn fix(&self, issue: &Issue) -> Result<FixResult>;

    /// Repo-relative files `fix` may modify, for backups.
    fn targets(&self, issue: &Issue) -> Vec<PathBuf> {
        issue.file.iter().map(PathBuf::from).collect()
    }
}

/// Registered fixers, one per issue kind.
#[derive(Default)]
pub struct FixerRegistry {
    by_kind: BTreeMap<IssueKind, Box<dyn Fixer>>,
}

impl std::fmt::Debug for FixerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.by_kind.iter().map(|(k, v)| (k, v.name())))
            .finish()
    }
}

impl FixerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fixer, replacing any earlier one for the same kind.
    pub fn register(&mut self, fixer: Box<dyn Fixer>) {
        self.by_kind.insert(fixer.kind(), fixer);
    }

    pub fn with(mut self, fixer: Box<dyn Fixer>) -> Self {
        self.register(fixer);
        self
    }

    pub fn get(&self, kind: IssueKind) -> Option<&dyn Fixer> {
        self.by_kind.get(&kind).map(|f| f.as_ref())
    }

    pub fn len(&self) -> usize {
        self.by_kind.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_kind.is_empty()
    }
}

/// Parsed issue details with typed accessors for fixers.
pub(crate) struct IssueInputs {
    map: BTreeMap<String, String>,
}

impl IssueInputs {
    pub(crate) fn of(issue: &Issue) -> Self {
        Self {
            map: details::parse(&issue.details),
        }
    }

    pub(crate) fn get(&self, key: &str) -> Option<&str> {
        self.map.get(key).map(String::as_str).filter(|v| !v.is_empty())
    }

    pub(crate) fn require(&self, key: &str) -> Result<&str> {
        match self.get(key) {
            Some(v) => Ok(v),
            None => bail!("issue details have no '{key}'"),
        }
    }

    pub(crate) fn list(&self, key: &str) -> Result<Vec<String>> {
        let items = details::split_list(self.require(key)?);
        if items.is_empty() {
            bail!("issue details list no '{key}'");
        }
        Ok(items)
    }
}
