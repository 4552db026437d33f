//! Component records and the registry document.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::SCHEMA_VERSION;

/// Component category, inferred from directory naming.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Input,
    Process,
    Output,
    Utility,
    #[default]
    Unknown,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Input,
        Category::Process,
        Category::Output,
        Category::Utility,
        Category::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Input => "input",
            Category::Process => "process",
            Category::Output => "output",
            Category::Utility => "utility",
            Category::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown category '{s}'"))
    }
}

/// A declared connection point on a component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Port {
    pub id: String,

    /// Declared upstream component identity (input ports only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upstream: Option<String>,
}

impl Port {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            upstream: None,
        }
    }

    pub fn with_upstream(mut self, upstream: impl Into<String>) -> Self {
        self.upstream = Some(upstream.into());
        self
    }
}

/// Metadata extracted from one component source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentRecord {
    /// Stable identity derived from the file name.
    pub id: String,
    pub file_name: String,
    /// Repo-relative path with `/` separators.
    pub path: String,
    pub absolute_path: String,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub export_name: Option<String>,
    #[serde(default)]
    pub inputs: Vec<Port>,
    #[serde(default)]
    pub outputs: Vec<Port>,
    /// Whether the backing file was present at build time.
    pub exists: bool,
}

impl ComponentRecord {
    pub fn input(&self, id: &str) -> Option<&Port> {
        self.inputs.iter().find(|p| p.id == id)
    }

    pub fn output(&self, id: &str) -> Option<&Port> {
        self.outputs.iter().find(|p| p.id == id)
    }

    /// Input ports whose declared upstream is `id`.
    pub fn inputs_from<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Port> + 'a {
        self.inputs
            .iter()
            .filter(move |p| p.upstream.as_deref() == Some(id))
    }
}

/// Totals for the registry document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrySummary {
    pub total: usize,
    /// Count per category name. Categories with no members are omitted.
    pub by_category: BTreeMap<String, usize>,
}

impl RegistrySummary {
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a ComponentRecord>) -> Self {
        let mut summary = RegistrySummary::default();
        for record in records {
            summary.total += 1;
            *summary
                .by_category
                .entry(record.category.as_str().to_string())
                .or_insert(0) += 1;
        }
        summary
    }
}

/// The persisted identity -> record mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registry {
    pub schema_version: u32,
    pub generated_at: String,
    pub summary: RegistrySummary,
    pub nodes: BTreeMap<String, ComponentRecord>,
}

impl Registry {
    /// Build a registry document from records. Identity uniqueness is the
    /// caller's responsibility; a repeated identity replaces the earlier record.
    pub fn from_records(records: Vec<ComponentRecord>, generated_at: impl Into<String>) -> Self {
        let nodes: BTreeMap<String, ComponentRecord> =
            records.into_iter().map(|r| (r.id.clone(), r)).collect();
        let summary = RegistrySummary::from_records(nodes.values());
        Self {
            schema_version: SCHEMA_VERSION,
            generated_at: generated_at.into(),
            summary,
            nodes,
        }
    }

    pub fn get(&self, id: &str) -> Option<&ComponentRecord> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    pub fn records(&self) -> impl Iterator<Item = &ComponentRecord> {
        self.nodes.values()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
