//! Structured issue details.
//!
//! Validators render details as `key: value` lines; fixers recover their
//! inputs by parsing the same text back. Keys are lower-case, values are
//! single-line. List values are comma separated.

use std::collections::BTreeMap;
use std::fmt::Display;

pub const FILE: &str = "file";
pub const FIELDS: &str = "fields";
pub const NODE: &str = "node";
pub const CONSUMER: &str = "consumer";
pub const REFERENCE: &str = "reference";
pub const WORKFLOW: &str = "workflow";
pub const EDGE: &str = "edge";
pub const PROBLEM: &str = "problem";
pub const EXPECTED: &str = "expected";
pub const SOURCE: &str = "source";

/// Builder for a details block.
#[derive(Debug, Clone, Default)]
pub struct Details {
    entries: Vec<(String, String)>,
}

impl Details {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl Display) -> Self {
        let value = value.to_string().replace(['\n', '\r'], " ");
        self.entries.push((key.to_ascii_lowercase(), value));
        self
    }

    pub fn with_list<S: AsRef<str>>(self, key: &str, values: &[S]) -> Self {
        let joined = values
            .iter()
            .map(|v| v.as_ref())
            .collect::<Vec<_>>()
            .join(", ");
        self.with(key, joined)
    }

    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(|(k, v)| format!("{k}: {v}"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Parse `key: value` lines. Lines without a colon are ignored; a repeated
/// key keeps its first value.
pub fn parse(text: &str) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    for line in text.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim().to_ascii_lowercase();
        if key.is_empty() || key.contains(char::is_whitespace) {
            continue;
        }
        out.entry(key).or_insert_with(|| value.trim().to_string());
    }
    out
}

/// Split a comma-separated list value, dropping empty items.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
