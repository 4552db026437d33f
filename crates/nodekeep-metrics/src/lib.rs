//! # nodekeep-metrics
//!
//! **Tier 3 (Metrics Store)**
//!
//! An explicit store object for per-run counts. Each [`MetricsStore::record`]
//! appends to a bounded history, updates the per-type and per-date
//! aggregates, and persists the whole document with an atomic replace.
//!
//! ## What belongs here
//! * The persisted metrics document and its aggregates
//! * Trend derivation over the history
//!
//! ## What does NOT belong here
//! * Producing the counts (use nodekeep-validate / nodekeep-fix)
//! * Rendering (use the nodekeep CLI)

pub mod trend;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use nodekeep_types::{MetricsRecord, RunCounts, TrendReport};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;

/// Metrics location relative to the repository root.
pub const DEFAULT_METRICS_PATH: &str = ".nodekeep/metrics.json";

/// History entries kept before the oldest are evicted.
pub const DEFAULT_HISTORY_CAP: usize = 100;

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("failed to read metrics {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("metrics {path} is malformed: {source}")]
    Malformed {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write metrics {path}: {message}")]
    Write { path: String, message: String },
}

/// Rolling totals for one validator type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeTotals {
    pub runs: u64,
    pub processed: u64,
    pub errors: u64,
    pub warnings: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run: Option<String>,
}

/// Rolling totals for one calendar day (UTC).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayTotals {
    pub runs: u64,
    pub errors: u64,
    pub warnings: u64,
}

/// The persisted document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsData {
    #[serde(default)]
    pub total_runs: u64,
    #[serde(default)]
    pub by_type: BTreeMap<String, TypeTotals>,
    /// Keyed by `YYYY-MM-DD`.
    #[serde(default)]
    pub by_date: BTreeMap<String, DayTotals>,
    /// Oldest first.
    #[serde(default)]
    pub history: Vec<MetricsRecord>,
}

#[derive(Debug, Clone)]
pub struct MetricsStore {
    path: PathBuf,
    history_cap: usize,
    data: MetricsData,
}

impl MetricsStore {
    /// An empty store that will persist to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            history_cap: DEFAULT_HISTORY_CAP,
            data: MetricsData::default(),
        }
    }

    /// Load `path`, or start empty if it does not exist yet.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, MetricsError> {
        let mut store = Self::new(path);
        let display = store.path.display().to_string();
        let text = match std::fs::read_to_string(&store.path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(store),
            Err(source) => return Err(MetricsError::Io { path: display, source }),
        };
        store.data = serde_json::from_str(&text)
            .map_err(|source| MetricsError::Malformed { path: display, source })?;
        Ok(store)
    }

    /// Change the history bound. Excess entries are evicted on the next
    /// record.
    pub fn with_history_cap(mut self, cap: usize) -> Self {
        self.history_cap = cap;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn history_cap(&self) -> usize {
        self.history_cap
    }

    pub fn data(&self) -> &MetricsData {
        &self.data
    }

    pub fn total_runs(&self) -> u64 {
        self.data.total_runs
    }

    pub fn by_type(&self) -> &BTreeMap<String, TypeTotals> {
        &self.data.by_type
    }

    pub fn by_date(&self) -> &BTreeMap<String, DayTotals> {
        &self.data.by_date
    }

    pub fn history(&self) -> &[MetricsRecord] {
        &self.data.history
    }

    /// Record a run now and persist.
    pub fn record(&mut self, validator: &str, counts: RunCounts) -> Result<(), MetricsError> {
        self.record_at(validator, counts, OffsetDateTime::now_utc())
    }

    /// Record a run at `at` and persist.
    pub fn record_at(
        &mut self,
        validator: &str,
        counts: RunCounts,
        at: OffsetDateTime,
    ) -> Result<(), MetricsError> {
        let timestamp = at
            .format(&Rfc3339)
            .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string());
        let day = at
            .format(format_description!("[year]-[month]-[day]"))
            .unwrap_or_else(|_| "1970-01-01".to_string());

        self.data.total_runs += 1;

        let per_type = self.data.by_type.entry(validator.to_string()).or_default();
        per_type.runs += 1;
        per_type.processed += counts.processed as u64;
        per_type.errors += counts.errors as u64;
        per_type.warnings += counts.warnings as u64;
        per_type.last_run = Some(timestamp.clone());

        let per_day = self.data.by_date.entry(day).or_default();
        per_day.runs += 1;
        per_day.errors += counts.errors as u64;
        per_day.warnings += counts.warnings as u64;

        self.data.history.push(MetricsRecord {
            timestamp,
            validator: validator.to_string(),
            summary: counts,
        });
        let excess = self.data.history.len().saturating_sub(self.history_cap);
        if excess > 0 {
            self.data.history.drain(..excess);
        }

        tracing::debug!(
            validator,
            processed = counts.processed,
            errors = counts.errors,
            warnings = counts.warnings,
            "metrics recorded"
        );
        self.save()
    }

    pub fn save(&self) -> Result<(), MetricsError> {
        let path = self.path.display().to_string();
        let json = serde_json::to_string_pretty(&self.data).map_err(|err| MetricsError::Write {
            path: path.clone(),
            message: err.to_string(),
        })?;
        nodekeep_edit::write_atomic(&self.path, json.as_bytes()).map_err(|err| {
            MetricsError::Write {
                path,
                message: format!("{err:#}"),
            }
        })
    }

    /// Trend over the whole history.
    pub fn trend(&self) -> TrendReport {
        trend::derive(&self.data.history)
    }

    /// Trend over the runs of one validator type.
    pub fn trend_for(&self, validator: &str) -> TrendReport {
        trend::derive(self.data.history.iter().filter(|r| r.validator == validator))
    }

    /// Most recent record of a validator type.
    pub fn latest(&self, validator: &str) -> Option<&MetricsRecord> {
        self.data
            .history
            .iter()
            .rev()
            .find(|r| r.validator == validator)
    }
}
