//! # nodekeep-config
//!
//! **Tier 4 (Configuration)**
//!
//! CLI arguments and the `nodekeep.toml` schema.
//!
//! ## What belongs here
//! * Clap `Parser`, `Args`, `Subcommand` structs
//! * Configuration file struct definitions (Serde)
//! * Default values and enums
//!
//! ## What does NOT belong here
//! * Business logic
//! * I/O operations (except config file parsing)

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use nodekeep_types::{Category, FixStrategy};
use serde::{Deserialize, Serialize};

/// Config file looked up at the repository root when `--config` is absent.
pub const CONFIG_FILE_NAME: &str = "nodekeep.toml";

/// `nodekeep`: keeps a node-graph editor's component registry, docs, and
/// workflows consistent with its sources.
#[derive(Parser, Debug)]
#[command(name = "nodekeep", version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Repository root.
    #[arg(long, global = true, default_value = ".", value_name = "DIR")]
    pub root: PathBuf,

    /// Config file (default: `<root>/nodekeep.toml` when present).
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output format.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Also write the JSON form of the result to this file.
    #[arg(long, global = true, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Log verbosity on stderr (repeat for more: info, debug, trace).
    #[arg(short = 'v', action = clap::ArgAction::Count, global = true)]
    pub log: u8,
}

#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Build, check, or list the component registry.
    Registry(RegistryArgs),

    /// List auto-fixable issues.
    Scan(ReportArgs),

    /// Run every validator and report all issues.
    Report(ReportArgs),

    /// Apply automated fixes.
    Fix(FixArgs),

    /// Show what depends on a component and what to test.
    Impact(ImpactArgs),

    /// Show the issue trend across recorded runs.
    Trend(TrendArgs),

    /// Summarize the metrics store.
    Metrics,

    /// Generate shell completions.
    Completions(CompletionsArgs),
}

#[derive(Args, Debug, Clone)]
pub struct RegistryArgs {
    #[command(subcommand)]
    pub command: RegistryCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum RegistryCommand {
    /// Scan component sources and rewrite the registry.
    Build,

    /// Compare the persisted registry with a fresh scan.
    Check,

    /// List registered components.
    List(ListArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    /// Only components in this category.
    #[arg(long)]
    pub category: Option<Category>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ReportArgs {
    /// Print issue details.
    #[arg(long)]
    pub verbose: bool,

    /// Workflow files to validate (default: every `*.json` in the workflow directory).
    #[arg(long = "workflow", value_name = "FILE")]
    pub workflows: Vec<PathBuf>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct FixArgs {
    /// Report what would be fixed without writing anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Copy files to the backup directory before modifying them.
    #[arg(long)]
    pub backup: bool,

    /// Apply fixes whose strategy requires confirmation.
    #[arg(long)]
    pub force: bool,

    #[command(flatten)]
    pub report: ReportArgs,
}

#[derive(Args, Debug, Clone)]
pub struct ImpactArgs {
    /// Component identity, e.g. `catNode`.
    pub id: String,

    /// Workflow to recommend exercising.
    #[arg(long)]
    pub workflow: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct TrendArgs {
    /// Only runs of this validator type (`reference`, `dataflow`, `syntax`, `autofix`).
    #[arg(long = "type", value_name = "TYPE")]
    pub validator: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct CompletionsArgs {
    /// Shell to generate completions for.
    #[arg(value_enum)]
    pub shell: Shell,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Shell {
    Bash,
    Elvish,
    Fish,
    Powershell,
    Zsh,
}

// =============================================================================
// TOML Configuration File Structures
// =============================================================================

/// Root TOML configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub paths: PathsConfig,
    pub scan: ScanConfig,
    pub dataflow: DataFlowConfig,
    pub syntax: SyntaxConfig,
    pub impact: ImpactConfig,
    pub metrics: MetricsConfig,
    pub fix: FixConfig,
}

/// Where things live, relative to the root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Component source directory (default: "src").
    pub components: Option<String>,

    /// Documentation files or directories (default: ["README.md", "docs"]).
    pub docs: Option<Vec<String>>,

    /// Saved workflow directory (default: "workflows").
    pub workflows: Option<String>,

    /// Registry, metrics, and backups (default: ".nodekeep").
    pub state_dir: Option<String>,
}

/// Which files count as component sources.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Source extensions (default: ["jsx", "tsx", "js", "ts"]).
    pub extensions: Option<Vec<String>>,

    /// File stem suffix (default: "Node").
    pub suffix: Option<String>,
}

/// Recognized data-flow idioms.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataFlowConfig {
    /// Update functions whose object argument counts as a write.
    pub write_calls: Option<Vec<String>>,

    /// Hooks whose trailing array is a dependency list.
    pub recompute_hooks: Option<Vec<String>>,
}

/// External syntax checker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntaxConfig {
    /// Checker command line; the file path is appended. An empty string
    /// disables the checker and uses only the heuristic fallback.
    pub checker: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImpactConfig {
    /// Identities whose dependence raises risk to medium.
    pub critical: Option<Vec<String>>,

    /// Data-contract fields per identity.
    pub contracts: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// History entries kept (default: 100).
    pub history_cap: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixConfig {
    /// Replaces the built-in strategy catalog when present.
    pub strategies: Option<Vec<FixStrategy>>,

    /// Backup directory relative to the root (default: "<state_dir>/backups").
    pub backup_dir: Option<String>,
}

impl TomlConfig {
    /// Load configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Load configuration from a file path.
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn empty_toml_is_all_defaults() {
        assert_eq!(TomlConfig::parse("").unwrap(), TomlConfig::default());
    }
}
