//! `nodekeep.toml` plus CLI flags resolved into concrete settings.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use nodekeep_config::{self as cli, CONFIG_FILE_NAME, TomlConfig};
use nodekeep_extract::DataFlowIdioms;
use nodekeep_fix::StrategyCatalog;
use nodekeep_impact::ImpactConfig;
use nodekeep_validate::CheckerCommand;
use nodekeep_walk::SourceFilter;

const DEFAULT_STATE_DIR: &str = ".nodekeep";

#[derive(Debug, Clone)]
pub(crate) struct Settings {
    pub root: PathBuf,
    pub components_dir: PathBuf,
    pub docs: Vec<PathBuf>,
    pub workflows_dir: PathBuf,
    pub registry_path: PathBuf,
    pub metrics_path: PathBuf,
    pub backup_dir: PathBuf,
    pub filter: SourceFilter,
    pub idioms: DataFlowIdioms,
    pub checker: Option<CheckerCommand>,
    pub impact: ImpactConfig,
    pub history_cap: usize,
    pub catalog: StrategyCatalog,
}

/// Read the config file named by `--config`, or `<root>/nodekeep.toml` when
/// it exists. An explicit file that cannot be read is an error.
pub(crate) fn load_toml(global: &cli::GlobalArgs) -> Result<TomlConfig> {
    let (path, explicit) = match &global.config {
        Some(path) => (path.clone(), true),
        None => (global.root.join(CONFIG_FILE_NAME), false),
    };
    if !explicit && !path.is_file() {
        return Ok(TomlConfig::default());
    }
    let config = TomlConfig::from_file(&path)
        .with_context(|| format!("Failed to load config {}", path.display()))?;
    tracing::debug!(path = %path.display(), "config loaded");
    Ok(config)
}

pub(crate) fn resolve(global: &cli::GlobalArgs) -> Result<Settings> {
    let toml = load_toml(global)?;
    resolve_with(&global.root, toml)
}

pub(crate) fn resolve_with(root: &Path, toml: TomlConfig) -> Result<Settings> {
    let state_dir = PathBuf::from(
        toml.paths
            .state_dir
            .unwrap_or_else(|| DEFAULT_STATE_DIR.to_string()),
    );

    let filter_default = SourceFilter::default();
    let filter = SourceFilter {
        extensions: toml.scan.extensions.unwrap_or(filter_default.extensions),
        suffix: toml.scan.suffix.unwrap_or(filter_default.suffix),
    };

    let idioms_default = DataFlowIdioms::default();
    let idioms = DataFlowIdioms {
        write_calls: toml
            .dataflow
            .write_calls
            .unwrap_or(idioms_default.write_calls),
        recompute_hooks: toml
            .dataflow
            .recompute_hooks
            .unwrap_or(idioms_default.recompute_hooks),
    };

    let checker = match toml.syntax.checker {
        None => Some(CheckerCommand::default()),
        Some(line) => CheckerCommand::parse(&line),
    };

    let impact_default = ImpactConfig::default();
    let mut contracts = impact_default.contracts;
    contracts.extend(toml.impact.contracts);
    let impact = ImpactConfig {
        critical: toml.impact.critical.unwrap_or(impact_default.critical),
        contracts,
    };

    let catalog = match toml.fix.strategies {
        Some(strategies) => StrategyCatalog::from_strategies(strategies)
            .context("Invalid [fix] strategies in config")?,
        None => StrategyCatalog::builtin().context("Invalid built-in strategy catalog")?,
    };

    Ok(Settings {
        root: root.to_path_buf(),
        components_dir: PathBuf::from(toml.paths.components.unwrap_or_else(|| "src".to_string())),
        docs: toml
            .paths
            .docs
            .unwrap_or_else(|| vec!["README.md".to_string(), "docs".to_string()])
            .into_iter()
            .map(PathBuf::from)
            .collect(),
        workflows_dir: PathBuf::from(
            toml.paths
                .workflows
                .unwrap_or_else(|| "workflows".to_string()),
        ),
        registry_path: root.join(&state_dir).join("registry.json"),
        metrics_path: root.join(&state_dir).join("metrics.json"),
        backup_dir: toml
            .fix
            .backup_dir
            .map_or_else(|| state_dir.join("backups"), PathBuf::from),
        filter,
        idioms,
        checker,
        impact,
        history_cap: toml
            .metrics
            .history_cap
            .unwrap_or(nodekeep_metrics::DEFAULT_HISTORY_CAP),
        catalog,
    })
}
