use anyhow::{Context, Result};
use nodekeep_config::{GlobalArgs, ListArgs, RegistryArgs, RegistryCommand};
use nodekeep_extract::BestEffortExtractor;
use nodekeep_registry::BuildOptions;
use nodekeep_types::ToolInfo;

use crate::config::Settings;
use crate::render::{self, BuildView, CheckView, ListView, SkippedView};

pub(crate) fn handle(args: RegistryArgs, global: &GlobalArgs, settings: &Settings) -> Result<bool> {
    match args.command {
        RegistryCommand::Build => build(global, settings),
        RegistryCommand::Check => check(global, settings),
        RegistryCommand::List(list_args) => list(&list_args, global, settings),
    }
}

fn build_options(settings: &Settings) -> BuildOptions {
    BuildOptions {
        source_dir: settings.components_dir.clone(),
        filter: settings.filter.clone(),
    }
}

fn build(global: &GlobalArgs, settings: &Settings) -> Result<bool> {
    let outcome = nodekeep_registry::build(
        &settings.root,
        &build_options(settings),
        &BestEffortExtractor,
        &settings.registry_path,
    )?;
    let view = BuildView {
        tool: ToolInfo::default(),
        generated_at: outcome.registry.generated_at.clone(),
        registry_path: settings.registry_path.display().to_string(),
        components: outcome.registry.len(),
        by_category: outcome.registry.summary.by_category.clone(),
        skipped: outcome
            .skipped
            .into_iter()
            .map(|s| SkippedView {
                path: s.path,
                reason: s.reason,
            })
            .collect(),
    };
    render::emit(global, &view, render::build_text)?;
    Ok(true)
}

/// Drift between the persisted registry and a fresh scan fails the run.
fn check(global: &GlobalArgs, settings: &Settings) -> Result<bool> {
    let persisted = nodekeep_registry::load(&settings.registry_path)?;
    let fresh = nodekeep_registry::scan(&settings.root, &build_options(settings), &BestEffortExtractor)
        .context("Failed to scan component sources")?;
    let issues = nodekeep_registry::check(&persisted, &fresh.registry);
    let view = CheckView {
        tool: ToolInfo::default(),
        generated_at: render::now_rfc3339(),
        in_sync: issues.is_empty(),
        issues,
    };
    render::emit(global, &view, render::check_text)?;
    Ok(view.in_sync)
}

fn list(args: &ListArgs, global: &GlobalArgs, settings: &Settings) -> Result<bool> {
    let registry = nodekeep_registry::load(&settings.registry_path)?;
    let view = ListView {
        tool: ToolInfo::default(),
        generated_at: &registry.generated_at,
        components: registry
            .records()
            .filter(|r| args.category.is_none_or(|c| r.category == c))
            .collect(),
    };
    render::emit(global, &view, render::list_text)?;
    Ok(true)
}
