pub(crate) mod completions;
pub(crate) mod impact;
pub(crate) mod registry;
pub(crate) mod trend;
pub(crate) mod validate;

use anyhow::Result;
use nodekeep_config::{Cli, Commands};

use crate::config;

/// Run one parsed command. `Ok(false)` asks for a failing exit code.
pub(crate) fn dispatch(cli: Cli) -> Result<bool> {
    let global = cli.global;
    if let Commands::Completions(args) = &cli.command {
        completions::handle(args)?;
        return Ok(true);
    }

    let settings = config::resolve(&global)?;
    tracing::debug!(root = %settings.root.display(), "settings resolved");

    match cli.command {
        Commands::Registry(args) => registry::handle(args, &global, &settings),
        Commands::Scan(args) => validate::handle_scan(args, &global, &settings),
        Commands::Report(args) => validate::handle_report(args, &global, &settings),
        Commands::Fix(args) => validate::handle_fix(args, &global, &settings),
        Commands::Impact(args) => impact::handle(args, &global, &settings),
        Commands::Trend(args) => trend::handle_trend(args, &global, &settings),
        Commands::Metrics => trend::handle_metrics(&global, &settings),
        Commands::Completions(_) => Ok(true),
    }
}
