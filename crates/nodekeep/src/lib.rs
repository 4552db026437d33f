//! # nodekeep
//!
//! **CLI Binary**
//!
//! Entry point for the `nodekeep` command-line application. It wires the
//! registry, validators, fix orchestrator, metrics store, and impact analyzer
//! together behind one set of subcommands.
//!
//! ## Responsibilities
//! * Parse command line arguments
//! * Resolve `nodekeep.toml` into concrete settings
//! * Dispatch commands to their handlers
//! * Map outcomes to exit codes and render errors with hints
//!
//! This crate should contain minimal business logic.

mod commands;
mod config;
mod error_hints;
mod render;

use anyhow::Result;
use clap::Parser;
use nodekeep_config::Cli;
use tracing::Level;

/// Parse the command line and run it.
///
/// `Ok(false)` means the command ran but found problems that should fail
/// the process (error-severity issues, failed fixes, registry drift).
pub fn run() -> Result<bool> {
    let cli = Cli::parse();
    init_logging(cli.global.log);
    commands::dispatch(cli)
}

/// Render an error chain plus any matching hints.
pub fn format_error(err: &anyhow::Error) -> String {
    error_hints::format(err)
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    // A second init (e.g. from tests) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
