//! cli
//!
//! Command-line interface layer for linkcode.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Delegate to command handlers
//! - Does NOT touch the persisted tree directly
//!
//! # Architecture
//!
//! The CLI layer is thin. It parses arguments via clap and dispatches to the
//! [`crate::engine`] for execution. Without a subcommand inside a GitHub
//! Actions job, it handles the triggering issue event.

pub mod args;
pub mod commands;

pub use args::{Cli, Command};
pub use commands::StorageOverrides;

use crate::engine;
use crate::ui::output::{self, Verbosity};
use anyhow::Result;
use clap::CommandFactory;

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();

    let ctx = engine::Context {
        cwd: cli.cwd.clone(),
        verbosity: Verbosity::from_flags(cli.quiet, cli.debug),
    };
    let overrides = StorageOverrides {
        backend: cli.backend.clone(),
        root: cli.root.clone(),
        repo: cli.repo.clone(),
    };

    let command = match cli.command {
        Some(command) => command,
        None if output::in_github_actions() => Command::Event { event_path: None },
        None => {
            Cli::command().print_help()?;
            return Ok(());
        }
    };

    commands::dispatch(command, &overrides, &ctx)
}
