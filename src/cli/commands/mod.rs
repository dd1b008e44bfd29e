//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Loads configuration for the working directory
//! 2. Builds the store and calls the engine
//! 3. Formats and displays output
//!
//! # Async Commands
//!
//! Store access is async because the GitHub backend performs network I/O.
//! Each handler is a synchronous wrapper that runs its async implementation
//! on a tokio runtime created for the invocation.

mod add;
mod detect;
mod event;
mod list;
mod resolve;

pub use add::add;
pub use detect::detect;
pub use event::event;
pub use list::list;
pub use resolve::resolve;

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};

use super::args::Command;
use crate::core::config::{token_from_env, Config};
use crate::engine::Context;
use crate::store::{BackendConfig, BackendKind};
use crate::ui::output;

/// Storage settings given on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageOverrides {
    /// Backend name
    pub backend: Option<String>,
    /// Root of the local tree
    pub root: Option<PathBuf>,
    /// `owner/repo` of the GitHub backend
    pub repo: Option<String>,
}

/// Dispatch a parsed command to its handler.
pub fn dispatch(command: Command, overrides: &StorageOverrides, ctx: &Context) -> Result<()> {
    match command {
        Command::Add { url, by, issue } => add::add(ctx, overrides, &url, by.as_deref(), issue),
        Command::Resolve { code } => resolve::resolve(ctx, overrides, &code),
        Command::List => list::list(ctx, overrides),
        Command::Event { event_path } => event::event(ctx, event_path),
        Command::Detect { value, candidates } => detect::detect(ctx, &value, &candidates),
    }
}

/// Load configuration for the working directory, printing any warnings.
pub(crate) fn load_config(ctx: &Context) -> Result<(Config, PathBuf)> {
    let dir = ctx
        .working_dir()
        .context("Failed to determine working directory")?;
    let result = Config::load(Some(&dir)).context("Failed to load configuration")?;

    for warning in &result.warnings {
        output::warn(
            format!("{} ({})", warning.message, warning.path.display()),
            ctx.verbosity,
        );
    }
    if let Some(path) = result.config.project_config_loaded_from() {
        output::debug(format!("project config: {}", path.display()), ctx.verbosity);
    }

    Ok((result.config, dir))
}

/// Resolve backend settings from config and command-line overrides.
pub(crate) fn backend_config(
    config: &Config,
    dir: &Path,
    overrides: &StorageOverrides,
) -> Result<BackendConfig> {
    let kind = match overrides.backend.as_deref() {
        Some(name) => BackendKind::parse(name)
            .with_context(|| format!("Unknown backend '{}'", name))?,
        None => config.backend()?,
    };

    let repository = overrides
        .repo
        .clone()
        .or_else(|| std::env::var("GITHUB_REPOSITORY").ok());

    let mut backend = config.backend_config(kind, dir, repository.as_deref(), token_from_env())?;
    if let (BackendConfig::Local { root }, Some(flag_root)) = (&mut backend, &overrides.root) {
        *root = dir.join(flag_root);
    }
    Ok(backend)
}
