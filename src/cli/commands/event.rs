//! cli::commands::event
//!
//! Handle the GitHub issue event that triggered the workflow.
//!
//! The store is always the GitHub backend of the triggering repository.

use std::path::PathBuf;

use anyhow::{Context as _, Result};

use super::load_config;
use crate::core::config::{parse_repository, token_from_env};
use crate::engine::Context;
use crate::event::{handle_issue_event, EventEnv, EventError, EventSettings, IssueEventPayload};
use crate::github::GitHubClient;
use crate::store::{create_store, BackendKind};
use crate::ui::output;

/// Run the issue-event integration.
///
/// This is a synchronous wrapper that uses tokio to run the async implementation.
pub fn event(ctx: &Context, event_path: Option<PathBuf>) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(event_async(ctx, event_path))
}

async fn event_async(ctx: &Context, event_path: Option<PathBuf>) -> Result<()> {
    let env = EventEnv::from_env(event_path)?;
    let payload = IssueEventPayload::from_file(&env.event_path)?;
    let token = token_from_env().ok_or(EventError::MissingToken)?;

    let (config, dir) = load_config(ctx)?;
    let (owner, repo) = parse_repository(&env.repository)?;
    output::debug(
        format!("event for {}/{} by {}", owner, repo, env.actor),
        ctx.verbosity,
    );

    let backend = config.backend_config(
        BackendKind::GitHub,
        &dir,
        Some(env.repository.as_str()),
        Some(token.clone()),
    )?;
    let store = create_store(&backend);
    let client = GitHubClient::with_api_base(Some(token), owner, repo, config.api_base());

    let settings = EventSettings {
        codec: config.codec()?,
        layout: config.layout(),
        rules: config.canonical_rules(),
    };

    handle_issue_event(&payload, &env.actor, store.as_ref(), &client, &settings, ctx)
        .await
        .context("Failed to handle issue event")?;
    Ok(())
}
