//! cli::commands::resolve
//!
//! Resolve a full or partial code and print the result as JSON.

use anyhow::{Context as _, Result};

use super::{backend_config, load_config, StorageOverrides};
use crate::engine::{Context, Resolver};
use crate::store::create_store;

/// Resolve `code` and print pretty JSON.
///
/// This is a synchronous wrapper that uses tokio to run the async implementation.
pub fn resolve(ctx: &Context, overrides: &StorageOverrides, code: &str) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(resolve_async(ctx, overrides, code))
}

async fn resolve_async(ctx: &Context, overrides: &StorageOverrides, code: &str) -> Result<()> {
    let (config, dir) = load_config(ctx)?;
    let store = create_store(&backend_config(&config, &dir, overrides)?);

    let resolution = Resolver::new(store.as_ref(), config.codec()?, config.layout())
        .resolve(code)
        .await
        .with_context(|| format!("Failed to resolve '{}'", code))?;

    println!("{}", serde_json::to_string_pretty(&resolution)?);
    Ok(())
}
