//! cli::commands::list
//!
//! List every known domain scope.

use anyhow::Result;

use super::{backend_config, load_config, StorageOverrides};
use crate::engine::{Context, Resolver};
use crate::store::create_store;
use crate::ui::output;

/// Print one line per domain: id, key, creation time.
///
/// This is a synchronous wrapper that uses tokio to run the async implementation.
pub fn list(ctx: &Context, overrides: &StorageOverrides) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(list_async(ctx, overrides))
}

async fn list_async(ctx: &Context, overrides: &StorageOverrides) -> Result<()> {
    let (config, dir) = load_config(ctx)?;
    let store = create_store(&backend_config(&config, &dir, overrides)?);

    let domains = Resolver::new(store.as_ref(), config.codec()?, config.layout())
        .list_domains()
        .await?;

    if domains.is_empty() {
        output::print("No domains yet.", ctx.verbosity);
        return Ok(());
    }

    let width = domains.iter().map(|d| d.id.len()).max().unwrap_or(0);
    for domain in &domains {
        println!(
            "{:<width$}  {}  {}",
            domain.id,
            domain.key,
            domain.created_at,
            width = width
        );
    }
    Ok(())
}
