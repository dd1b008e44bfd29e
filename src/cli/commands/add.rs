//! cli::commands::add
//!
//! Allocate (or look up) the code for a URL.

use anyhow::{Context as _, Result};

use super::{backend_config, load_config, StorageOverrides};
use crate::core::canon::canonicalize;
use crate::engine::{AllocationRequest, Allocator, Context};
use crate::store::create_store;
use crate::ui::output;

/// Allocate a code for `url` and print it.
///
/// This is a synchronous wrapper that uses tokio to run the async implementation.
pub fn add(
    ctx: &Context,
    overrides: &StorageOverrides,
    url: &str,
    by: Option<&str>,
    issue: Option<u64>,
) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(add_async(ctx, overrides, url, by, issue))
}

async fn add_async(
    ctx: &Context,
    overrides: &StorageOverrides,
    url: &str,
    by: Option<&str>,
    issue: Option<u64>,
) -> Result<()> {
    let (config, dir) = load_config(ctx)?;

    let canonical = canonicalize(url, &config.canonical_rules())?;
    output::debug(format!("canonical URL: {}", canonical), ctx.verbosity);

    let backend = backend_config(&config, &dir, overrides)?;
    output::debug(format!("backend: {:?}", backend), ctx.verbosity);
    let store = create_store(&backend);

    let mut request = AllocationRequest::new(url, &canonical, by.unwrap_or(config.submitter()));
    if let Some(issue) = issue {
        request = request.with_external_ref(issue);
    }

    let allocation = Allocator::new(store.as_ref(), config.codec()?, config.layout())
        .with_context(ctx)
        .allocate(&request)
        .await
        .with_context(|| format!("Failed to allocate a code for {}", canonical))?;

    output::debug(
        format!(
            "domain {} path {} query {}",
            allocation.domain_id, allocation.path_id, allocation.query_id
        ),
        ctx.verbosity,
    );
    println!("{}", allocation.code);

    Ok(())
}
