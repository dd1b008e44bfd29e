//! store
//!
//! Content store abstraction for the persisted code tree.
//!
//! # Architecture
//!
//! The `ContentStore` trait is the only way the engine touches persistence.
//! Callers obtain a store from [`create_store`] with an explicit
//! [`BackendConfig`] rather than importing a backend directly.
//!
//! # Modules
//!
//! - [`local`]: Filesystem tree under a configured root
//! - [`github`]: Files on a long-lived branch, through the GitHub contents API
//! - [`memory`]: In-memory store for deterministic testing
//! - `factory`: Backend selection and creation
//!
//! # Conditional Writes
//!
//! Every read returns a [`Version`] token. Writes carry a [`Precondition`]:
//! counters are updated with `Matches(version)` so a concurrent edit
//! surfaces as [`StoreError::Conflict`] instead of being silently discarded.
//!
//! # Example
//!
//! ```ignore
//! use linkcode::store::{create_store, BackendConfig, Precondition};
//!
//! let store = create_store(&BackendConfig::Local { root: "data".into() });
//! let loc = layout.domain_counter("0");
//! if let Some(obj) = store.read(&loc).await? {
//!     store.write(&loc, bytes, "bump", Precondition::Matches(obj.version)).await?;
//! }
//! ```

mod factory;
pub mod github;
pub mod local;
pub mod memory;
mod traits;

pub use factory::{create_store, valid_backend_names, BackendConfig, BackendKind};
pub use traits::*;
