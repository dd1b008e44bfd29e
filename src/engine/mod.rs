//! engine
//!
//! Allocation and resolution of short codes over a
//! [`ContentStore`](crate::store::ContentStore).
//!
//! # Architecture
//!
//! The engine is the only code that interprets the persisted tree. It owns
//! two operations:
//!
//! 1. **Allocate**: map a canonical URL to a `domain/path/query` code,
//!    minting ids for scopes seen for the first time
//! 2. **Resolve**: walk the tree for a full or partial code
//!
//! Both are backend-agnostic. Locations come from
//! [`Layout`](crate::core::layout::Layout) and ids from
//! [`Codec`](crate::core::codec::Codec).
//!
//! # Invariants
//!
//! - A scope key, once it has metadata, always yields the same id
//! - Counters only move forward, and only through compare-and-swap writes
//! - The engine never repairs partial state; re-running an allocation
//!   completes whatever a failed run left behind
//!
//! # Example
//!
//! ```
//! use linkcode::core::codec::Codec;
//! use linkcode::core::layout::Layout;
//! use linkcode::engine::{AllocationRequest, Allocator, Resolution, Resolver};
//! use linkcode::store::memory::MemoryStore;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let store = MemoryStore::new();
//! let allocator = Allocator::new(&store, Codec::base62(), Layout::default());
//! let request = AllocationRequest::new(
//!     "https://example.com/a?x=1",
//!     "https://example.com/a?x=1",
//!     "alice",
//! );
//! let allocation = allocator.allocate(&request).await.unwrap();
//! assert_eq!(allocation.code, "0/0/0");
//!
//! let resolver = Resolver::new(&store, Codec::base62(), Layout::default());
//! match resolver.resolve("0/0/0").await.unwrap() {
//!     Resolution::Record { record, .. } => {
//!         assert_eq!(record.unwrap().canonical, "https://example.com/a?x=1")
//!     }
//!     other => panic!("unexpected {:?}", other),
//! }
//! # });
//! ```

pub mod allocator;
mod objects;
pub mod resolver;

pub use allocator::{Allocation, AllocationRequest, Allocator, MAX_CAS_ATTEMPTS};
pub use resolver::{Resolution, Resolver};

use std::path::PathBuf;

use crate::core::codec::CodecError;
use crate::core::layout::Location;
use crate::core::types::TypeError;
use crate::store::StoreError;
use crate::ui::output::Verbosity;

/// Execution context for commands.
///
/// Contains global settings derived from CLI flags.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Working directory override.
    pub cwd: Option<PathBuf>,
    /// Output verbosity.
    pub verbosity: Verbosity,
}

impl Context {
    /// The effective working directory.
    pub fn working_dir(&self) -> std::io::Result<PathBuf> {
        match &self.cwd {
            Some(cwd) => Ok(cwd.clone()),
            None => std::env::current_dir(),
        }
    }
}

/// Errors from engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The canonical URL could not be split into scope keys.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// A code did not have one to three valid segments.
    #[error("malformed code '{code}': {reason}")]
    MalformedCode { code: String, reason: String },

    /// Numeral conversion failed.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The store failed.
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),

    /// A counter kept changing under us.
    #[error("counter at {location} still contended after {attempts} attempts")]
    Conflict { location: Location, attempts: u32 },

    /// A stored object did not have the expected shape.
    #[error("corrupt object at {location}: {message}")]
    CorruptObject { location: Location, message: String },

    /// An object could not be serialized.
    #[error("failed to encode object: {0}")]
    Encode(#[from] serde_json::Error),
}

impl From<TypeError> for EngineError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::InvalidUrl(message) => EngineError::InvalidUrl(message),
            TypeError::MalformedCode { code, reason } => EngineError::MalformedCode { code, reason },
        }
    }
}
