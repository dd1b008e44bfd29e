//! linkcode - Deterministic short codes for URLs
//!
//! linkcode splits a canonical URL into (domain, path, query) and maps each
//! part to a compact id through a three-level, hash-deduplicated,
//! counter-based allocation scheme. A code is `domain/path/query`, e.g.
//! `0/1A/3`. Identical parts always map to the same id, and an id is never
//! reassigned.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to engine)
//! - [`engine`] - Allocator and resolver over a content store
//! - [`core`] - Codec, canonicalization, layout, types, and configuration
//! - [`store`] - Content store abstraction with local, GitHub, and memory backends
//! - [`github`] - Minimal GitHub REST client
//! - [`event`] - GitHub issue-event integration
//! - [`ui`] - Console output
//!
//! # Correctness Invariants
//!
//! 1. The same scope key always yields the same id
//! 2. Ids within a scope are minted in increasing order from zero
//! 3. Path and query ids are local to their domain
//! 4. Counters change only through compare-and-swap writes

pub mod cli;
pub mod core;
pub mod engine;
pub mod event;
pub mod github;
pub mod store;
pub mod ui;
