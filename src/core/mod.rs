//! core
//!
//! Core domain types, schemas, and pure operations for linkcode.
//!
//! # Modules
//!
//! - [`types`] - Strong types: Code, UrlParts, ScopeMeta, counters, Record
//! - [`codec`] - Arbitrary-base numeral conversion and alphabet detection
//! - [`canon`] - URL canonicalization
//! - [`layout`] - Centralized location routing for the persisted tree
//! - [`config`] - Configuration schema and loading
//!
//! # Design Principles
//!
//! - Nothing here performs I/O except config loading
//! - Schemas are strict and self-describing
//! - Every conversion is deterministic

pub mod canon;
pub mod codec;
pub mod config;
pub mod layout;
pub mod types;
