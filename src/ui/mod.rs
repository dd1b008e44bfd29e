//! ui
//!
//! User-facing output.
//!
//! # Modules
//!
//! - [`output`] - Verbosity-aware printing and GitHub Actions annotations
//!
//! # Design
//!
//! All console output goes through this module so `--quiet` and `--debug`
//! behave the same in every command.

pub mod output;
