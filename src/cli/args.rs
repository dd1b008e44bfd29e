//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--cwd <path>`: Run as if in that directory
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output
//! - `--backend <local|github>`: Storage backend
//! - `--root <dir>`: Root of the local tree
//! - `--repo <owner/repo>`: Repository of the GitHub backend

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// linkcode - Deterministic short codes for URLs
#[derive(Parser, Debug)]
#[command(name = "lc")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run as if lc was started in this directory
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Storage backend (overrides config)
    #[arg(long, global = true, value_parser = ["local", "github"])]
    pub backend: Option<String>,

    /// Root directory of the local tree (overrides config)
    #[arg(long, global = true, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// GitHub repository as owner/repo (overrides config)
    #[arg(long, global = true, value_name = "OWNER/REPO")]
    pub repo: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Allocate (or look up) the code for a URL
    #[command(
        long_about = "Allocate (or look up) the code for a URL.\n\n\
            The URL is canonicalized first, so URLs that differ only in parameter \
            order, default ports, fragments, or trailing slashes get the same code.",
        after_help = "\
EXAMPLES:
    lc add https://example.com/docs?page=2
    lc add https://example.com --by alice --issue 42"
    )]
    Add {
        /// URL to shorten
        url: String,

        /// Submitter recorded with the code (default from config, else \"local\")
        #[arg(long)]
        by: Option<String>,

        /// Issue number recorded with the code
        #[arg(long)]
        issue: Option<u64>,
    },

    /// Resolve a full or partial code
    #[command(
        long_about = "Resolve a full or partial code and print the result as JSON.\n\n\
            A domain id prints its counters, domain/path lists its query scopes, \
            and domain/path/query prints the record.",
        after_help = "\
EXAMPLES:
    lc resolve 0/1/2
    lc resolve 0/1
    lc resolve 0"
    )]
    Resolve {
        /// Code with one to three segments
        code: String,
    },

    /// List every known domain
    List,

    /// Handle a GitHub issue event (run from a workflow)
    Event {
        /// Event payload file (default: $GITHUB_EVENT_PATH)
        #[arg(long, value_name = "FILE")]
        event_path: Option<PathBuf>,
    },

    /// Show which alphabets could have produced a value
    Detect {
        /// Value to examine
        value: String,

        /// Candidate alphabet, repeatable (default: decimal, hex, base36, base62)
        #[arg(long = "candidate", value_name = "ALPHABET")]
        candidates: Vec<String>,
    },
}
