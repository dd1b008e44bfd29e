//! github
//!
//! Minimal GitHub REST client.
//!
//! # Design
//!
//! Only the endpoints this tool needs are covered:
//! - contents API (read file or directory, create/update file)
//! - branches and refs (ensure the storage branch exists)
//! - issue comments (acknowledge an issue event)
//!
//! The client never retries. Rate limiting surfaces as
//! [`GitHubError::RateLimited`] and is the caller's concern.
//!
//! # Example
//!
//! ```ignore
//! use linkcode::github::GitHubClient;
//!
//! let client = GitHubClient::new(Some(token), "octocat", "links");
//! if let Some(head) = client.branch_head("live").await? {
//!     println!("live is at {}", head);
//! }
//! ```

mod client;
mod types;

pub use client::{GitHubClient, DEFAULT_API_BASE};
pub use types::{Contents, ContentEntry, ContentFile, GitHubError, PutContents};
