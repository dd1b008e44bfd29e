//! store::traits
//!
//! ContentStore trait definition.
//!
//! # Design
//!
//! The trait is async because the remote backend performs network I/O.
//! Absence is a normal outcome: `read` returns `Ok(None)` and `list`
//! returns an empty vector for missing locations.

use async_trait::async_trait;
use thiserror::Error;

use crate::core::layout::Location;
use crate::github::GitHubError;

/// Errors from content store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A conditional write found a different version than expected.
    #[error("conflicting update at {location}: {message}")]
    Conflict {
        /// Location of the rejected write
        location: Location,
        /// Backend explanation
        message: String,
    },

    /// Filesystem failure in the local backend.
    #[error("i/o error at {location}: {source}")]
    Io {
        location: Location,
        source: std::io::Error,
    },

    /// Failure reported by the remote backend.
    #[error("remote store error at {location}: {source}")]
    Remote {
        location: Location,
        source: GitHubError,
    },

    /// The stored bytes could not be decoded.
    #[error("undecodable object at {location}: {message}")]
    Decode { location: Location, message: String },

    /// Failure injected by the in-memory store.
    #[error("injected failure at {location}: {message}")]
    Injected { location: Location, message: String },
}

impl StoreError {
    /// Whether this is a compare-and-swap rejection.
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }
}

/// Opaque version token for compare-and-swap writes.
///
/// Local store: SHA-256 of the content. GitHub store: the blob SHA.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Version(pub String);

impl Version {
    /// Get the token as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// An object read from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub version: Version,
}

/// Condition a write must satisfy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Precondition {
    /// Overwrite whatever is there.
    Any,
    /// Create only; fail if the object exists.
    Absent,
    /// Replace only the given version.
    Matches(Version),
}

/// Persistence capability used by the allocator and resolver.
///
/// Implementations must be `Send + Sync`; a single handle is reused
/// sequentially for a whole allocation.
///
/// # Errors
///
/// - `Conflict` when a [`Precondition`] is not met
/// - `Io` / `Remote` for backend failures
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Backend name (e.g., "local", "github").
    fn name(&self) -> &'static str;

    /// Read an object. Returns `Ok(None)` if it does not exist.
    async fn read(&self, location: &Location) -> Result<Option<StoredObject>, StoreError>;

    /// Create or overwrite an object.
    ///
    /// `message` describes the change; backends with history record it.
    async fn write(
        &self,
        location: &Location,
        bytes: &[u8],
        message: &str,
        precondition: Precondition,
    ) -> Result<Version, StoreError>;

    /// Names of the direct children of a location, sorted.
    async fn list(&self, prefix: &Location) -> Result<Vec<String>, StoreError>;
}
