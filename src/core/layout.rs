//! core::layout
//!
//! Centralized routing for persisted object locations.
//!
//! # Storage Layout
//!
//! Every backend stores the same tree of JSON objects:
//!
//! - `domains-meta/{hash(domainKey)}.json` - domain scope metadata
//! - `domains-counter.json` - root counter for domain ids
//! - `{domainId}/counter.json` - per-domain path/query counters
//! - `{domainId}/paths/{hash(pathKey)}.json` - path scope metadata
//! - `{domainId}/{pathId}/queries/{hash(queryKey)}.json` - query scope metadata
//! - `{domainId}/{pathId}/{queryId}/record.json` - terminal record
//!
//! **Hard rule:** no code outside this module formats a location string.
//!
//! # Example
//!
//! ```
//! use linkcode::core::layout::{KeyHasher, Layout};
//!
//! let layout = Layout::new(KeyHasher::Sha256);
//! assert_eq!(layout.domain_counter("0").as_str(), "0/counter.json");
//! assert_eq!(layout.record("0", "1", "2").as_str(), "0/1/2/record.json");
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha512};

/// Directory holding domain scope metadata.
pub const DOMAINS_META_DIR: &str = "domains-meta";

/// Root counter object.
pub const ROOT_COUNTER_FILE: &str = "domains-counter.json";

/// Per-domain counter object name.
pub const COUNTER_FILE: &str = "counter.json";

/// Terminal record object name.
pub const RECORD_FILE: &str = "record.json";

/// Extension of every data object.
pub const DATA_EXT: &str = ".json";

const PATHS_DIR: &str = "paths";
const QUERIES_DIR: &str = "queries";

/// A backend-independent object location: a relative POSIX path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Location(String);

impl Location {
    /// Build a location from segments, collapsing empty ones.
    pub fn from_segments<S: AsRef<str>>(segments: &[S]) -> Self {
        let joined = segments
            .iter()
            .map(|s| s.as_ref().trim_matches('/'))
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("/");
        Self(joined)
    }

    /// Get the location as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split into path segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }

    /// Append a child name.
    pub fn join(&self, child: &str) -> Self {
        Self::from_segments(&[self.0.as_str(), child])
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Content hash used to derive metadata locations from scope keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyHasher {
    Sha256,
    #[default]
    Sha512,
}

impl KeyHasher {
    /// Lowercase hex digest of a key.
    pub fn digest(&self, key: &str) -> String {
        match self {
            KeyHasher::Sha256 => hex::encode(Sha256::digest(key.as_bytes())),
            KeyHasher::Sha512 => hex::encode(Sha512::digest(key.as_bytes())),
        }
    }

    /// Names accepted in configuration.
    pub fn names() -> &'static [&'static str] {
        &["sha256", "sha512"]
    }
}

/// Location routing for one tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Layout {
    hasher: KeyHasher,
}

impl Layout {
    /// Create a layout using the given key hash.
    pub fn new(hasher: KeyHasher) -> Self {
        Self { hasher }
    }

    /// The key hash in use.
    pub fn hasher(&self) -> KeyHasher {
        self.hasher
    }

    /// Directory of domain metadata objects.
    pub fn domains_meta_dir(&self) -> Location {
        Location::from_segments(&[DOMAINS_META_DIR])
    }

    /// Metadata location for a domain key.
    pub fn domain_meta(&self, domain_key: &str) -> Location {
        let name = format!("{}{}", self.hasher.digest(domain_key), DATA_EXT);
        self.domains_meta_dir().join(&name)
    }

    /// Root counter location.
    pub fn root_counter(&self) -> Location {
        Location::from_segments(&[ROOT_COUNTER_FILE])
    }

    /// Counter location for a domain.
    pub fn domain_counter(&self, domain_id: &str) -> Location {
        Location::from_segments(&[domain_id, COUNTER_FILE])
    }

    /// Metadata location for a path key under a domain.
    pub fn path_meta(&self, domain_id: &str, path_key: &str) -> Location {
        let name = format!("{}{}", self.hasher.digest(path_key), DATA_EXT);
        Location::from_segments(&[domain_id, PATHS_DIR, &name])
    }

    /// Directory of query metadata objects under a domain/path.
    pub fn queries_dir(&self, domain_id: &str, path_id: &str) -> Location {
        Location::from_segments(&[domain_id, path_id, QUERIES_DIR])
    }

    /// Metadata location for a query key under a domain/path.
    pub fn query_meta(&self, domain_id: &str, path_id: &str, query_key: &str) -> Location {
        let name = format!("{}{}", self.hasher.digest(query_key), DATA_EXT);
        self.queries_dir(domain_id, path_id).join(&name)
    }

    /// Terminal record location.
    pub fn record(&self, domain_id: &str, path_id: &str, query_id: &str) -> Location {
        Location::from_segments(&[domain_id, path_id, query_id, RECORD_FILE])
    }
}

/// Whether a listed child name is a data object.
pub fn is_data_object(name: &str) -> bool {
    name.ends_with(DATA_EXT)
}
