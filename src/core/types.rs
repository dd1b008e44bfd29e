//! core::types
//!
//! Domain types shared by the allocator, resolver, and stores.
//!
//! # Types
//!
//! - [`UtcTimestamp`] - RFC3339 timestamp
//! - [`UrlParts`] - The (domain, path, query) keys of a canonical URL
//! - [`Code`] - A full or partial `domain/path/query` code
//! - [`ScopeMeta`] - Deduplication record for one scope key
//! - [`DomainCounter`] / [`RootCounter`] - Persisted id counters
//! - [`Record`] - Terminal record for a fully resolved URL
//!
//! The persisted JSON field names are fixed by the on-disk layout and are
//! shared with trees written by earlier tools, so several fields are renamed
//! to camelCase explicitly.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Separator between the segments of a code.
pub const CODE_DELIMITER: char = '/';

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("malformed code '{code}': {reason}")]
    MalformedCode { code: String, reason: String },
}

/// An RFC3339 timestamp in UTC.
///
/// # Example
///
/// ```
/// use linkcode::core::types::UtcTimestamp;
///
/// let now = UtcTimestamp::now();
/// println!("Current time: {}", now);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UtcTimestamp(chrono::DateTime<chrono::Utc>);

impl UtcTimestamp {
    /// Create a timestamp for the current moment.
    pub fn now() -> Self {
        Self(chrono::Utc::now())
    }

    /// Create a timestamp from a chrono DateTime.
    pub fn from_datetime(dt: chrono::DateTime<chrono::Utc>) -> Self {
        Self(dt)
    }

    /// Get the underlying datetime.
    pub fn as_datetime(&self) -> &chrono::DateTime<chrono::Utc> {
        &self.0
    }
}

impl std::fmt::Display for UtcTimestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

/// The three scope keys of a canonical URL.
///
/// - `domain`: `scheme://host[:port]`
/// - `path`: the pathname, `/` when empty
/// - `query`: the query string including its leading `?`, or empty
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlParts {
    pub domain: String,
    pub path: String,
    pub query: String,
}

impl UrlParts {
    /// Split a canonical URL into its scope keys.
    ///
    /// # Example
    ///
    /// ```
    /// use linkcode::core::types::UrlParts;
    ///
    /// let parts = UrlParts::from_canonical("https://example.com:8443/a/b?x=1").unwrap();
    /// assert_eq!(parts.domain, "https://example.com:8443");
    /// assert_eq!(parts.path, "/a/b");
    /// assert_eq!(parts.query, "?x=1");
    /// ```
    pub fn from_canonical(canonical: &str) -> Result<Self, TypeError> {
        let url = Url::parse(canonical).map_err(|e| TypeError::InvalidUrl(e.to_string()))?;

        let host = url
            .host_str()
            .ok_or_else(|| TypeError::InvalidUrl(format!("no host in '{}'", canonical)))?;

        let domain = match url.port() {
            Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
            None => format!("{}://{}", url.scheme(), host),
        };

        let path = match url.path() {
            "" => "/".to_string(),
            p => p.to_string(),
        };

        let query = match url.query() {
            Some(q) if !q.is_empty() => format!("?{}", q),
            _ => String::new(),
        };

        Ok(Self {
            domain,
            path,
            query,
        })
    }
}

/// A full or partial code: one to three id segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Code {
    /// `{domainId}`
    Domain { domain: String },
    /// `{domainId}/{pathId}`
    Path { domain: String, path: String },
    /// `{domainId}/{pathId}/{queryId}`
    Full {
        domain: String,
        path: String,
        query: String,
    },
}

impl Code {
    /// Parse a code, ignoring empty segments.
    ///
    /// # Example
    ///
    /// ```
    /// use linkcode::core::types::Code;
    ///
    /// assert!(matches!(Code::parse("0/1/2").unwrap(), Code::Full { .. }));
    /// assert!(matches!(Code::parse("/0/").unwrap(), Code::Domain { .. }));
    /// assert!(Code::parse("0/1/2/3").is_err());
    /// assert!(Code::parse("").is_err());
    /// ```
    pub fn parse(code: &str) -> Result<Self, TypeError> {
        let segments: Vec<&str> = code
            .split(CODE_DELIMITER)
            .filter(|s| !s.is_empty())
            .collect();

        for seg in &segments {
            if seg.starts_with('.') || seg.contains('\\') {
                return Err(TypeError::MalformedCode {
                    code: code.to_string(),
                    reason: format!("invalid segment '{}'", seg),
                });
            }
        }

        match segments.as_slice() {
            [d] => Ok(Code::Domain {
                domain: d.to_string(),
            }),
            [d, p] => Ok(Code::Path {
                domain: d.to_string(),
                path: p.to_string(),
            }),
            [d, p, q] => Ok(Code::Full {
                domain: d.to_string(),
                path: p.to_string(),
                query: q.to_string(),
            }),
            other => Err(TypeError::MalformedCode {
                code: code.to_string(),
                reason: format!("expected 1 to 3 segments, found {}", other.len()),
            }),
        }
    }

    /// Compose a full code from its three ids.
    pub fn full(domain: &str, path: &str, query: &str) -> String {
        format!(
            "{}{}{}{}{}",
            domain, CODE_DELIMITER, path, CODE_DELIMITER, query
        )
    }
}

impl std::fmt::Display for Code {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Code::Domain { domain } => write!(f, "{}", domain),
            Code::Path { domain, path } => write!(f, "{}{}{}", domain, CODE_DELIMITER, path),
            Code::Full {
                domain,
                path,
                query,
            } => write!(f, "{}", Code::full(domain, path, query)),
        }
    }
}

/// Scope level within the hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeLevel {
    Domain,
    Path,
    Query,
}

impl std::fmt::Display for ScopeLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScopeLevel::Domain => write!(f, "domain"),
            ScopeLevel::Path => write!(f, "path"),
            ScopeLevel::Query => write!(f, "query"),
        }
    }
}

/// Metadata stored at a hash-derived location for each scope key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeMeta {
    /// Rendered id
    pub id: String,
    /// The scope key that was hashed
    pub key: String,
    pub created_at: UtcTimestamp,
}

impl ScopeMeta {
    /// Create metadata stamped with the current time.
    pub fn new(id: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            key: key.into(),
            created_at: UtcTimestamp::now(),
        }
    }
}

/// Per-domain id counters.
///
/// The query counter is shared by every path of the domain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainCounter {
    #[serde(rename = "nextPath", default)]
    pub next_path: u64,
    #[serde(rename = "nextQuery", default)]
    pub next_query: u64,
}

impl DomainCounter {
    /// Take the next path number, advancing the counter.
    pub fn take_path(&mut self) -> u64 {
        let n = self.next_path;
        self.next_path += 1;
        n
    }

    /// Take the next query number, advancing the counter.
    pub fn take_query(&mut self) -> u64 {
        let n = self.next_query;
        self.next_query += 1;
        n
    }
}

/// Top-level counter from which domain ids are minted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootCounter {
    #[serde(rename = "nextDomain", default)]
    pub next_domain: u64,
}

impl RootCounter {
    /// Take the next domain number, advancing the counter.
    pub fn take_domain(&mut self) -> u64 {
        let n = self.next_domain;
        self.next_domain += 1;
        n
    }
}

/// Terminal record for a fully resolved (domain, path, query) triple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// URL as submitted, before canonicalization
    pub original: String,
    pub canonical: String,
    /// Submitter identity
    pub by: String,
    /// External reference, e.g. the issue number that requested the code
    pub issue: Option<u64>,
    pub created_at: UtcTimestamp,
}
