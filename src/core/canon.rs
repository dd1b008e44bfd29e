//! core::canon
//!
//! URL canonicalization.
//!
//! Two URLs that differ only in parameter order, default ports, fragments,
//! duplicate slashes, or a trailing slash canonicalize to the same string, so
//! they resolve to the same code. Local and loopback hosts are rejected.
//!
//! # Example
//!
//! ```
//! use linkcode::core::canon::{canonicalize, CanonicalRules};
//!
//! let rules = CanonicalRules::default();
//! let a = canonicalize("https://example.com:443//foo/?b=2&a=1#top", &rules).unwrap();
//! assert_eq!(a, "https://example.com/foo?a=1&b=2");
//! ```

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::{Host, Url};

/// Bytes escaped in query keys and values: everything but ASCII
/// alphanumerics and `- _ . ! ~ * ' ( )`.
const QUERY_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Errors from canonicalization.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CanonError {
    #[error("URL is empty")]
    Empty,

    #[error("invalid URL '{url}': {reason}")]
    Invalid { url: String, reason: String },

    #[error("protocol not allowed: {0}")]
    ProtocolNotAllowed(String),

    #[error("local host not allowed: {0}")]
    LocalHost(String),
}

/// Rules applied during canonicalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CanonicalRules {
    /// Schemes accepted, lowercase
    pub accepted_protocols: Vec<String>,
    /// Hosts rejected outright, lowercase
    pub reject_hosts: Vec<String>,
}

impl Default for CanonicalRules {
    fn default() -> Self {
        Self {
            accepted_protocols: vec!["http".into(), "https".into(), "ftp".into()],
            reject_hosts: vec!["localhost".into(), "127.0.0.1".into(), "::1".into()],
        }
    }
}

impl CanonicalRules {
    fn is_local_host(&self, url: &Url) -> bool {
        match url.host() {
            Some(Host::Ipv6(addr)) => {
                addr.is_loopback() || self.reject_hosts.contains(&addr.to_string())
            }
            Some(Host::Ipv4(_)) => true,
            Some(Host::Domain(domain)) => {
                let host = domain.to_lowercase();
                self.reject_hosts.contains(&host)
                    || host.ends_with(".local")
                    || host.starts_with("localhost")
                    || host.chars().all(|c| c.is_ascii_digit() || c == '.')
            }
            None => false,
        }
    }
}

/// Canonicalize a raw URL.
///
/// # Errors
///
/// - [`CanonError::Empty`] for blank input
/// - [`CanonError::Invalid`] if the URL cannot be parsed or has no host
/// - [`CanonError::ProtocolNotAllowed`] for schemes outside the rules
/// - [`CanonError::LocalHost`] for local or loopback hosts
pub fn canonicalize(raw: &str, rules: &CanonicalRules) -> Result<String, CanonError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(CanonError::Empty);
    }

    let invalid = |reason: String| CanonError::Invalid {
        url: raw.to_string(),
        reason,
    };

    let mut url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;

    let scheme = url.scheme().to_lowercase();
    if !rules.accepted_protocols.contains(&scheme) {
        return Err(CanonError::ProtocolNotAllowed(scheme));
    }

    let host = url
        .host_str()
        .map(str::to_string)
        .ok_or_else(|| invalid("missing host".into()))?;
    if rules.is_local_host(&url) {
        return Err(CanonError::LocalHost(host));
    }

    // Default ports are already dropped by the parser.
    match (scheme.as_str(), url.port()) {
        ("http", Some(443)) => {
            url.set_scheme("https")
                .map_err(|_| invalid("cannot switch to https".into()))?;
            url.set_port(None)
                .map_err(|_| invalid("cannot clear port".into()))?;
        }
        ("https", Some(80)) => {
            url.set_port(None)
                .map_err(|_| invalid("cannot clear port".into()))?;
        }
        _ => {}
    }

    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    params.sort_by(|a, b| a.0.cmp(&b.0));
    if params.is_empty() {
        url.set_query(None);
    } else {
        let query: Vec<String> = params
            .iter()
            .map(|(k, v)| {
                format!(
                    "{}={}",
                    utf8_percent_encode(k, QUERY_COMPONENT),
                    utf8_percent_encode(v, QUERY_COMPONENT)
                )
            })
            .collect();
        url.set_query(Some(&query.join("&")));
    }

    url.set_fragment(None);

    let path = normalize_path(url.path());
    url.set_path(&path);

    Ok(url.to_string())
}

/// Collapse repeated slashes and strip a trailing slash, keeping the root.
fn normalize_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    for c in path.chars() {
        if c == '/' && out.ends_with('/') {
            continue;
        }
        out.push(c);
    }
    if out.len() > 1 && out.ends_with('/') {
        out.pop();
    }
    if out.is_empty() {
        out.push('/');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canon(raw: &str) -> Result<String, CanonError> {
        canonicalize(raw, &CanonicalRules::default())
    }

    #[test]
    fn sorts_query_parameters() {
        assert_eq!(
            canon("https://example.com/foo?b=2&a=1").unwrap(),
            canon("https://example.com/foo?a=1&b=2").unwrap()
        );
        assert_eq!(
            canon("https://example.com/foo?b=2&a=1").unwrap(),
            "https://example.com/foo?a=1&b=2"
        );
    }

    #[test]
    fn sort_is_stable_for_repeated_keys() {
        assert_eq!(
            canon("https://example.com/?a=2&z=0&a=1").unwrap(),
            "https://example.com/?a=2&a=1&z=0"
        );
    }

    #[test]
    fn query_escaping_leaves_marks_alone() {
        assert_eq!(
            canon("https://example.com/?q=a b&m=!*()~-_.").unwrap(),
            "https://example.com/?m=!*()~-_.&q=a%20b"
        );
        assert_eq!(
            canon("https://example.com/?q=a+b").unwrap(),
            "https://example.com/?q=a%20b"
        );
        assert_eq!(
            canon("https://example.com/?k%26=v%3D1").unwrap(),
            "https://example.com/?k%26=v%3D1"
        );
    }

    #[test]
    fn single_quote_is_escaped_in_query() {
        let once = canon("https://example.com/?q=it's").unwrap();
        assert_eq!(once, "https://example.com/?q=it%27s");
        assert_eq!(canon(&once).unwrap(), once);
    }

    #[test]
    fn strips_fragment_and_empty_query() {
        assert_eq!(
            canon("https://example.com/page?#section").unwrap(),
            "https://example.com/page"
        );
    }

    #[test]
    fn normalizes_path() {
        assert_eq!(
            canon("https://example.com//a///b/").unwrap(),
            "https://example.com/a/b"
        );
        assert_eq!(canon("https://example.com").unwrap(), "https://example.com/");
    }

    #[test]
    fn lowercases_scheme_and_host() {
        assert_eq!(
            canon("HTTPS://Example.COM/Path").unwrap(),
            "https://example.com/Path"
        );
    }

    #[test]
    fn drops_default_ports() {
        assert_eq!(
            canon("https://example.com:443/x").unwrap(),
            "https://example.com/x"
        );
        assert_eq!(canon("http://example.com:80/x").unwrap(), "http://example.com/x");
        assert_eq!(
            canon("http://example.com:8080/x").unwrap(),
            "http://example.com:8080/x"
        );
    }

    #[test]
    fn fixes_swapped_ports() {
        assert_eq!(
            canon("http://example.com:443/x").unwrap(),
            "https://example.com/x"
        );
        assert_eq!(canon("https://example.com:80/x").unwrap(), "https://example.com/x");
    }

    #[test]
    fn rejects_local_hosts() {
        for raw in [
            "http://localhost/",
            "http://localhost.localdomain/",
            "http://127.0.0.1/",
            "http://10.0.0.1/",
            "http://[::1]/",
            "http://printer.local/",
        ] {
            assert!(
                matches!(canon(raw), Err(CanonError::LocalHost(_))),
                "expected {} to be rejected",
                raw
            );
        }
    }

    #[test]
    fn rejects_protocols() {
        assert_eq!(
            canon("file:///etc/passwd"),
            Err(CanonError::ProtocolNotAllowed("file".into()))
        );
        assert!(matches!(
            canon("mailto:someone@example.com"),
            Err(CanonError::ProtocolNotAllowed(_))
        ));
    }

    #[test]
    fn rejects_empty_and_garbage() {
        assert_eq!(canon("   "), Err(CanonError::Empty));
        assert!(matches!(canon("not a url"), Err(CanonError::Invalid { .. })));
    }

    #[test]
    fn idempotent() {
        let once = canon("http://Example.com:443//a/?z=1&y=2#f").unwrap();
        assert_eq!(canon(&once).unwrap(), once);
    }

    #[test]
    fn custom_rules() {
        let rules = CanonicalRules {
            accepted_protocols: vec!["https".into()],
            reject_hosts: vec!["blocked.example".into()],
        };
        assert!(canonicalize("http://example.com", &rules).is_err());
        assert!(matches!(
            canonicalize("https://blocked.example/", &rules),
            Err(CanonError::LocalHost(_))
        ));
    }
}
