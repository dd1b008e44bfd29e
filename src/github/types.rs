//! github::types
//!
//! Error type and REST wire types.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from GitHub API calls.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GitHubError {
    /// A write was attempted without a token.
    #[error("authentication required")]
    AuthRequired,

    /// Authentication failed (invalid token, expired, insufficient permissions).
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// The update was based on a stale blob SHA.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Rate limit exceeded.
    #[error("rate limited")]
    RateLimited,

    /// API returned an error.
    #[error("API error: {status} - {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// Network or connection error.
    #[error("network error: {0}")]
    NetworkError(String),

    /// The response body could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),
}

/// A file returned by the contents API.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentFile {
    /// Blob SHA, the version token for updates
    pub sha: String,
    /// Base64 content, wrapped at 60 columns
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub encoding: Option<String>,
}

impl ContentFile {
    /// Decode the file content.
    ///
    /// # Errors
    ///
    /// Returns [`GitHubError::Decode`] if the content is missing, uses an
    /// unknown encoding, or is not valid base64.
    pub fn decode(&self) -> Result<Vec<u8>, GitHubError> {
        match self.encoding.as_deref() {
            Some("base64") | None => {}
            Some(other) => {
                return Err(GitHubError::Decode(format!(
                    "unsupported content encoding '{}'",
                    other
                )))
            }
        }

        let content = self
            .content
            .as_deref()
            .ok_or_else(|| GitHubError::Decode("file content missing".into()))?;
        let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();

        STANDARD
            .decode(compact)
            .map_err(|e| GitHubError::Decode(e.to_string()))
    }
}

/// One entry of a directory listing.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub sha: Option<String>,
}

/// Response of `GET /repos/{owner}/{repo}/contents/{path}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Contents {
    Directory(Vec<ContentEntry>),
    File(ContentFile),
}

/// Body of `PUT /repos/{owner}/{repo}/contents/{path}`.
#[derive(Debug, Clone, Serialize)]
pub struct PutContents {
    pub message: String,
    /// Base64-encoded content
    pub content: String,
    pub branch: String,
    /// Current blob SHA; required when updating an existing file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<String>,
}

impl PutContents {
    /// Build a request body from raw bytes.
    pub fn new(
        message: impl Into<String>,
        bytes: &[u8],
        branch: impl Into<String>,
        sha: Option<String>,
    ) -> Self {
        Self {
            message: message.into(),
            content: STANDARD.encode(bytes),
            branch: branch.into(),
            sha,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct PutContentsResponse {
    pub content: PutContentsFile,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PutContentsFile {
    pub sha: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Branch {
    pub commit: BranchCommit,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BranchCommit {
    pub sha: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateRefBody<'a> {
    #[serde(rename = "ref")]
    pub git_ref: &'a str,
    pub sha: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct CommentBody<'a> {
    pub body: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Comment {
    pub id: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GitHubErrorResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_wrapped_base64() {
        let file = ContentFile {
            sha: "abc".into(),
            content: Some("eyJpZCI6\nIjAifQ==\n".into()),
            encoding: Some("base64".into()),
        };
        assert_eq!(file.decode().unwrap(), br#"{"id":"0"}"#);
    }

    #[test]
    fn decode_rejects_unknown_encoding() {
        let file = ContentFile {
            sha: "abc".into(),
            content: Some("x".into()),
            encoding: Some("none".into()),
        };
        assert!(matches!(file.decode(), Err(GitHubError::Decode(_))));
    }

    #[test]
    fn contents_untagged() {
        let file: Contents =
            serde_json::from_str(r#"{"type":"file","sha":"s","content":"e30=","encoding":"base64"}"#)
                .unwrap();
        assert!(matches!(file, Contents::File(_)));

        let dir: Contents =
            serde_json::from_str(r#"[{"name":"a.json","type":"file","sha":"s"}]"#).unwrap();
        match dir {
            Contents::Directory(entries) => assert_eq!(entries[0].name, "a.json"),
            other => panic!("expected directory, got {:?}", other),
        }
    }

    #[test]
    fn put_body_omits_missing_sha() {
        let body = PutContents::new("msg", b"{}", "live", None);
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["content"], "e30=");
        assert!(json.get("sha").is_none());

        let body = PutContents::new("msg", b"{}", "live", Some("abc".into()));
        assert_eq!(serde_json::to_value(&body).unwrap()["sha"], "abc");
    }

    #[test]
    fn error_display() {
        assert_eq!(
            GitHubError::ApiError {
                status: 422,
                message: "Validation failed".into()
            }
            .to_string(),
            "API error: 422 - Validation failed"
        );
        assert_eq!(GitHubError::RateLimited.to_string(), "rate limited");
    }
}
