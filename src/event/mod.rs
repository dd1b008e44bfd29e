//! event
//!
//! GitHub issue-event integration.
//!
//! # Flow
//!
//! 1. Read the event payload and pull the first `http(s)://` URL out of the
//!    issue body. No URL means nothing to do.
//! 2. Canonicalize it and allocate a code against the store, with the actor
//!    as submitter and the issue number as external reference.
//! 3. Reply on the issue with the code.
//!
//! # Environment
//!
//! | Variable            | Meaning                               |
//! |---------------------|---------------------------------------|
//! | `GITHUB_EVENT_PATH` | JSON payload of the triggering event  |
//! | `GITHUB_REPOSITORY` | `owner/repo`                          |
//! | `GITHUB_ACTOR`      | login that triggered the event        |

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::core::canon::{canonicalize, CanonError, CanonicalRules};
use crate::core::codec::Codec;
use crate::core::layout::Layout;
use crate::engine::{Allocation, AllocationRequest, Allocator, Context, EngineError};
use crate::github::{GitHubClient, GitHubError};
use crate::store::ContentStore;
use crate::ui::output;

/// Errors from handling an issue event.
#[derive(Debug, Error)]
pub enum EventError {
    #[error("environment variable {0} is not set")]
    MissingEnv(&'static str),

    #[error("no GitHub token found (set GITHUB_TOKEN)")]
    MissingToken,

    #[error("failed to read event payload '{path}': {source}")]
    ReadPayload {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse event payload '{path}': {message}")]
    ParsePayload { path: PathBuf, message: String },

    #[error("event payload has no issue")]
    NoIssue,

    #[error(transparent)]
    Canon(#[from] CanonError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("failed to comment on issue #{issue}: {source}")]
    Comment { issue: u64, source: GitHubError },
}

/// The parts of an `issues` event payload that matter here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IssueEventPayload {
    #[serde(default)]
    pub issue: Option<Issue>,
}

/// An issue in an event payload.
#[derive(Debug, Clone, Deserialize)]
pub struct Issue {
    pub number: u64,
    #[serde(default)]
    pub body: Option<String>,
}

impl IssueEventPayload {
    /// Read a payload from a file.
    pub fn from_file(path: &Path) -> Result<Self, EventError> {
        let contents = std::fs::read_to_string(path).map_err(|e| EventError::ReadPayload {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&contents).map_err(|e| EventError::ParsePayload {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

/// Workflow environment of an event run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventEnv {
    pub event_path: PathBuf,
    /// `owner/repo`
    pub repository: String,
    pub actor: String,
}

impl EventEnv {
    /// Read the workflow environment. `event_path` overrides `GITHUB_EVENT_PATH`.
    pub fn from_env(event_path: Option<PathBuf>) -> Result<Self, EventError> {
        let event_path = match event_path {
            Some(path) => path,
            None => PathBuf::from(require_env("GITHUB_EVENT_PATH")?),
        };
        Ok(Self {
            event_path,
            repository: require_env("GITHUB_REPOSITORY")?,
            actor: require_env("GITHUB_ACTOR")?,
        })
    }
}

fn require_env(name: &'static str) -> Result<String, EventError> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or(EventError::MissingEnv(name))
}

/// What handling an event did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    /// The issue body held no URL.
    NoUrl { issue: u64 },
    /// A code was allocated and posted.
    Shortened {
        issue: u64,
        allocation: Allocation,
        comment_id: u64,
    },
}

/// Settings shared by every event run.
#[derive(Debug, Clone, Default)]
pub struct EventSettings {
    pub codec: Codec,
    pub layout: Layout,
    pub rules: CanonicalRules,
}

/// First `http://` or `https://` URL in `text`, ending at whitespace or `)`.
///
/// # Example
///
/// ```
/// use linkcode::event::extract_first_url;
///
/// let body = "Please shorten (https://example.com/a?b=1) thanks";
/// assert_eq!(extract_first_url(body), Some("https://example.com/a?b=1"));
/// assert_eq!(extract_first_url("no links here"), None);
/// ```
pub fn extract_first_url(text: &str) -> Option<&str> {
    // ASCII lowercasing keeps byte offsets aligned with `text`
    let lower = text.to_ascii_lowercase();
    let mut from = 0;

    while from < lower.len() {
        let start = ["http://", "https://"]
            .iter()
            .filter_map(|scheme| lower[from..].find(scheme).map(|i| (from + i, scheme.len())))
            .min_by_key(|(i, _)| *i);

        let (start, scheme_len) = start?;
        let rest = &text[start + scheme_len..];
        let end = rest
            .find(|c: char| c.is_whitespace() || c == ')')
            .unwrap_or(rest.len());
        if end > 0 {
            return Some(&text[start..start + scheme_len + end]);
        }
        from = start + scheme_len;
    }

    None
}

/// Body of the reply posted on the issue.
pub fn comment_body(code: &str, actor: &str) -> String {
    format!("Shortened: code `{}` - created by @{}", code, actor)
}

/// Handle one issue event.
///
/// # Errors
///
/// Fails if the payload has no issue, the URL is rejected, allocation
/// fails, or the reply cannot be posted.
pub async fn handle_issue_event(
    payload: &IssueEventPayload,
    actor: &str,
    store: &dyn ContentStore,
    client: &GitHubClient,
    settings: &EventSettings,
    ctx: &Context,
) -> Result<EventOutcome, EventError> {
    let issue = payload.issue.as_ref().ok_or(EventError::NoIssue)?;
    let body = issue.body.as_deref().unwrap_or_default();

    let Some(raw) = extract_first_url(body) else {
        output::print(
            format!("No URL found in issue #{}", issue.number),
            ctx.verbosity,
        );
        return Ok(EventOutcome::NoUrl {
            issue: issue.number,
        });
    };

    let canonical = canonicalize(raw, &settings.rules)?;
    output::debug(format!("canonical URL: {}", canonical), ctx.verbosity);

    let request = AllocationRequest::new(raw, &canonical, actor).with_external_ref(issue.number);
    let allocation = Allocator::new(store, settings.codec.clone(), settings.layout)
        .with_context(ctx)
        .allocate(&request)
        .await?;

    let comment_id = client
        .create_issue_comment(issue.number, &comment_body(&allocation.code, actor))
        .await
        .map_err(|source| EventError::Comment {
            issue: issue.number,
            source,
        })?;

    output::print(
        format!("Shortened {} to {}", canonical, allocation.code),
        ctx.verbosity,
    );

    Ok(EventOutcome::Shortened {
        issue: issue.number,
        allocation,
        comment_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    mod extract {
        use super::*;

        #[test]
        fn stops_at_whitespace_and_paren() {
            assert_eq!(
                extract_first_url("see https://a.com/x y"),
                Some("https://a.com/x")
            );
            assert_eq!(
                extract_first_url("[link](http://a.com/x)"),
                Some("http://a.com/x")
            );
            assert_eq!(
                extract_first_url("https://a.com/x\nmore"),
                Some("https://a.com/x")
            );
        }

        #[test]
        fn first_of_many() {
            assert_eq!(
                extract_first_url("http://first.com and https://second.com"),
                Some("http://first.com")
            );
        }

        #[test]
        fn case_insensitive_scheme() {
            assert_eq!(
                extract_first_url("HTTPS://Example.com/A"),
                Some("HTTPS://Example.com/A")
            );
        }

        #[test]
        fn skips_bare_scheme() {
            assert_eq!(
                extract_first_url("https:// then http://b.com"),
                Some("http://b.com")
            );
            assert_eq!(extract_first_url("https://"), None);
            assert_eq!(extract_first_url("ftp://a.com"), None);
        }

        #[test]
        fn non_ascii_text_around_url() {
            assert_eq!(
                extract_first_url("encurtar: https://exemplo.com/ação ok"),
                Some("https://exemplo.com/ação")
            );
        }
    }

    #[test]
    fn comment_format() {
        assert_eq!(
            comment_body("0/1/2", "octocat"),
            "Shortened: code `0/1/2` - created by @octocat"
        );
    }

    #[test]
    fn payload_parsing() {
        let payload: IssueEventPayload =
            serde_json::from_str(r#"{"action":"opened","issue":{"number":7,"body":null}}"#)
                .unwrap();
        let issue = payload.issue.unwrap();
        assert_eq!(issue.number, 7);
        assert!(issue.body.is_none());

        let payload: IssueEventPayload = serde_json::from_str(r#"{"action":"push"}"#).unwrap();
        assert!(payload.issue.is_none());
    }

    #[test]
    fn payload_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(matches!(
            IssueEventPayload::from_file(&missing),
            Err(EventError::ReadPayload { .. })
        ));

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "{").unwrap();
        assert!(matches!(
            IssueEventPayload::from_file(&bad),
            Err(EventError::ParsePayload { .. })
        ));
    }

    #[tokio::test]
    async fn no_url_is_not_an_error() {
        let store = crate::store::memory::MemoryStore::new();
        let client = GitHubClient::new(None, "o", "r");
        let payload = IssueEventPayload {
            issue: Some(Issue {
                number: 3,
                body: Some("nothing to see".into()),
            }),
        };
        let outcome = handle_issue_event(
            &payload,
            "octocat",
            &store,
            &client,
            &EventSettings::default(),
            &Context::default(),
        )
        .await
        .unwrap();
        assert_eq!(outcome, EventOutcome::NoUrl { issue: 3 });
        assert!(store.locations().is_empty());
    }

    #[tokio::test]
    async fn rejected_url_fails_before_storage() {
        let store = crate::store::memory::MemoryStore::new();
        let client = GitHubClient::new(None, "o", "r");
        let payload = IssueEventPayload {
            issue: Some(Issue {
                number: 4,
                body: Some("http://localhost:8080/admin".into()),
            }),
        };
        let err = handle_issue_event(
            &payload,
            "octocat",
            &store,
            &client,
            &EventSettings::default(),
            &Context::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, EventError::Canon(CanonError::LocalHost(_))));
        assert!(store.locations().is_empty());
    }

    #[tokio::test]
    async fn comment_failure_is_reported() {
        let store = crate::store::memory::MemoryStore::new();
        // No token: the comment is refused before any request is sent
        let client = GitHubClient::new(None, "o", "r");
        let payload = IssueEventPayload {
            issue: Some(Issue {
                number: 5,
                body: Some("https://example.com/x".into()),
            }),
        };
        let err = handle_issue_event(
            &payload,
            "octocat",
            &store,
            &client,
            &EventSettings::default(),
            &Context::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            EventError::Comment {
                issue: 5,
                source: GitHubError::AuthRequired
            }
        ));
        // The allocation itself went through
        assert!(store.get_string("0/0/0/record.json").is_some());
    }
}
