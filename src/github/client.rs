//! github::client
//!
//! HTTP client for the GitHub REST endpoints used by the store and the
//! issue-event integration.
//!
//! # Authentication
//!
//! A static token is passed in by the caller. Without a token, reads of
//! public repositories still work; every write fails with
//! [`GitHubError::AuthRequired`] before any request is sent.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;

use super::types::{
    Branch, Comment, CommentBody, Contents, CreateRefBody, GitHubError, GitHubErrorResponse,
    PutContents, PutContentsResponse,
};

/// Default GitHub API base URL.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Bytes escaped in a contents path segment: everything outside the
/// unreserved set, so `?`, `#` and `%` stay inside the path.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// User-Agent header value for API requests.
const USER_AGENT_VALUE: &str = "linkcode-cli";

/// GitHub REST client scoped to one repository.
#[derive(Clone)]
pub struct GitHubClient {
    /// HTTP client for making requests
    client: Client,
    /// Bearer token
    token: Option<String>,
    /// Repository owner (user or organization)
    owner: String,
    /// Repository name
    repo: String,
    /// API base URL (configurable for GitHub Enterprise and tests)
    api_base: String,
}

// Custom Debug to avoid exposing the token
impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("has_token", &self.token.is_some())
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl GitHubClient {
    /// Create a client for `owner/repo` on github.com.
    pub fn new(token: Option<String>, owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self::with_api_base(token, owner, repo, DEFAULT_API_BASE)
    }

    /// Create a client with a custom API base URL.
    pub fn with_api_base(
        token: Option<String>,
        owner: impl Into<String>,
        repo: impl Into<String>,
        api_base: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            token,
            owner: owner.into(),
            repo: repo.into(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }

    /// Get the repository owner.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Get the repository name.
    pub fn repo(&self) -> &str {
        &self.repo
    }

    /// Whether a token is configured.
    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Build common headers for API requests.
    fn headers(&self) -> Result<HeaderMap, GitHubError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = &self.token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| GitHubError::AuthFailed("token contains invalid characters".into()))?;
            headers.insert(AUTHORIZATION, value);
        }
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        Ok(headers)
    }

    /// Headers for a mutating request; requires a token.
    fn write_headers(&self) -> Result<HeaderMap, GitHubError> {
        if self.token.is_none() {
            return Err(GitHubError::AuthRequired);
        }
        self.headers()
    }

    /// Build URL for a repository endpoint.
    fn repo_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.api_base, self.owner, self.repo, path
        )
    }

    /// Build URL for a file under `contents/`, escaping each path segment.
    fn contents_url(&self, path: &str) -> String {
        let escaped: Vec<String> = path
            .split('/')
            .map(|segment| utf8_percent_encode(segment, PATH_SEGMENT).to_string())
            .collect();
        self.repo_url(&format!("contents/{}", escaped.join("/")))
    }

    /// Handle API response, mapping errors appropriately.
    async fn handle_response<T: DeserializeOwned>(response: Response) -> Result<T, GitHubError> {
        let status = response.status();

        if status.is_success() {
            response
                .json()
                .await
                .map_err(|e| GitHubError::Decode(format!("failed to parse response: {}", e)))
        } else {
            Self::handle_error_response(response, status).await
        }
    }

    /// Handle an error response from the API.
    async fn handle_error_response<T>(
        response: Response,
        status: StatusCode,
    ) -> Result<T, GitHubError> {
        let rate_limited = response
            .headers()
            .get("x-ratelimit-remaining")
            .and_then(|v| v.to_str().ok())
            .map(|v| v == "0")
            .unwrap_or(false);

        // Try to get error message from body
        let message = match response.json::<GitHubErrorResponse>().await {
            Ok(err) => err.message,
            Err(_) => "Unknown error".to_string(),
        };

        Err(match status {
            StatusCode::UNAUTHORIZED => GitHubError::AuthFailed("Invalid or expired token".into()),
            StatusCode::FORBIDDEN if rate_limited => GitHubError::RateLimited,
            StatusCode::FORBIDDEN => GitHubError::AuthFailed(format!("Permission denied: {}", message)),
            StatusCode::NOT_FOUND => GitHubError::NotFound(message),
            StatusCode::CONFLICT => GitHubError::Conflict(message),
            // Updating an existing file without its sha is a lost race, not bad input
            StatusCode::UNPROCESSABLE_ENTITY if message.contains("sha") => {
                GitHubError::Conflict(message)
            }
            StatusCode::TOO_MANY_REQUESTS => GitHubError::RateLimited,
            _ if status.is_server_error() => GitHubError::ApiError {
                status: status.as_u16(),
                message: format!("GitHub server error: {}", message),
            },
            _ => GitHubError::ApiError {
                status: status.as_u16(),
                message,
            },
        })
    }

    /// Read a file or directory at `path` on `git_ref`.
    ///
    /// Returns `Ok(None)` on 404.
    pub async fn get_contents(
        &self,
        path: &str,
        git_ref: &str,
    ) -> Result<Option<Contents>, GitHubError> {
        let url = self.contents_url(path);

        let response = self
            .client
            .get(&url)
            .query(&[("ref", git_ref)])
            .headers(self.headers()?)
            .send()
            .await
            .map_err(|e| GitHubError::NetworkError(e.to_string()))?;

        match Self::handle_response(response).await {
            Ok(contents) => Ok(Some(contents)),
            Err(GitHubError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Create or update a file. Returns the new blob SHA.
    pub async fn put_contents(&self, path: &str, body: &PutContents) -> Result<String, GitHubError> {
        let url = self.contents_url(path);

        let response = self
            .client
            .put(&url)
            .headers(self.write_headers()?)
            .json(body)
            .send()
            .await
            .map_err(|e| GitHubError::NetworkError(e.to_string()))?;

        let result: PutContentsResponse = Self::handle_response(response).await?;
        Ok(result.content.sha)
    }

    /// Head commit SHA of a branch, or `None` if the branch does not exist.
    pub async fn branch_head(&self, branch: &str) -> Result<Option<String>, GitHubError> {
        let url = self.repo_url(&format!("branches/{}", branch));

        let response = self
            .client
            .get(&url)
            .headers(self.headers()?)
            .send()
            .await
            .map_err(|e| GitHubError::NetworkError(e.to_string()))?;

        match Self::handle_response::<Branch>(response).await {
            Ok(branch) => Ok(Some(branch.commit.sha)),
            Err(GitHubError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Create `refs/heads/{branch}` at `sha`.
    ///
    /// A branch created concurrently by someone else counts as success.
    pub async fn create_branch(&self, branch: &str, sha: &str) -> Result<(), GitHubError> {
        let url = self.repo_url("git/refs");
        let git_ref = format!("refs/heads/{}", branch);

        let response = self
            .client
            .post(&url)
            .headers(self.write_headers()?)
            .json(&CreateRefBody {
                git_ref: &git_ref,
                sha,
            })
            .send()
            .await
            .map_err(|e| GitHubError::NetworkError(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        match Self::handle_error_response::<()>(response, status).await {
            Err(GitHubError::ApiError { status: 422, message })
                if message.contains("already exists") =>
            {
                Ok(())
            }
            other => other,
        }
    }

    /// Post a comment on an issue. Returns the comment id.
    pub async fn create_issue_comment(&self, issue: u64, body: &str) -> Result<u64, GitHubError> {
        let url = self.repo_url(&format!("issues/{}/comments", issue));

        let response = self
            .client
            .post(&url)
            .headers(self.write_headers()?)
            .json(&CommentBody { body })
            .send()
            .await
            .map_err(|e| GitHubError::NetworkError(e.to_string()))?;

        let comment: Comment = Self::handle_response(response).await?;
        Ok(comment.id)
    }
}
