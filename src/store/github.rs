//! store::github
//!
//! Content store on a dedicated branch of a GitHub repository.
//!
//! # Design
//!
//! Every location is a file path inside the storage branch (default `live`).
//! Reads go through `GET contents/{path}?ref={branch}`; writes go through
//! `PUT contents/{path}` with a commit message, so the branch history is an
//! audit log of every allocation.
//!
//! Version tokens are blob SHAs. A `Matches` write sends the token as `sha`;
//! GitHub rejects it if the file moved on, which surfaces as
//! [`StoreError::Conflict`].
//!
//! # Branch Bootstrap
//!
//! Before the first write the storage branch must exist. If it does not, it
//! is created from the head of the base branch (default `main`).

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use super::traits::{ContentStore, Precondition, StoreError, StoredObject, Version};
use crate::core::layout::Location;
use crate::github::{Contents, GitHubClient, GitHubError, PutContents};

/// Default storage branch.
pub const DEFAULT_LIVE_BRANCH: &str = "live";

/// Default base branch the storage branch is created from.
pub const DEFAULT_BASE_BRANCH: &str = "main";

/// Content store backed by the GitHub contents API.
#[derive(Debug)]
pub struct GitHubStore {
    client: GitHubClient,
    /// Branch holding the tree
    branch: String,
    /// Branch the storage branch is created from
    base_branch: String,
    /// Set once the storage branch is known to exist
    branch_ready: AtomicBool,
}

impl GitHubStore {
    /// Create a store on `branch`, bootstrapped from `base_branch`.
    pub fn new(
        client: GitHubClient,
        branch: impl Into<String>,
        base_branch: impl Into<String>,
    ) -> Self {
        Self {
            client,
            branch: branch.into(),
            base_branch: base_branch.into(),
            branch_ready: AtomicBool::new(false),
        }
    }

    /// The storage branch.
    pub fn branch(&self) -> &str {
        &self.branch
    }

    /// The underlying client.
    pub fn client(&self) -> &GitHubClient {
        &self.client
    }

    fn remote_err(location: &Location) -> impl FnOnce(GitHubError) -> StoreError + '_ {
        move |source| match source {
            GitHubError::Conflict(message) => StoreError::Conflict {
                location: location.clone(),
                message,
            },
            source => StoreError::Remote {
                location: location.clone(),
                source,
            },
        }
    }

    /// Make sure the storage branch exists, creating it from the base branch.
    pub async fn ensure_branch(&self) -> Result<(), StoreError> {
        if self.branch_ready.load(Ordering::Acquire) {
            return Ok(());
        }

        let here = Location::from_segments(&[self.branch.as_str()]);
        let exists = self
            .client
            .branch_head(&self.branch)
            .await
            .map_err(Self::remote_err(&here))?
            .is_some();

        if !exists {
            let base = self
                .client
                .branch_head(&self.base_branch)
                .await
                .map_err(Self::remote_err(&here))?
                .ok_or_else(|| StoreError::Remote {
                    location: here.clone(),
                    source: GitHubError::NotFound(format!(
                        "base branch '{}' does not exist",
                        self.base_branch
                    )),
                })?;
            self.client
                .create_branch(&self.branch, &base)
                .await
                .map_err(Self::remote_err(&here))?;
        }

        self.branch_ready.store(true, Ordering::Release);
        Ok(())
    }

    async fn current_sha(&self, location: &Location) -> Result<Option<String>, StoreError> {
        match self
            .client
            .get_contents(location.as_str(), &self.branch)
            .await
            .map_err(Self::remote_err(location))?
        {
            Some(Contents::File(file)) => Ok(Some(file.sha)),
            Some(Contents::Directory(_)) => Err(StoreError::Decode {
                location: location.clone(),
                message: "expected a file, found a directory".into(),
            }),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl ContentStore for GitHubStore {
    fn name(&self) -> &'static str {
        "github"
    }

    async fn read(&self, location: &Location) -> Result<Option<StoredObject>, StoreError> {
        let contents = self
            .client
            .get_contents(location.as_str(), &self.branch)
            .await
            .map_err(Self::remote_err(location))?;

        match contents {
            Some(Contents::File(file)) => {
                let bytes = file.decode().map_err(|e| StoreError::Decode {
                    location: location.clone(),
                    message: e.to_string(),
                })?;
                Ok(Some(StoredObject {
                    bytes,
                    version: Version(file.sha),
                }))
            }
            // A directory at an object location reads as absent
            Some(Contents::Directory(_)) | None => Ok(None),
        }
    }

    async fn write(
        &self,
        location: &Location,
        bytes: &[u8],
        message: &str,
        precondition: Precondition,
    ) -> Result<Version, StoreError> {
        self.ensure_branch().await?;

        let sha = match precondition {
            Precondition::Matches(version) => Some(version.0),
            Precondition::Absent => None,
            Precondition::Any => self.current_sha(location).await?,
        };

        let body = PutContents::new(message, bytes, &self.branch, sha);
        let new_sha = self
            .client
            .put_contents(location.as_str(), &body)
            .await
            .map_err(Self::remote_err(location))?;

        Ok(Version(new_sha))
    }

    async fn list(&self, prefix: &Location) -> Result<Vec<String>, StoreError> {
        let contents = self
            .client
            .get_contents(prefix.as_str(), &self.branch)
            .await
            .map_err(Self::remote_err(prefix))?;

        let mut names = match contents {
            Some(Contents::Directory(entries)) => {
                entries.into_iter().map(|e| e.name).collect::<Vec<_>>()
            }
            Some(Contents::File(_)) | None => Vec::new(),
        };
        names.sort();
        Ok(names)
    }
}
