//! store::factory
//!
//! Backend selection and creation.
//!
//! # Design
//!
//! Commands use [`create_store`] instead of constructing a backend directly.
//! The backend is chosen by an explicit [`BackendConfig`] built from
//! configuration and flags; there is no ambient global deciding it.
//!
//! # Example
//!
//! ```
//! use linkcode::store::{create_store, BackendConfig};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let store = create_store(&BackendConfig::Local { root: dir.path().into() });
//! assert_eq!(store.name(), "local");
//! ```

use std::path::PathBuf;

use super::github::GitHubStore;
use super::local::LocalStore;
use super::traits::ContentStore;
use crate::github::GitHubClient;

/// Supported storage backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Filesystem tree under a root directory
    Local,
    /// Files on a branch of a GitHub repository
    GitHub,
}

impl BackendKind {
    /// All backends.
    pub fn all() -> &'static [BackendKind] {
        &[BackendKind::Local, BackendKind::GitHub]
    }

    /// The backend name as used in configuration files and flags.
    pub fn name(&self) -> &'static str {
        match self {
            BackendKind::Local => "local",
            BackendKind::GitHub => "github",
        }
    }

    /// Parse a backend name.
    ///
    /// # Example
    ///
    /// ```
    /// use linkcode::store::BackendKind;
    ///
    /// assert_eq!(BackendKind::parse("GitHub"), Some(BackendKind::GitHub));
    /// assert_eq!(BackendKind::parse("s3"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "local" => Some(BackendKind::Local),
            "github" => Some(BackendKind::GitHub),
            _ => None,
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Fully resolved backend settings.
#[derive(Clone, PartialEq, Eq)]
pub enum BackendConfig {
    /// Local tree rooted at `root`.
    Local { root: PathBuf },
    /// GitHub repository branch.
    GitHub {
        owner: String,
        repo: String,
        /// Branch holding the tree
        live_branch: String,
        /// Branch the tree branch is created from
        main_branch: String,
        api_base: String,
        token: Option<String>,
    },
}

// Custom Debug to avoid exposing the token
impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendConfig::Local { root } => f.debug_struct("Local").field("root", root).finish(),
            BackendConfig::GitHub {
                owner,
                repo,
                live_branch,
                main_branch,
                api_base,
                token,
            } => f
                .debug_struct("GitHub")
                .field("owner", owner)
                .field("repo", repo)
                .field("live_branch", live_branch)
                .field("main_branch", main_branch)
                .field("api_base", api_base)
                .field("has_token", &token.is_some())
                .finish(),
        }
    }
}

impl BackendConfig {
    /// Which backend this configures.
    pub fn kind(&self) -> BackendKind {
        match self {
            BackendConfig::Local { .. } => BackendKind::Local,
            BackendConfig::GitHub { .. } => BackendKind::GitHub,
        }
    }
}

/// Create a content store for the given backend settings.
pub fn create_store(config: &BackendConfig) -> Box<dyn ContentStore> {
    match config {
        BackendConfig::Local { root } => Box::new(LocalStore::new(root.clone())),
        BackendConfig::GitHub {
            owner,
            repo,
            live_branch,
            main_branch,
            api_base,
            token,
        } => {
            let client =
                GitHubClient::with_api_base(token.clone(), owner.clone(), repo.clone(), api_base.clone());
            Box::new(GitHubStore::new(client, live_branch.clone(), main_branch.clone()))
        }
    }
}

/// Backend names accepted in configuration.
pub fn valid_backend_names() -> Vec<&'static str> {
    BackendKind::all().iter().map(|k| k.name()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::DEFAULT_API_BASE;

    #[test]
    fn names_roundtrip() {
        for kind in BackendKind::all() {
            assert_eq!(BackendKind::parse(kind.name()), Some(*kind));
        }
        assert_eq!(valid_backend_names(), vec!["local", "github"]);
    }

    #[test]
    fn creates_github_store() {
        let config = BackendConfig::GitHub {
            owner: "o".into(),
            repo: "r".into(),
            live_branch: "live".into(),
            main_branch: "main".into(),
            api_base: DEFAULT_API_BASE.into(),
            token: Some("secret-token".into()),
        };
        assert_eq!(config.kind(), BackendKind::GitHub);
        assert_eq!(create_store(&config).name(), "github");
        assert!(!format!("{:?}", config).contains("secret-token"));
    }

    #[test]
    fn creates_local_store() {
        let config = BackendConfig::Local {
            root: PathBuf::from("data"),
        };
        assert_eq!(create_store(&config).name(), "local");
    }
}
