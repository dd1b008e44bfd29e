//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! linkcode has two configuration scopes:
//! - **Global**: User-level settings
//! - **Project**: Overrides for one working directory
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Global config file
//! 3. Project config file
//! 4. CLI flags (not handled here)
//!
//! # Global Config Locations
//!
//! Searched in order:
//! 1. `$LINKCODE_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/linkcode/config.toml`
//! 3. `~/.linkcode/config.toml`
//!
//! # Project Config Location
//!
//! `.linkcode/config.toml` under the working directory.
//!
//! # Example
//!
//! ```no_run
//! use linkcode::core::config::Config;
//! use std::path::Path;
//!
//! let result = Config::load(Some(Path::new("/path/to/project"))).unwrap();
//! let config = result.config;
//!
//! println!("Alphabet: {}", config.alphabet());
//! println!("Backend: {}", config.backend().unwrap());
//! ```

pub mod schema;

pub use schema::{FileConfig, GitHubConfig, StorageConfig};

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::canon::CanonicalRules;
use crate::core::codec::{Codec, BASE62};
use crate::core::layout::{KeyHasher, Layout};
use crate::github::DEFAULT_API_BASE;
use crate::store::{BackendConfig, BackendKind};

/// Default root of the local tree, relative to the working directory.
pub const DEFAULT_STORAGE_ROOT: &str = "data";

/// Default submitter for allocations made from the command line.
pub const DEFAULT_SUBMITTER: &str = "local";

/// Environment variables searched for a GitHub token, in order.
pub const TOKEN_ENV_VARS: &[&str] = &["LINKCODE_GITHUB_TOKEN", "GITHUB_TOKEN", "INPUT_TOKEN"];

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("{0}")]
    Incomplete(String),
}

/// Warnings generated during config loading.
#[derive(Debug, Clone)]
pub struct ConfigWarning {
    /// The warning message.
    pub message: String,
    /// The path that triggered the warning.
    pub path: PathBuf,
}

/// Result of loading configuration.
#[derive(Debug)]
pub struct ConfigLoadResult {
    /// The loaded configuration.
    pub config: Config,
    /// Any warnings generated during loading.
    pub warnings: Vec<ConfigWarning>,
}

/// Merged configuration from all sources.
///
/// Accessors apply precedence: project values override global values,
/// which override defaults.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Global configuration
    pub global: FileConfig,
    /// Project configuration (if present)
    pub project: Option<FileConfig>,
    /// Path to the global config file (if loaded)
    global_path: Option<PathBuf>,
    /// Path to the project config file (if loaded)
    project_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from default locations.
    ///
    /// If `project_dir` is provided, also loads its project config.
    ///
    /// # Errors
    ///
    /// Returns an error if config files exist but cannot be parsed or hold
    /// invalid values. Missing config files are not an error.
    pub fn load(project_dir: Option<&Path>) -> Result<ConfigLoadResult, ConfigError> {
        let mut warnings = Vec::new();

        let (global, global_path) = Self::load_global(&mut warnings)?;

        let (project, project_path) = match project_dir {
            Some(dir) => Self::load_project(dir)?,
            None => (None, None),
        };

        global.validate()?;
        if let Some(ref p) = project {
            p.validate()?;
        }

        Ok(ConfigLoadResult {
            config: Config {
                global,
                project,
                global_path,
                project_path,
            },
            warnings,
        })
    }

    /// Load global configuration from standard locations.
    fn load_global(
        warnings: &mut Vec<ConfigWarning>,
    ) -> Result<(FileConfig, Option<PathBuf>), ConfigError> {
        // 1. Check $LINKCODE_CONFIG
        if let Ok(path) = std::env::var("LINKCODE_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                let config = Self::read_config(&path)?;
                return Ok((config, Some(path)));
            }
            warnings.push(ConfigWarning {
                message: "LINKCODE_CONFIG points to a missing file, ignoring it".to_string(),
                path,
            });
        }

        // 2. Check $XDG_CONFIG_HOME/linkcode/config.toml
        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("linkcode/config.toml");
            if path.exists() {
                let config = Self::read_config(&path)?;
                return Ok((config, Some(path)));
            }
        }

        // 3. Check ~/.linkcode/config.toml
        if let Some(home) = dirs::home_dir() {
            let path = home.join(".linkcode/config.toml");
            if path.exists() {
                let config = Self::read_config(&path)?;
                return Ok((config, Some(path)));
            }
        }

        Ok((FileConfig::default(), None))
    }

    /// Load project configuration.
    fn load_project(dir: &Path) -> Result<(Option<FileConfig>, Option<PathBuf>), ConfigError> {
        let path = Self::project_config_path(dir);
        if !path.exists() {
            return Ok((None, None));
        }
        let config = Self::read_config(&path)?;
        Ok((Some(config), Some(path)))
    }

    /// Read and parse a config file.
    fn read_config(path: &Path) -> Result<FileConfig, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Path of the project config file under `dir`.
    pub fn project_config_path(dir: &Path) -> PathBuf {
        dir.join(".linkcode/config.toml")
    }

    /// First value set, project scope first.
    fn pick<'a, T: ?Sized>(&'a self, field: impl Fn(&'a FileConfig) -> Option<&'a T>) -> Option<&'a T> {
        self.project
            .as_ref()
            .and_then(&field)
            .or_else(|| field(&self.global))
    }

    // =========================================================================
    // Accessor methods with precedence
    // =========================================================================

    /// The code alphabet.
    ///
    /// Defaults to base62.
    pub fn alphabet(&self) -> &str {
        self.pick(|c| c.alphabet.as_deref()).unwrap_or(BASE62)
    }

    /// Codec for the configured alphabet.
    pub fn codec(&self) -> Result<Codec, ConfigError> {
        Codec::from_symbols(self.alphabet())
            .map_err(|e| ConfigError::InvalidValue(format!("alphabet: {}", e)))
    }

    /// Hash used for metadata locations.
    ///
    /// Defaults to SHA-512.
    pub fn hasher(&self) -> KeyHasher {
        self.pick(|c| c.hash.as_ref()).copied().unwrap_or_default()
    }

    /// Location layout for the configured hash.
    pub fn layout(&self) -> Layout {
        Layout::new(self.hasher())
    }

    /// Submitter for command-line allocations.
    ///
    /// Defaults to "local".
    pub fn submitter(&self) -> &str {
        self.pick(|c| c.submitter.as_deref())
            .unwrap_or(DEFAULT_SUBMITTER)
    }

    /// Configured backend.
    ///
    /// Defaults to local.
    pub fn backend(&self) -> Result<BackendKind, ConfigError> {
        match self.pick(|c| c.storage.as_ref().and_then(|s| s.backend.as_deref())) {
            None => Ok(BackendKind::Local),
            Some(name) => BackendKind::parse(name)
                .ok_or_else(|| ConfigError::InvalidValue(format!("invalid backend '{}'", name))),
        }
    }

    /// Root of the local tree, as configured.
    ///
    /// Defaults to `data`. Relative paths are relative to the working directory.
    pub fn storage_root(&self) -> &Path {
        self.pick(|c| c.storage.as_ref().and_then(|s| s.root.as_deref()))
            .unwrap_or_else(|| Path::new(DEFAULT_STORAGE_ROOT))
    }

    /// Canonicalization rules.
    pub fn canonical_rules(&self) -> CanonicalRules {
        self.pick(|c| c.canonical.as_ref())
            .cloned()
            .unwrap_or_default()
    }

    /// GitHub repository owner.
    pub fn github_owner(&self) -> Option<&str> {
        self.pick(|c| c.github.as_ref().and_then(|g| g.owner.as_deref()))
    }

    /// GitHub repository name.
    pub fn github_repo(&self) -> Option<&str> {
        self.pick(|c| c.github.as_ref().and_then(|g| g.repo.as_deref()))
    }

    /// Branch the storage branch is created from.
    ///
    /// Defaults to "main".
    pub fn main_branch(&self) -> &str {
        self.pick(|c| c.github.as_ref().and_then(|g| g.main_branch.as_deref()))
            .unwrap_or(crate::store::github::DEFAULT_BASE_BRANCH)
    }

    /// Storage branch.
    ///
    /// Defaults to "live".
    pub fn live_branch(&self) -> &str {
        self.pick(|c| c.github.as_ref().and_then(|g| g.live_branch.as_deref()))
            .unwrap_or(crate::store::github::DEFAULT_LIVE_BRANCH)
    }

    /// GitHub API base URL.
    pub fn api_base(&self) -> &str {
        self.pick(|c| c.github.as_ref().and_then(|g| g.api_base.as_deref()))
            .unwrap_or(DEFAULT_API_BASE)
    }

    /// Build backend settings.
    ///
    /// `base_dir` anchors a relative storage root. `repository` (`owner/repo`)
    /// overrides the configured GitHub repository.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Incomplete` if the GitHub backend is selected
    /// but no repository is known.
    pub fn backend_config(
        &self,
        kind: BackendKind,
        base_dir: &Path,
        repository: Option<&str>,
        token: Option<String>,
    ) -> Result<BackendConfig, ConfigError> {
        match kind {
            BackendKind::Local => Ok(BackendConfig::Local {
                root: base_dir.join(self.storage_root()),
            }),
            BackendKind::GitHub => {
                let (owner, repo) = match repository {
                    Some(full) => parse_repository(full)?,
                    None => match (self.github_owner(), self.github_repo()) {
                        (Some(owner), Some(repo)) => (owner.to_string(), repo.to_string()),
                        _ => {
                            return Err(ConfigError::Incomplete(
                                "github backend needs [github] owner and repo, or GITHUB_REPOSITORY"
                                    .to_string(),
                            ))
                        }
                    },
                };
                Ok(BackendConfig::GitHub {
                    owner,
                    repo,
                    live_branch: self.live_branch().to_string(),
                    main_branch: self.main_branch().to_string(),
                    api_base: self.api_base().to_string(),
                    token,
                })
            }
        }
    }

    /// Get the path to the loaded global config file.
    pub fn global_config_loaded_from(&self) -> Option<&Path> {
        self.global_path.as_deref()
    }

    /// Get the path to the loaded project config file.
    pub fn project_config_loaded_from(&self) -> Option<&Path> {
        self.project_path.as_deref()
    }
}

/// Split `owner/repo`.
pub fn parse_repository(full: &str) -> Result<(String, String), ConfigError> {
    match full.trim().split_once('/') {
        Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {
            Ok((owner.to_string(), repo.to_string()))
        }
        _ => Err(ConfigError::InvalidValue(format!(
            "repository must be 'owner/repo', got '{}'",
            full
        ))),
    }
}

/// GitHub token from the environment, if any.
pub fn token_from_env() -> Option<String> {
    TOKEN_ENV_VARS
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|value| !value.trim().is_empty())
}
