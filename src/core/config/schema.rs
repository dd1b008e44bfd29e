//! core::config::schema
//!
//! Configuration schema types.
//!
//! Global and project config files share one schema. Every field is
//! optional; unset fields fall through to the next scope and finally to the
//! defaults in [`super::Config`].
//!
//! # Validation
//!
//! Values are validated after parsing: the alphabet must be a usable
//! alphabet and the backend name must be known.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::core::canon::CanonicalRules;
use crate::core::codec::Alphabet;
use crate::core::layout::KeyHasher;

/// Contents of one config file.
///
/// # Example
///
/// ```toml
/// alphabet = "0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz"
/// hash = "sha512"
/// submitter = "local"
///
/// [storage]
/// backend = "github"
/// root = "data"
///
/// [github]
/// owner = "octocat"
/// repo = "links"
/// main_branch = "main"
/// live_branch = "live"
///
/// [canonical]
/// accepted_protocols = ["http", "https"]
/// reject_hosts = ["localhost"]
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Code alphabet
    pub alphabet: Option<String>,

    /// Hash for metadata locations
    pub hash: Option<KeyHasher>,

    /// Default submitter for CLI allocations
    pub submitter: Option<String>,

    /// Storage backend selection
    pub storage: Option<StorageConfig>,

    /// GitHub backend settings
    pub github: Option<GitHubConfig>,

    /// Canonicalization rules
    pub canonical: Option<CanonicalRules>,
}

impl FileConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(alphabet) = &self.alphabet {
            Alphabet::new(alphabet)
                .map_err(|e| ConfigError::InvalidValue(format!("alphabet: {}", e)))?;
        }

        if let Some(submitter) = &self.submitter {
            if submitter.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "submitter cannot be empty".to_string(),
                ));
            }
        }

        if let Some(storage) = &self.storage {
            storage.validate()?;
        }

        if let Some(github) = &self.github {
            github.validate()?;
        }

        Ok(())
    }
}

/// Storage backend selection.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    /// Backend name ("local" or "github")
    pub backend: Option<String>,

    /// Root directory of the local tree
    pub root: Option<PathBuf>,
}

impl StorageConfig {
    /// Validate the storage configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(backend) = &self.backend {
            let valid = crate::store::valid_backend_names();
            if !valid.contains(&backend.as_str()) {
                return Err(ConfigError::InvalidValue(format!(
                    "invalid backend '{}', must be one of: {}",
                    backend,
                    valid.join(", ")
                )));
            }
        }
        Ok(())
    }
}

/// GitHub backend settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GitHubConfig {
    /// Repository owner (user or organization)
    pub owner: Option<String>,

    /// Repository name
    pub repo: Option<String>,

    /// Branch the storage branch is created from (default: "main")
    pub main_branch: Option<String>,

    /// Storage branch (default: "live")
    pub live_branch: Option<String>,

    /// API base URL, for GitHub Enterprise
    pub api_base: Option<String>,
}

impl GitHubConfig {
    /// Validate the GitHub configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("owner", &self.owner),
            ("repo", &self.repo),
            ("main_branch", &self.main_branch),
            ("live_branch", &self.live_branch),
            ("api_base", &self.api_base),
        ];
        for (name, value) in fields {
            if let Some(value) = value {
                if value.trim().is_empty() {
                    return Err(ConfigError::InvalidValue(format!(
                        "github.{} cannot be empty",
                        name
                    )));
                }
            }
        }

        if let (Some(main), Some(live)) = (&self.main_branch, &self.live_branch) {
            if main == live {
                return Err(ConfigError::InvalidValue(format!(
                    "github.live_branch must differ from github.main_branch ('{}')",
                    main
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod file_config {
        use super::*;

        #[test]
        fn default_is_empty() {
            let config = FileConfig::default();
            assert!(config.alphabet.is_none());
            assert!(config.storage.is_none());
            assert!(config.validate().is_ok());
        }

        #[test]
        fn parse_full() {
            let toml = r#"
                alphabet = "0123456789abcdef"
                hash = "sha256"
                submitter = "bot"

                [storage]
                backend = "github"

                [github]
                owner = "octocat"
                repo = "links"

                [canonical]
                accepted_protocols = ["https"]
            "#;

            let config: FileConfig = toml::from_str(toml).unwrap();
            assert_eq!(config.hash, Some(KeyHasher::Sha256));
            assert_eq!(
                config.storage.as_ref().unwrap().backend.as_deref(),
                Some("github")
            );
            assert_eq!(
                config.canonical.as_ref().unwrap().accepted_protocols,
                vec!["https"]
            );
            // Unset rule lists keep their defaults
            assert!(config
                .canonical
                .as_ref()
                .unwrap()
                .reject_hosts
                .contains(&"localhost".to_string()));
            assert!(config.validate().is_ok());
        }

        #[test]
        fn rejects_unknown_fields() {
            let result: Result<FileConfig, _> = toml::from_str("shorten = true");
            assert!(result.is_err());

            let result: Result<FileConfig, _> = toml::from_str("[github]\ntoken = \"x\"");
            assert!(result.is_err());
        }

        #[test]
        fn rejects_duplicate_alphabet_symbols() {
            let config = FileConfig {
                alphabet: Some("0120".into()),
                ..Default::default()
            };
            assert!(matches!(
                config.validate(),
                Err(ConfigError::InvalidValue(msg)) if msg.starts_with("alphabet")
            ));
        }

        #[test]
        fn rejects_unknown_hash() {
            let result: Result<FileConfig, _> = toml::from_str("hash = \"md5\"");
            assert!(result.is_err());
        }
    }

    mod storage {
        use super::*;

        #[test]
        fn unknown_backend() {
            let config = StorageConfig {
                backend: Some("s3".into()),
                root: None,
            };
            let err = config.validate().unwrap_err();
            assert!(err.to_string().contains("local, github"));
        }
    }

    mod github {
        use super::*;

        #[test]
        fn empty_owner() {
            let config = GitHubConfig {
                owner: Some(" ".into()),
                ..Default::default()
            };
            assert!(config.validate().is_err());
        }

        #[test]
        fn same_branches() {
            let config = GitHubConfig {
                main_branch: Some("main".into()),
                live_branch: Some("main".into()),
                ..Default::default()
            };
            assert!(config.validate().is_err());
        }
    }
}
