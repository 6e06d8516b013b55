//! Inbox configuration.
//!
//! # Responsibility
//! - Describe host-tunable settings for logging, storage and the keyword
//!   classifier.
//! - Load them from TOML with defaults for every missing key.
//!
//! # Invariants
//! - A missing file section falls back to `Default`.
//! - Loading never panics; errors carry the offending path.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

const DEFAULT_SUMMARY_SENTENCES: usize = 3;
const DEFAULT_FALLBACK_CHARS: usize = 200;

/// Configuration loading error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse TOML config: {0}")]
    TomlParse(String),
    #[error("invalid config value: {0}")]
    Invalid(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InboxConfig {
    /// One of `trace|debug|info|warn|error`; build default when absent.
    pub log_level: Option<String>,
    /// Absolute directory for rolling log files; logging stays off when absent.
    pub log_dir: Option<PathBuf>,
    /// SQLite database path. When absent the host picks its own default
    /// (the `inbox` CLI uses `inbox.db` in the working directory).
    pub database_path: Option<PathBuf>,
    pub classifier: ClassifierConfig,
}

/// Keyword classifier tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Number of leading sentences kept in a summary.
    pub summary_sentences: usize,
    /// Character cap used when content has no sentence punctuation.
    pub fallback_chars: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            summary_sentences: DEFAULT_SUMMARY_SENTENCES,
            fallback_chars: DEFAULT_FALLBACK_CHARS,
        }
    }
}

impl InboxConfig {
    /// Parses configuration from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(contents).map_err(|err| ConfigError::TomlParse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Effective log level.
    pub fn effective_log_level(&self) -> &str {
        self.log_level
            .as_deref()
            .unwrap_or(crate::logging::default_log_level())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.classifier.summary_sentences == 0 {
            return Err(ConfigError::Invalid(
                "classifier.summary_sentences must be at least 1".to_string(),
            ));
        }
        if self.classifier.fallback_chars == 0 {
            return Err(ConfigError::Invalid(
                "classifier.fallback_chars must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
