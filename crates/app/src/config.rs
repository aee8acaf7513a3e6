//! Runtime configuration: optional TOML file, then environment and flags.
//!
//! ```toml
//! database_url = "sqlite://quiz.sqlite3"
//! require_all_answered = false
//! user = "student"
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://quiz.sqlite3";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub database_url: String,
    pub require_all_answered: bool,
    /// Signed-in user; commands that need an identity fail without one.
    pub user: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.into(),
            require_all_answered: false,
            user: None,
        }
    }
}

/// Values supplied on the command line or through the environment.
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub database_url: Option<String>,
    pub user: Option<String>,
    pub require_all_answered: bool,
}

impl AppConfig {
    /// Load the file at `path`, or defaults when no path is given.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let cfg = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "loaded config");
        Ok(cfg)
    }

    /// Layer flag and environment values over the file values.
    #[must_use]
    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        if let Some(url) = overrides.database_url {
            self.database_url = url;
        }
        if let Some(user) = overrides.user {
            self.user = Some(user);
        }
        // A flag can only switch the policy on.
        self.require_all_answered |= overrides.require_all_answered;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_path_yields_defaults() {
        let cfg = AppConfig::load(None).unwrap();
        assert_eq!(cfg, AppConfig::default());
        assert_eq!(cfg.database_url, DEFAULT_DATABASE_URL);
        assert!(!cfg.require_all_answered);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let cfg: AppConfig = toml::from_str("user = \"student\"").unwrap();
        assert_eq!(cfg.user.as_deref(), Some("student"));
        assert_eq!(cfg.database_url, DEFAULT_DATABASE_URL);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(toml::from_str::<AppConfig>("databse_url = \"x\"").is_err());
    }

    #[test]
    fn overrides_win_over_file_values() {
        let file: AppConfig = toml::from_str(
            r#"
                database_url = "sqlite://from-file.sqlite3"
                user = "file-user"
                require_all_answered = true
            "#,
        )
        .unwrap();

        let cfg = file.with_overrides(Overrides {
            database_url: Some("sqlite://flag.sqlite3".into()),
            user: None,
            require_all_answered: false,
        });

        assert_eq!(cfg.database_url, "sqlite://flag.sqlite3");
        assert_eq!(cfg.user.as_deref(), Some("file-user"));
        assert!(cfg.require_all_answered);
    }

    #[test]
    fn unreadable_file_reports_path() {
        let err = AppConfig::load(Some(Path::new("/nonexistent/quiz.toml"))).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/quiz.toml"));
    }
}
