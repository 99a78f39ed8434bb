//! Session configuration.

use crate::store::AccessPolicy;
use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, instrument};

/// Configuration for a [`GameSessionController`](crate::GameSessionController).
///
/// Every field has a default, so an empty TOML file is a valid config.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Field of the data share holding the game snapshot.
    #[serde(default = "default_state_key")]
    state_key: String,

    /// Access policy used when writing the snapshot.
    #[serde(default)]
    access: AccessPolicy,

    /// Players allowed in one share; a join that overshoots is undone.
    #[serde(default = "default_max_players")]
    max_players: usize,

    /// Extra attempts a forfeit makes after losing a compare-and-set.
    #[serde(default = "default_max_forfeit_retries")]
    max_forfeit_retries: u32,
}

#[instrument]
fn default_state_key() -> String {
    "game-state".to_string()
}

#[instrument]
fn default_max_players() -> usize {
    2
}

#[instrument]
fn default_max_forfeit_retries() -> u32 {
    8
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            state_key: default_state_key(),
            access: AccessPolicy::default(),
            max_players: default_max_players(),
            max_forfeit_retries: default_max_forfeit_retries(),
        }
    }
}

impl SessionConfig {
    /// Returns a copy with a different forfeit retry budget.
    pub fn with_max_forfeit_retries(mut self, retries: u32) -> Self {
        self.max_forfeit_retries = retries;
        self
    }

    /// Loads configuration from TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;

        let config = Self::from_toml(&content)?;
        info!(
            state_key = %config.state_key,
            access = %config.access,
            max_players = config.max_players,
            "Config loaded successfully"
        );
        Ok(config)
    }

    /// Parses configuration from a TOML string.
    #[instrument(skip(content))]
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;
        if config.max_players < 2 {
            return Err(ConfigError::new(format!(
                "max_players must be at least 2, got {}",
                config.max_players
            )));
        }
        if config.state_key.is_empty() {
            return Err(ConfigError::new("state_key must not be empty".to_string()));
        }
        Ok(config)
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = SessionConfig::from_toml("").unwrap();
        assert_eq!(config, SessionConfig::default());
        assert_eq!(config.state_key(), "game-state");
        assert_eq!(*config.access(), AccessPolicy::PublicReadAndWrite);
        assert_eq!(*config.max_players(), 2);
        assert_eq!(*config.max_forfeit_retries(), 8);
    }

    #[test]
    fn test_overrides() {
        let config = SessionConfig::from_toml(
            "state_key = \"ttt\"\naccess = \"public-read-only\"\nmax_forfeit_retries = 1\n",
        )
        .unwrap();
        assert_eq!(config.state_key(), "ttt");
        assert_eq!(*config.access(), AccessPolicy::PublicReadOnly);
        assert_eq!(*config.max_forfeit_retries(), 1);
    }

    #[test]
    fn test_rejects_single_player() {
        let err = SessionConfig::from_toml("max_players = 1").unwrap_err();
        assert!(err.message.contains("max_players"));
        assert!(err.file.ends_with("config.rs"));
    }

    #[test]
    fn test_rejects_bad_toml() {
        assert!(SessionConfig::from_toml("max_players = \"two\"").is_err());
    }
}
