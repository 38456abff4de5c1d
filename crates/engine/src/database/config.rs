//! Database configuration via `fable.toml`
//!
//! A single file selects the store backend, the retry policy of the mutation
//! driver and the game constants used by the inventory mutators. Every
//! section is optional; missing values fall back to the defaults shown in
//! [`FableConfig::default_toml`].

use crate::database::transactions::RetryConfig;
use fable_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Config file name
pub const CONFIG_FILE_NAME: &str = "fable.toml";

/// Store backend selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Ordered key/value store with a global versionstamp
    #[default]
    Kv,
    /// Striped document store with per-document revisions
    Document,
}

/// Game constants used by inventory and user mutators
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Pulls recharge up to this many
    pub max_pulls: u32,
    /// Pulls granted to a brand new inventory
    pub max_new_pulls: u32,
    /// Keys recharge up to this many; also the starting balance
    pub max_keys: u32,
    /// Minutes per recharged pull
    pub recharge_mins: i64,
    /// Minutes per recharged key
    pub recharge_keys_mins: i64,
    /// Hard cap on any consumable balance
    pub balance_cap: u32,
    /// Hours between daily token claims
    pub daily_tokens_hours: i64,
    /// Days a thief waits between steal attempts
    pub steal_cooldown_days: i64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            max_pulls: 5,
            max_new_pulls: 10,
            max_keys: 5,
            recharge_mins: 30,
            recharge_keys_mins: 10,
            balance_cap: 99,
            daily_tokens_hours: 12,
            steal_cooldown_days: 3,
        }
    }
}

/// Database configuration loaded from `fable.toml`
///
/// # Example
///
/// ```toml
/// backend = "document"
///
/// [retry]
/// max_attempts = 8
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FableConfig {
    /// Store backend
    #[serde(default)]
    pub backend: Backend,
    /// Mutation retry policy
    #[serde(default)]
    pub retry: RetryConfig,
    /// Game constants
    #[serde(default)]
    pub game: GameConfig,
}

impl FableConfig {
    /// Default configuration with a different backend
    pub fn with_backend(backend: Backend) -> Self {
        Self {
            backend,
            ..Default::default()
        }
    }

    /// Replace the retry policy
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# FableDB configuration
#
# Store backend: "kv" (default) or "document"
#   "kv"       = ordered map, one versionstamp per commit
#   "document" = striped documents, one revision per document
backend = "kv"

[retry]
# Attempts per mutation before giving up, the first one included
max_attempts = 5
# Exponential backoff between attempts, with jitter
base_delay_ms = 1
max_delay_ms = 20

[game]
max_pulls = 5
max_new_pulls = 10
max_keys = 5
recharge_mins = 30
recharge_keys_mins = 10
balance_cap = 99
daily_tokens_hours = 12
steal_cooldown_days = 3
"#
    }

    /// Parse and validate config text.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the text is not valid TOML, names an
    /// unknown backend, or fails validation.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: FableConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content).map_err(|e| match e {
            Error::Config(msg) => Error::Config(format!("{}: {}", path.display(), msg)),
            other => other,
        })
    }

    /// Write the default config file if it does not already exist.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml())?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject values the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.retry.max_attempts == 0 {
            return Err(Error::Config("retry.max_attempts must be at least 1".into()));
        }
        if self.retry.base_delay_ms > self.retry.max_delay_ms {
            return Err(Error::Config(format!(
                "retry.base_delay_ms ({}) exceeds retry.max_delay_ms ({})",
                self.retry.base_delay_ms, self.retry.max_delay_ms
            )));
        }
        if self.game.recharge_mins <= 0 || self.game.recharge_keys_mins <= 0 {
            return Err(Error::Config("recharge intervals must be positive".into()));
        }
        if self.game.daily_tokens_hours <= 0 {
            return Err(Error::Config("game.daily_tokens_hours must be positive".into()));
        }
        if self.game.steal_cooldown_days < 0 {
            return Err(Error::Config("game.steal_cooldown_days must not be negative".into()));
        }
        if self.game.max_pulls > self.game.balance_cap || self.game.max_keys > self.game.balance_cap
        {
            return Err(Error::Config("recharge caps exceed balance_cap".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_toml_parses_to_default() {
        let parsed = FableConfig::from_toml_str(FableConfig::default_toml()).unwrap();
        assert_eq!(parsed, FableConfig::default());
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let parsed = FableConfig::from_toml_str("").unwrap();
        assert_eq!(parsed.backend, Backend::Kv);
        assert_eq!(parsed.retry.max_attempts, 5);
        assert_eq!(parsed.game.max_keys, 5);
    }

    #[test]
    fn test_partial_sections() {
        let parsed = FableConfig::from_toml_str(
            "backend = \"document\"\n[retry]\nmax_attempts = 9\n",
        )
        .unwrap();
        assert_eq!(parsed.backend, Backend::Document);
        assert_eq!(parsed.retry.max_attempts, 9);
        assert_eq!(parsed.retry.max_delay_ms, RetryConfig::default().max_delay_ms);
    }

    #[test]
    fn test_unknown_backend_rejected() {
        let err = FableConfig::from_toml_str("backend = \"mongo\"").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let err = FableConfig::from_toml_str("[retry]\nmax_attempts = 0").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_inverted_delays_rejected() {
        let err = FableConfig::from_toml_str("[retry]\nbase_delay_ms = 50\nmax_delay_ms = 10")
            .unwrap_err();
        assert!(err.to_string().contains("base_delay_ms"));
    }

    #[test]
    fn test_zero_daily_interval_rejected() {
        let err = FableConfig::from_toml_str("[game]\ndaily_tokens_hours = 0").unwrap_err();
        assert!(err.to_string().contains("daily_tokens_hours"));
    }

    #[test]
    fn test_equal_delays_accepted() {
        let parsed =
            FableConfig::from_toml_str("[retry]\nbase_delay_ms = 10\nmax_delay_ms = 10").unwrap();
        assert_eq!(parsed.retry.base_delay_ms, 10);
    }

    #[test]
    fn test_write_default_then_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        FableConfig::write_default_if_missing(&path).unwrap();
        assert!(path.exists());
        assert_eq!(FableConfig::from_file(&path).unwrap(), FableConfig::default());
    }

    #[test]
    fn test_write_default_keeps_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "backend = \"document\"\n").unwrap();
        FableConfig::write_default_if_missing(&path).unwrap();
        assert_eq!(FableConfig::from_file(&path).unwrap().backend, Backend::Document);
    }

    #[test]
    fn test_write_to_file_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        let config = FableConfig::with_backend(Backend::Document)
            .with_retry(RetryConfig::new().with_max_attempts(3));
        config.write_to_file(&path).unwrap();
        assert_eq!(FableConfig::from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = FableConfig::from_file(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
