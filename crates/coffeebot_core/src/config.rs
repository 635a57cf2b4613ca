//! Runtime configuration loaded from an optional TOML file.
//!
//! # Responsibility
//! - Describe storage, logging, pairing and notification settings.
//! - Fill every missing value with a working default.
//!
//! # Invariants
//! - A missing config file is not an error; defaults apply.
//! - `validate()` runs after every load and after CLI overrides.

use crate::logging::{default_log_level, normalize_level};
use crate::pairing::engine::{PairingOptions, MAX_PAIRING_TRIES};
use crate::pairing::random::{RandomSource, SeededRandom, ThreadRandom};
use crate::service::message::DEFAULT_SENDER_NAME;
use log::info;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const DEFAULT_DATABASE_FILE: &str = "coffeebot.sqlite3";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoffeebotConfig {
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
    pub pairing: PairingConfig,
    pub notify: NotifyConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    /// SQLite file holding roster, history, next pairings and outbox.
    pub database_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DATABASE_FILE),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// `trace|debug|info|warn|error`.
    pub level: String,
    /// Absolute directory for rolling log files; stderr only when unset.
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level().to_string(),
            dir: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PairingConfig {
    /// Partner draws per anchor before a repeat is accepted.
    pub max_tries: u32,
    /// Fixed seed for reproducible runs; unseeded when absent.
    pub seed: Option<u64>,
}

impl Default for PairingConfig {
    fn default() -> Self {
        Self {
            max_tries: MAX_PAIRING_TRIES,
            seed: None,
        }
    }
}

impl PairingConfig {
    pub fn options(&self) -> PairingOptions {
        PairingOptions {
            max_tries: self.max_tries,
        }
    }

    /// Builds the random source for one process run.
    pub fn random_source(&self) -> Box<dyn RandomSource> {
        match self.seed {
            Some(seed) => Box::new(SeededRandom::new(seed)),
            None => Box::new(ThreadRandom),
        }
    }
}

/// Where dispatched messages go.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotifyMode {
    /// Queue in the SQLite outbox for an external mailer.
    #[default]
    Outbox,
    /// Log only; nothing is queued.
    Log,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NotifyConfig {
    pub sender_name: String,
    pub mode: NotifyMode,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            sender_name: DEFAULT_SENDER_NAME.to_string(),
            mode: NotifyMode::default(),
        }
    }
}

/// Configuration load/validation error.
#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(toml::de::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl CoffeebotConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            info!(
                "event=config_load module=config status=default path={}",
                path.display()
            );
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&raw)?;
        info!(
            "event=config_load module=config status=ok path={}",
            path.display()
        );
        Ok(config)
    }

    /// Checks cross-field invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.database_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid(
                "storage.database_path cannot be empty".to_string(),
            ));
        }
        normalize_level(&self.logging.level).map_err(ConfigError::Invalid)?;
        if let Some(dir) = self.logging.dir.as_ref() {
            if !dir.is_absolute() {
                return Err(ConfigError::Invalid(format!(
                    "logging.dir must be an absolute path, got `{}`",
                    dir.display()
                )));
            }
        }
        if self.pairing.max_tries == 0 {
            return Err(ConfigError::Invalid(
                "pairing.max_tries must be at least 1".to_string(),
            ));
        }
        if self.notify.sender_name.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "notify.sender_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}
