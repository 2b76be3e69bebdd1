//! Configuration for the test runner.
//!
//! Settings are layered:
//! - Default values
//! - Environment variable overrides
//! - CLI argument overrides (applied by the caller)
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `TESTRUNNER_` and use double
//! underscores to separate nested levels:
//! - `TESTRUNNER_DEBOUNCE_MS=250` sets `debounce_ms`
//! - `TESTRUNNER_COMMAND='[cargo, test, --manifest-path]'` sets `command`
//! - `TESTRUNNER_LOGGING__DEFAULT=debug` sets `logging.default`

use figment::{
    Figment,
    providers::{Env, Serialized},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::watcher::WatchConfig;

const ENV_PREFIX: &str = "TESTRUNNER_";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load settings: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("Invalid setting `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Settings {
    /// Root of the source tree to watch
    #[serde(default = "default_root_dir")]
    pub root_dir: PathBuf,

    /// Extension of the files whose writes trigger a test run
    #[serde(default = "default_extension")]
    pub extension: String,

    /// How often the tree is rescanned for new directories
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Quiet period after the last change before tests run
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Test command; the changed directory is appended as the last argument
    #[serde(default = "default_command")]
    pub command: Vec<String>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LoggingConfig {
    /// Default level for all modules
    #[serde(default = "default_log_level")]
    pub default: String,

    /// Per-module level overrides, e.g. `testrunner::watcher = "debug"`
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

// Default value functions
fn default_root_dir() -> PathBuf {
    PathBuf::from(".")
}
fn default_extension() -> String {
    "go".to_string()
}
fn default_poll_interval_ms() -> u64 {
    10_000
}
fn default_debounce_ms() -> u64 {
    500
}
fn default_command() -> Vec<String> {
    vec!["go".to_string(), "test".to_string(), "-race".to_string()]
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            root_dir: default_root_dir(),
            extension: default_extension(),
            poll_interval_ms: default_poll_interval_ms(),
            debounce_ms: default_debounce_ms(),
            command: default_command(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: HashMap::new(),
        }
    }
}

impl Settings {
    /// Load settings from defaults and `TESTRUNNER_*` environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::figment().extract().map_err(|e| Box::new(e).into())
    }

    fn figment() -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(
                Env::prefixed(ENV_PREFIX).map(|key| {
                    key.as_str()
                        .to_lowercase()
                        .replace("__", ".") // Double underscore becomes dot
                        .into()
                }),
            )
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "poll_interval_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.debounce_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "debounce_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.extension.trim_start_matches('.').is_empty() {
            return Err(ConfigError::Invalid {
                field: "extension",
                reason: "must not be empty".to_string(),
            });
        }
        if self.command.is_empty() {
            return Err(ConfigError::Invalid {
                field: "command",
                reason: "must name a program".to_string(),
            });
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn debounce_delay(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Watcher configuration derived from these settings.
    pub fn watch_config(&self) -> WatchConfig {
        WatchConfig {
            root: self.root_dir.clone(),
            extension: self.extension.trim_start_matches('.').to_string(),
            poll_interval: self.poll_interval(),
        }
    }
}
