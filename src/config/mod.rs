//! Configuration loading and validation for the safety governor.
//!
//! Uses serde_yaml to load YAML configuration files with support for
//! environment variable overrides of the durable storage paths.

mod app;
pub(crate) mod duration;
mod error;
mod limits;
mod storage;
mod watch;

pub use app::AppConfig;
pub use error::ConfigError;
pub use limits::SafetyLimits;
pub use storage::{DEFAULT_KILL_SWITCH_FILE, DEFAULT_STATE_FILE, StorageConfig};
pub use watch::WatchConfig;

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use std::{env, fs};

/// Environment variable overriding `storage.state_file`.
pub const STATE_FILE_ENV: &str = "SAFETY_STATE_FILE";
/// Environment variable overriding `storage.kill_switch_file`.
pub const KILL_SWITCH_FILE_ENV: &str = "SAFETY_KILL_SWITCH_FILE";

const DEFAULT_WATCH_INTERVAL: Duration = Duration::from_secs(5);

/// Root configuration structure for the safety governor.
///
/// Required sections: app.
/// Optional sections: limits (defaults apply per field), storage, watch.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Application-level settings like name and environment.
    pub app: AppConfig,
    /// Safety thresholds; any omitted field keeps its conservative default.
    #[serde(default)]
    pub limits: SafetyLimits,
    /// Snapshot and kill-switch marker locations (optional).
    pub storage: Option<StorageConfig>,
    /// Watch mode polling (optional).
    pub watch: Option<WatchConfig>,
}

impl Config {
    /// Load configuration from a YAML file at the given path.
    ///
    /// First loads environment variables from `.env` file (if exists),
    /// then loads the YAML config and applies overrides:
    /// - `SAFETY_STATE_FILE`, `SAFETY_KILL_SWITCH_FILE`
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        // Load .env file if it exists (ignore error if not found)
        dotenvy::dotenv().ok();

        let content = fs::read_to_string(path)?;
        let mut config: Config = serde_yaml::from_str(&content)?;

        config.load_overrides_from_env();
        config.validate()?;

        Ok(config)
    }

    /// Like [`Config::load`], but a missing file yields the defaults.
    ///
    /// A file that exists but fails to parse or validate is still an error.
    pub fn load_or_default(path: &str) -> Result<Self, ConfigError> {
        if Path::new(path).exists() {
            return Self::load(path);
        }

        dotenvy::dotenv().ok();
        let mut config = Config::default();
        config.load_overrides_from_env();
        config.validate()?;
        Ok(config)
    }

    /// Storage settings, falling back to the defaults.
    pub fn storage(&self) -> StorageConfig {
        self.storage.clone().unwrap_or_default()
    }

    /// Poll interval for watch mode.
    pub fn watch_interval(&self) -> Duration {
        self.watch
            .as_ref()
            .map(|w| w.interval)
            .filter(|d| !d.is_zero())
            .unwrap_or(DEFAULT_WATCH_INTERVAL)
    }

    /// Apply storage path overrides from environment variables.
    fn load_overrides_from_env(&mut self) {
        let state_file = env::var(STATE_FILE_ENV).ok().filter(|v| !v.is_empty());
        let kill_switch_file = env::var(KILL_SWITCH_FILE_ENV)
            .ok()
            .filter(|v| !v.is_empty());

        if state_file.is_none() && kill_switch_file.is_none() {
            return;
        }

        let storage = self.storage.get_or_insert_with(StorageConfig::default);
        if let Some(path) = state_file {
            storage.state_file = path;
        }
        if let Some(path) = kill_switch_file {
            storage.kill_switch_file = path;
        }
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.app.name.is_empty() {
            return Err(ConfigError::invalid("app.name", "is required"));
        }

        self.limits.validate()?;

        if let Some(ref storage) = self.storage {
            if storage.state_file.is_empty() {
                return Err(ConfigError::invalid(
                    "storage.state_file",
                    "must not be empty",
                ));
            }
            if storage.kill_switch_file.is_empty() {
                return Err(ConfigError::invalid(
                    "storage.kill_switch_file",
                    "must not be empty",
                ));
            }
            if storage.state_file == storage.kill_switch_file {
                return Err(ConfigError::invalid(
                    "storage.state_file",
                    "and storage.kill_switch_file must differ",
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
