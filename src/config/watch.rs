//! Watchdog configuration.

use serde::Deserialize;
use std::time::Duration;

use super::duration;

/// Status polling settings for the long-running watch mode.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchConfig {
    /// Interval between status polls (default: 5s).
    #[serde(default, with = "duration")]
    pub interval: Duration,
}
