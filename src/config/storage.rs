//! Durable storage locations.

use serde::Deserialize;

pub const DEFAULT_STATE_FILE: &str = "safety_state.json";
pub const DEFAULT_KILL_SWITCH_FILE: &str = "KILL_SWITCH.lock";

/// Where the daily snapshot and the kill-switch marker live.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the persisted safety snapshot (JSON).
    #[serde(default = "default_state_file")]
    pub state_file: String,
    /// Path to the kill-switch marker. Its presence means "kill switch active".
    #[serde(default = "default_kill_switch_file")]
    pub kill_switch_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_file: default_state_file(),
            kill_switch_file: default_kill_switch_file(),
        }
    }
}

fn default_state_file() -> String {
    DEFAULT_STATE_FILE.to_string()
}

fn default_kill_switch_file() -> String {
    DEFAULT_KILL_SWITCH_FILE.to_string()
}
