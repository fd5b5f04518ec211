//! Runtime statistics for the watchdog.

/// Runtime statistics for the watchdog.
#[derive(Debug, Clone, Default)]
pub struct WatchStats {
    pub polls: u64,
    pub blocked_polls: u64,
    pub gate_changes: u64,
    pub kill_switch_activations: u64,
}
