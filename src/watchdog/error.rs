//! Watchdog error types.

/// Watchdog error type.
#[derive(Debug, thiserror::Error)]
pub enum WatchdogError {
    #[error("watchdog is already running")]
    AlreadyRunning,
    #[error("status poll failed: {0}")]
    Poll(String),
}
