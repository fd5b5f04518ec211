//! Periodic status poller for the long-running watch mode.
//!
//! Polls the safety monitor on a fixed interval, which also drives the lazy
//! day rollover and any pending breach pause, and logs every change of the
//! trading gate or the kill switch.

mod error;
mod stats;

pub use error::WatchdogError;
pub use stats::WatchStats;

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::safety::{BotState, SafetyMonitor, SafetyStatus};

/// What the previous poll saw.
#[derive(Debug, Clone, PartialEq)]
struct Observation {
    can_trade: bool,
    block_reason: Option<String>,
    kill_switch_active: bool,
    state: BotState,
}

impl From<&SafetyStatus> for Observation {
    fn from(status: &SafetyStatus) -> Self {
        Self {
            can_trade: status.can_trade,
            block_reason: status.block_reason.clone(),
            kill_switch_active: status.kill_switch_active,
            state: status.state,
        }
    }
}

/// Watches a shared [`SafetyMonitor`] until stopped.
pub struct Watchdog {
    monitor: Arc<SafetyMonitor>,
    interval: Duration,

    // Runtime state
    started_at: Mutex<Option<Instant>>,
    running: Mutex<bool>,
    stats: Mutex<WatchStats>,
    last: Mutex<Option<Observation>>,
}

impl Watchdog {
    /// Creates a new Watchdog polling every `interval`.
    pub fn new(monitor: Arc<SafetyMonitor>, interval: Duration) -> Self {
        Self {
            monitor,
            interval,
            started_at: Mutex::new(None),
            running: Mutex::new(false),
            stats: Mutex::new(WatchStats::default()),
            last: Mutex::new(None),
        }
    }

    /// Runs the polling loop until [`Watchdog::stop`] is called.
    pub async fn start(&self) -> Result<(), WatchdogError> {
        {
            let mut running = self.running.lock().await;
            if *running {
                return Err(WatchdogError::AlreadyRunning);
            }
            *running = true;
        }

        {
            let mut started_at = self.started_at.lock().await;
            *started_at = Some(Instant::now());
        }

        info!(interval = ?self.interval, "Starting safety watchdog");

        self.run_main_loop().await
    }

    /// Stops the polling loop after the current tick.
    pub async fn stop(&self) {
        {
            let mut running = self.running.lock().await;
            if !*running {
                return;
            }
            *running = false;
        }

        let stats = self.stats().await;
        let uptime = self.uptime().await;
        info!(
            uptime = ?uptime,
            polls = stats.polls,
            blocked_polls = stats.blocked_polls,
            "Safety watchdog stopped"
        );
    }

    /// Returns a copy of the current statistics.
    pub async fn stats(&self) -> WatchStats {
        self.stats.lock().await.clone()
    }

    /// Returns true if the polling loop is active.
    pub async fn is_running(&self) -> bool {
        *self.running.lock().await
    }

    /// Returns how long the watchdog has been running.
    pub async fn uptime(&self) -> Duration {
        self.started_at
            .lock()
            .await
            .map(|s| s.elapsed())
            .unwrap_or(Duration::ZERO)
    }

    /// Polls the monitor once and logs what changed since the last poll.
    pub async fn poll(&self) -> Result<SafetyStatus, WatchdogError> {
        let monitor = Arc::clone(&self.monitor);
        let status = tokio::task::spawn_blocking(move || monitor.get_status())
            .await
            .map_err(|e| WatchdogError::Poll(e.to_string()))?;

        let current = Observation::from(&status);
        let previous = self.last.lock().await.replace(current.clone());

        let mut stats = self.stats.lock().await;
        stats.polls += 1;
        if !current.can_trade {
            stats.blocked_polls += 1;
        }

        match previous {
            None => {
                info!(
                    state = %status.state,
                    mode = %status.mode,
                    can_trade = status.can_trade,
                    block_reason = ?status.block_reason,
                    "Initial safety status"
                );
            }
            Some(ref prev) if *prev == current => {
                debug!(polls = stats.polls, "Safety status unchanged");
            }
            Some(prev) => {
                if prev.can_trade != current.can_trade || prev.block_reason != current.block_reason {
                    stats.gate_changes += 1;
                    if current.can_trade {
                        info!(state = %status.state, "Trading gate open");
                    } else {
                        warn!(
                            state = %status.state,
                            reason = ?status.block_reason,
                            "Trading gate closed"
                        );
                    }
                }

                if !prev.kill_switch_active && current.kill_switch_active {
                    stats.kill_switch_activations += 1;
                    error!(
                        reason = ?status.kill_switch_reason,
                        "Kill switch activation observed"
                    );
                } else if prev.kill_switch_active && !current.kill_switch_active {
                    info!("Kill switch cleared");
                }

                if prev.state != current.state {
                    info!(from = %prev.state, to = %current.state, "Bot state changed");
                }
            }
        }

        Ok(status)
    }

    async fn run_main_loop(&self) -> Result<(), WatchdogError> {
        let mut interval = tokio::time::interval(self.interval);

        loop {
            interval.tick().await;
            if !self.is_running().await {
                break;
            }
            if let Err(e) = self.poll().await {
                error!(error = %e, "Safety poll failed");
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
