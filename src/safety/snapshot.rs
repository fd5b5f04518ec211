//! Persisted daily snapshot and the observability status view.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{BotState, TradingMode};
use crate::config::SafetyLimits;
use crate::storage::timestamp;

/// Durable record of the monitor, rewritten on every mutation.
///
/// A process restarted mid-day must continue from these counters, so the
/// field names and meanings are a stable on-disk contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetySnapshot {
    /// Trading day the counters belong to.
    pub date: NaiveDate,
    #[serde(default)]
    pub daily_loss: f64,
    #[serde(default)]
    pub daily_profit: f64,
    #[serde(default)]
    pub daily_trades: u32,
    #[serde(default)]
    pub consecutive_losses: u32,
    pub state: BotState,
    pub mode: TradingMode,
    /// When the snapshot was written. Informational only.
    #[serde(default = "Utc::now", deserialize_with = "timestamp::deserialize")]
    pub timestamp: DateTime<Utc>,
}

impl SafetySnapshot {
    /// Rejects accumulators that could not have been produced by the monitor.
    pub fn is_consistent(&self) -> bool {
        let valid_amount = |v: f64| v.is_finite() && v >= 0.0;
        valid_amount(self.daily_loss) && valid_amount(self.daily_profit)
    }
}

/// Read-only view for dashboards and health checks. Not for decision logic.
#[derive(Debug, Clone, Serialize)]
pub struct SafetyStatus {
    pub state: BotState,
    pub mode: TradingMode,
    pub kill_switch_active: bool,
    pub kill_switch_reason: Option<String>,
    pub daily_loss: f64,
    pub daily_profit: f64,
    pub daily_trades: u32,
    pub consecutive_losses: u32,
    pub last_reset_date: NaiveDate,
    pub last_pause_reason: Option<String>,
    pub last_error: Option<String>,
    pub limits: SafetyLimits,
    pub can_trade: bool,
    pub block_reason: Option<String>,
}
