//! Absolute safety limits for live trading.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{ConfigError, duration};

/// Numeric thresholds enforced by the safety monitor.
///
/// Limits are fixed for the lifetime of a process; changing them requires a
/// restart. Every cap is inclusive on the blocking side: a counter that
/// reaches its cap blocks trading, so a cap of zero never allows a trade.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SafetyLimits {
    /// Absolute daily loss limit in account currency.
    pub max_daily_loss: f64,
    /// Maximum recorded trade outcomes per day.
    pub max_daily_trades: u32,
    /// Losing streak length that pauses the bot.
    pub max_consecutive_losses: u32,
    /// Maximum lot size for a single trade.
    pub max_position_size: f64,
    /// Maximum positions open at the same time.
    pub max_simultaneous_positions: u32,
    /// Minimum score (0-100) for a HYBRID recommendation.
    pub min_score_hybrid: f64,
    /// Minimum score (0-100) for AUTO execution.
    pub min_score_auto: f64,
    /// Order execution timeout handed to the executor.
    #[serde(with = "duration")]
    pub execution_timeout: Duration,
    /// Maximum allowed slippage in points.
    pub max_slippage_points: f64,
    /// Minimum stop-loss distance in points.
    pub min_stop_loss_points: f64,
}

impl Default for SafetyLimits {
    fn default() -> Self {
        Self {
            max_daily_loss: 100.0,
            max_daily_trades: 5,
            max_consecutive_losses: 3,
            max_position_size: 0.01,
            max_simultaneous_positions: 1,
            min_score_hybrid: 65.0,
            min_score_auto: 90.0,
            execution_timeout: Duration::from_secs(10),
            max_slippage_points: 5.0,
            min_stop_loss_points: 10.0,
        }
    }
}

impl SafetyLimits {
    /// Checks that every threshold is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let amounts = [
            ("max_daily_loss", self.max_daily_loss),
            ("max_position_size", self.max_position_size),
            ("max_slippage_points", self.max_slippage_points),
            ("min_stop_loss_points", self.min_stop_loss_points),
        ];
        for (name, value) in amounts {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::invalid(
                    format!("limits.{}", name),
                    format!("must be a non-negative number, got {}", value),
                ));
            }
        }

        let scores = [
            ("min_score_hybrid", self.min_score_hybrid),
            ("min_score_auto", self.min_score_auto),
        ];
        for (name, value) in scores {
            if !(0.0..=100.0).contains(&value) {
                return Err(ConfigError::invalid(
                    format!("limits.{}", name),
                    format!("must be between 0 and 100, got {}", value),
                ));
            }
        }

        Ok(())
    }
}
