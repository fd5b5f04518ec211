//! Why a trade was blocked or rejected.

use thiserror::Error;

use super::{BotState, TradingMode, UNKNOWN_REASON};

/// Reason `can_trade()` refused permission, in evaluation order.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BlockReason {
    #[error("KILL_SWITCH: {}", .reason.as_deref().unwrap_or(UNKNOWN_REASON))]
    KillSwitch { reason: Option<String> },
    #[error("BOT_STATE: {0}")]
    BotState(BotState),
    #[error("MODE: {0}")]
    Mode(TradingMode),
    #[error("DAILY_LOSS: {current:.2} >= {limit}")]
    DailyLoss { current: f64, limit: f64 },
    #[error("DAILY_TRADES: {current} >= {limit}")]
    DailyTrades { current: u32, limit: u32 },
    #[error("CONSECUTIVE_LOSSES: {current} >= {limit}")]
    ConsecutiveLosses { current: u32, limit: u32 },
}

impl BlockReason {
    /// Pause reason recorded when this block is a limit breach.
    ///
    /// `None` for blocks that do not force a pause.
    pub fn breach_code(&self) -> Option<&'static str> {
        match self {
            BlockReason::DailyLoss { .. } => Some("MAX_DAILY_LOSS_REACHED"),
            BlockReason::DailyTrades { .. } => Some("MAX_DAILY_TRADES_REACHED"),
            BlockReason::ConsecutiveLosses { .. } => Some("MAX_CONSECUTIVE_LOSSES"),
            _ => None,
        }
    }

    pub fn is_breach(&self) -> bool {
        self.breach_code().is_some()
    }
}

/// Reason `validate_trade()` rejected a candidate trade.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TradeRejection {
    #[error("SCORE_TOO_LOW: {score:.1} < {min}")]
    ScoreTooLow { score: f64, min: f64 },
    #[error("SCORE_TOO_LOW_AUTO: {score:.1} < {min}")]
    ScoreTooLowAuto { score: f64, min: f64 },
    #[error("MODE: NO_TRADE")]
    TradingDisabled,
    #[error("INVALID_SCORE: {0}")]
    InvalidScore(f64),
    #[error("INVALID_LOT_SIZE: {0}")]
    InvalidPositionSize(f64),
    #[error("LOT_SIZE_EXCEEDED: {size} > {max}")]
    PositionSizeExceeded { size: f64, max: f64 },
}
