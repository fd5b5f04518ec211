//! Operational state and trading mode.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::UnknownVariant;

/// Explicit bot operational state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BotState {
    /// Trading cycle may ask for permission to trade.
    Running,
    /// Halted until a human resumes.
    Paused,
    /// Transient; always collapses into `Paused` before it can be observed.
    Error,
    /// Initial state of a fresh monitor.
    Stopped,
}

impl BotState {
    pub fn as_str(&self) -> &'static str {
        match self {
            BotState::Running => "RUNNING",
            BotState::Paused => "PAUSED",
            BotState::Error => "ERROR",
            BotState::Stopped => "STOPPED",
        }
    }
}

impl fmt::Display for BotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BotState {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "RUNNING" => Ok(BotState::Running),
            "PAUSED" => Ok(BotState::Paused),
            "ERROR" => Ok(BotState::Error),
            "STOPPED" => Ok(BotState::Stopped),
            _ => Err(UnknownVariant::new("bot state", s)),
        }
    }
}

/// Trading execution policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradingMode {
    /// Recommend trades scoring at least `min_score_hybrid`; a human confirms.
    Hybrid,
    /// Execute trades scoring at least `min_score_auto` without confirmation.
    Auto,
    /// All trading disabled.
    NoTrade,
}

impl TradingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradingMode::Hybrid => "HYBRID",
            TradingMode::Auto => "AUTO",
            TradingMode::NoTrade => "NO_TRADE",
        }
    }
}

impl fmt::Display for TradingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TradingMode {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "HYBRID" => Ok(TradingMode::Hybrid),
            "AUTO" => Ok(TradingMode::Auto),
            "NO_TRADE" => Ok(TradingMode::NoTrade),
            _ => Err(UnknownVariant::new("trading mode", s)),
        }
    }
}
