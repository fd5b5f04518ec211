//! Trading safety governor.
//!
//! Decides whether a proposed trade may reach real capital. The
//! [`KillSwitch`] overrides everything; the [`SafetyMonitor`] owns the
//! operational state, the trading mode and the daily loss/trade counters,
//! and persists them so a restart never forgets a breach.

mod emergency;
mod error;
mod kill_switch;
mod monitor;
mod reason;
mod snapshot;
mod state;

pub use emergency::{check_execution, emergency_stop};
pub use error::{SafetyError, UnknownVariant};
pub use kill_switch::{KillSwitch, KillSwitchMarker, UNKNOWN_REASON};
pub use monitor::SafetyMonitor;
pub use reason::{BlockReason, TradeRejection};
pub use snapshot::{SafetySnapshot, SafetyStatus};
pub use state::{BotState, TradingMode};
