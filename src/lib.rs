//! Trading safety governor.
//!
//! Stands between a strategy's trade recommendation and real capital: it
//! decides whether execution is permitted, keeps the daily counters that make
//! that decision trustworthy across restarts, and owns the emergency kill
//! switch.

pub mod config;
pub mod safety;
pub mod storage;
pub mod watchdog;
