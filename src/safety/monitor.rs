//! Safety monitor: operational state machine and daily counters.

use chrono::{Local, NaiveDate, Utc};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::{
    BlockReason, BotState, KillSwitch, SafetyError, SafetySnapshot, SafetyStatus, TradeRejection,
    TradingMode,
};
use crate::config::{Config, SafetyLimits};
use crate::storage::{JsonSnapshotStore, SnapshotStore, StorageError};

/// Pause reason used when an outcome could not be persisted.
const STORAGE_FAILURE: &str = "STORAGE_FAILURE";

/// Mutable part of the monitor. Only touched under the monitor's lock.
#[derive(Debug, Clone)]
struct MonitorState {
    state: BotState,
    mode: TradingMode,
    daily_loss: f64,
    daily_profit: f64,
    daily_trades: u32,
    consecutive_losses: u32,
    last_reset_date: NaiveDate,
    last_pause_reason: Option<String>,
    last_error: Option<String>,
}

impl MonitorState {
    fn fresh(today: NaiveDate) -> Self {
        Self {
            state: BotState::Stopped,
            mode: TradingMode::Hybrid,
            daily_loss: 0.0,
            daily_profit: 0.0,
            daily_trades: 0,
            consecutive_losses: 0,
            last_reset_date: today,
            last_pause_reason: None,
            last_error: None,
        }
    }

    fn from_snapshot(snapshot: &SafetySnapshot) -> Self {
        Self {
            state: snapshot.state,
            mode: snapshot.mode,
            daily_loss: snapshot.daily_loss,
            daily_profit: snapshot.daily_profit,
            daily_trades: snapshot.daily_trades,
            consecutive_losses: snapshot.consecutive_losses,
            last_reset_date: snapshot.date,
            last_pause_reason: None,
            last_error: None,
        }
    }

    fn to_snapshot(&self) -> SafetySnapshot {
        SafetySnapshot {
            date: self.last_reset_date,
            daily_loss: self.daily_loss,
            daily_profit: self.daily_profit,
            daily_trades: self.daily_trades,
            consecutive_losses: self.consecutive_losses,
            state: self.state,
            mode: self.mode,
            timestamp: Utc::now(),
        }
    }

    fn reset_daily_counters(&mut self, today: NaiveDate) {
        self.daily_loss = 0.0;
        self.daily_profit = 0.0;
        self.daily_trades = 0;
        self.consecutive_losses = 0;
        self.last_reset_date = today;
    }

    fn needs_rollover(&self, today: NaiveDate) -> bool {
        self.last_reset_date != today
    }

    fn mark_paused(&mut self, reason: &str) {
        self.state = BotState::Paused;
        self.last_pause_reason = Some(reason.to_string());
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Gatekeeper between trade recommendations and real capital.
///
/// Callers ask [`SafetyMonitor::can_trade`] before evaluating a candidate,
/// [`SafetyMonitor::validate_trade`] before executing it, and report the
/// realised result with [`SafetyMonitor::record_trade_result`].
///
/// Every mutation is written to the [`SnapshotStore`] before the call
/// returns. Mutations are serialised by an internal lock, so a monitor can be
/// shared across threads behind an `Arc`.
pub struct SafetyMonitor {
    limits: SafetyLimits,
    kill_switch: Arc<KillSwitch>,
    store: Box<dyn SnapshotStore>,
    inner: RwLock<MonitorState>,
}

impl SafetyMonitor {
    /// Creates a monitor and hydrates it from the last persisted snapshot.
    ///
    /// Invalid limits are fatal. A missing or unreadable snapshot is not:
    /// the monitor then starts STOPPED in HYBRID mode with zeroed counters.
    pub fn new<S>(
        limits: SafetyLimits,
        kill_switch: Arc<KillSwitch>,
        store: S,
    ) -> Result<Self, SafetyError>
    where
        S: SnapshotStore + 'static,
    {
        limits.validate()?;

        let today = today();
        let (state, needs_save) = match store.load() {
            Ok(Some(snapshot)) if snapshot.is_consistent() => {
                let mut state = MonitorState::from_snapshot(&snapshot);
                let rolled = state.needs_rollover(today);
                if rolled {
                    info!(
                        saved_date = %snapshot.date,
                        today = %today,
                        "New trading day, resetting daily counters"
                    );
                    state.reset_daily_counters(today);
                }
                (state, rolled)
            }
            Ok(Some(snapshot)) => {
                warn!(
                    location = %store.location(),
                    daily_loss = snapshot.daily_loss,
                    daily_profit = snapshot.daily_profit,
                    "Inconsistent safety snapshot, starting from defaults"
                );
                (MonitorState::fresh(today), true)
            }
            Ok(None) => {
                debug!(location = %store.location(), "No safety snapshot, starting from defaults");
                (MonitorState::fresh(today), false)
            }
            Err(e) => {
                warn!(
                    error = %e,
                    location = %store.location(),
                    "Unreadable safety snapshot, starting from defaults"
                );
                (MonitorState::fresh(today), true)
            }
        };

        let monitor = Self {
            limits,
            kill_switch,
            store: Box::new(store),
            inner: RwLock::new(state),
        };

        if needs_save {
            let state = monitor.inner.read();
            if let Err(e) = monitor.persist(&state) {
                error!(error = %e, "Failed to persist initial safety snapshot");
            }
        }

        {
            let state = monitor.inner.read();
            info!(
                state = %state.state,
                mode = %state.mode,
                daily_loss = state.daily_loss,
                daily_trades = state.daily_trades,
                consecutive_losses = state.consecutive_losses,
                "Safety monitor initialized"
            );
        }

        Ok(monitor)
    }

    /// Builds the kill switch and JSON snapshot store from configuration.
    pub fn from_config(config: &Config) -> Result<Self, SafetyError> {
        let storage = config.storage();
        let kill_switch = Arc::new(KillSwitch::new(&storage.kill_switch_file));
        let store = JsonSnapshotStore::new(&storage.state_file);
        Self::new(config.limits.clone(), kill_switch, store)
    }

    pub fn limits(&self) -> &SafetyLimits {
        &self.limits
    }

    /// Shared kill switch handle.
    pub fn kill_switch(&self) -> &Arc<KillSwitch> {
        &self.kill_switch
    }

    pub fn state(&self) -> BotState {
        self.inner.read().state
    }

    pub fn mode(&self) -> TradingMode {
        self.inner.read().mode
    }

    pub fn daily_loss(&self) -> f64 {
        self.inner.read().daily_loss
    }

    pub fn daily_profit(&self) -> f64 {
        self.inner.read().daily_profit
    }

    pub fn daily_trades(&self) -> u32 {
        self.inner.read().daily_trades
    }

    pub fn consecutive_losses(&self) -> u32 {
        self.inner.read().consecutive_losses
    }

    pub fn last_reset_date(&self) -> NaiveDate {
        self.inner.read().last_reset_date
    }

    // ==================== Transitions ====================

    /// STOPPED or PAUSED -> RUNNING.
    ///
    /// Returns `Ok(false)` without changing state while the kill switch is active.
    pub fn start(&self) -> Result<bool, SafetyError> {
        let mut inner = self.inner.write();

        if self.kill_switch.is_active() {
            warn!(
                reason = %self.kill_switch_reason(),
                "Cannot start: kill switch active"
            );
            return Ok(false);
        }

        self.commit_running(&mut inner)?;
        info!("Bot started");
        Ok(true)
    }

    /// Any state -> PAUSED. Always takes effect.
    ///
    /// The pause holds in memory even when the snapshot cannot be written;
    /// the storage error is returned so the caller can escalate.
    pub fn pause(&self, reason: &str) -> Result<(), SafetyError> {
        let mut inner = self.inner.write();
        self.pause_locked(&mut inner, reason)?;
        Ok(())
    }

    /// PAUSED -> RUNNING.
    ///
    /// Returns `Ok(false)` while the kill switch is active or when the bot is
    /// STOPPED, which requires [`SafetyMonitor::start`].
    pub fn resume(&self) -> Result<bool, SafetyError> {
        let mut inner = self.inner.write();

        if self.kill_switch.is_active() {
            warn!(
                reason = %self.kill_switch_reason(),
                "Cannot resume: kill switch active"
            );
            return Ok(false);
        }

        match inner.state {
            BotState::Running => return Ok(true),
            BotState::Stopped => {
                warn!("Cannot resume: bot is stopped, use start");
                return Ok(false);
            }
            BotState::Paused | BotState::Error => {}
        }

        self.commit_running(&mut inner)?;
        info!("Bot resumed");
        Ok(true)
    }

    /// Records a runtime error and degrades to PAUSED in one step.
    ///
    /// ERROR is never observable from outside: the transition to PAUSED
    /// happens under the same lock.
    pub fn error(&self, message: &str) -> Result<(), SafetyError> {
        let mut inner = self.inner.write();

        inner.state = BotState::Error;
        inner.last_error = Some(message.to_string());
        error!(error = %message, "Bot error");

        self.pause_locked(&mut inner, &format!("ERROR: {}", message))?;
        Ok(())
    }

    /// Changes the trading policy. Does not touch the operational state.
    pub fn set_mode(&self, mode: TradingMode) -> Result<(), SafetyError> {
        let mut inner = self.inner.write();

        let mut next = inner.clone();
        next.mode = mode;

        match self.persist(&next) {
            Ok(()) => {}
            // Disabling trading must not depend on the disk.
            Err(e) if mode == TradingMode::NoTrade => {
                *inner = next;
                error!(error = %e, mode = %mode, "Mode changed but not persisted");
                return Err(e.into());
            }
            Err(e) => return Err(e.into()),
        }

        *inner = next;
        info!(mode = %mode, "Mode changed");
        Ok(())
    }

    // ==================== Gate checks ====================

    /// Whether the trading cycle may attempt a trade right now.
    ///
    /// Checks run in a fixed order and the first failure wins. A breached
    /// daily limit pauses the bot before this returns, so ignoring the result
    /// does not bypass the breach.
    pub fn can_trade(&self) -> Result<(), BlockReason> {
        self.roll_over_if_needed();

        {
            let inner = self.inner.read();
            match self.evaluate(&inner) {
                Err(reason) if reason.is_breach() => {}
                verdict => return verdict,
            }
        }

        // Re-check under the write lock: another caller may have paused already.
        let mut inner = self.inner.write();
        let verdict = self.evaluate(&inner);
        if let Err(ref reason) = verdict {
            if let Some(code) = reason.breach_code() {
                warn!(reason = %reason, "Safety limit breached");
                if let Err(e) = self.pause_locked(&mut inner, code) {
                    inner.last_error = Some(format!("{}: pause not persisted: {}", code, e));
                }
            }
        }
        verdict
    }

    /// Checks a candidate trade against the current mode and limits.
    ///
    /// Pure: never changes state. Must be combined with [`SafetyMonitor::can_trade`].
    pub fn validate_trade(&self, score: f64, position_size: f64) -> Result<(), TradeRejection> {
        if !score.is_finite() {
            return Err(TradeRejection::InvalidScore(score));
        }
        if !position_size.is_finite() || position_size < 0.0 {
            return Err(TradeRejection::InvalidPositionSize(position_size));
        }

        let mode = self.inner.read().mode;
        match mode {
            TradingMode::Hybrid if score < self.limits.min_score_hybrid => {
                return Err(TradeRejection::ScoreTooLow {
                    score,
                    min: self.limits.min_score_hybrid,
                });
            }
            TradingMode::Auto if score < self.limits.min_score_auto => {
                return Err(TradeRejection::ScoreTooLowAuto {
                    score,
                    min: self.limits.min_score_auto,
                });
            }
            TradingMode::NoTrade => return Err(TradeRejection::TradingDisabled),
            _ => {}
        }

        if position_size > self.limits.max_position_size {
            return Err(TradeRejection::PositionSizeExceeded {
                size: position_size,
                max: self.limits.max_position_size,
            });
        }

        Ok(())
    }

    // ==================== Outcomes ====================

    /// Records the realised profit (negative for a loss) of a closed trade.
    ///
    /// Counters are always applied. If the snapshot cannot be written the bot
    /// is paused as well and the storage error is returned.
    pub fn record_trade_result(&self, profit: f64) -> Result<(), SafetyError> {
        if !profit.is_finite() {
            return Err(SafetyError::InvalidOutcome(profit));
        }

        self.roll_over_if_needed();

        {
            let mut inner = self.inner.write();

            inner.daily_trades = inner.daily_trades.saturating_add(1);
            if profit < 0.0 {
                inner.daily_loss += profit.abs();
                inner.consecutive_losses = inner.consecutive_losses.saturating_add(1);
            } else {
                inner.daily_profit += profit;
                inner.consecutive_losses = 0;
            }

            info!(
                profit = profit,
                daily_trades = inner.daily_trades,
                daily_loss = inner.daily_loss,
                daily_profit = inner.daily_profit,
                consecutive_losses = inner.consecutive_losses,
                "Trade result recorded"
            );

            if let Err(e) = self.persist(&inner) {
                error!(error = %e, "Failed to persist trade result, pausing");
                inner.mark_paused(STORAGE_FAILURE);
                let _ = self.persist(&inner);
                return Err(e.into());
            }
        }

        if let Err(reason) = self.can_trade() {
            warn!(reason = %reason, "Trading blocked after trade result");
        }

        Ok(())
    }

    // ==================== Observability ====================

    /// Snapshot of everything an observer may want to show.
    ///
    /// Runs [`SafetyMonitor::can_trade`], including its breach pause.
    /// The kill switch is read once: `kill_switch_active` is true exactly when
    /// `block_reason` is the kill switch.
    pub fn get_status(&self) -> SafetyStatus {
        self.roll_over_if_needed();

        let gate = match self.kill_switch.get_reason() {
            Some(reason) => Err(BlockReason::KillSwitch {
                reason: Some(reason),
            }),
            None => self.can_trade(),
        };
        let kill_switch_reason = match &gate {
            Err(BlockReason::KillSwitch { reason }) => Some(
                reason
                    .clone()
                    .unwrap_or_else(|| super::UNKNOWN_REASON.to_string()),
            ),
            _ => None,
        };
        let inner = self.inner.read();

        SafetyStatus {
            state: inner.state,
            mode: inner.mode,
            kill_switch_active: kill_switch_reason.is_some(),
            kill_switch_reason,
            daily_loss: inner.daily_loss,
            daily_profit: inner.daily_profit,
            daily_trades: inner.daily_trades,
            consecutive_losses: inner.consecutive_losses,
            last_reset_date: inner.last_reset_date,
            last_pause_reason: inner.last_pause_reason.clone(),
            last_error: inner.last_error.clone(),
            limits: self.limits.clone(),
            can_trade: gate.is_ok(),
            block_reason: gate.err().map(|r| r.to_string()),
        }
    }

    // ==================== Internals ====================

    /// Resets the daily counters once the local date has moved on.
    fn roll_over_if_needed(&self) {
        self.roll_over_if_needed_at(today());
    }

    pub(super) fn roll_over_if_needed_at(&self, today: NaiveDate) {
        if !self.inner.read().needs_rollover(today) {
            return;
        }

        let mut inner = self.inner.write();
        if !inner.needs_rollover(today) {
            return;
        }

        info!(
            previous = %inner.last_reset_date,
            today = %today,
            "New trading day, resetting daily counters"
        );
        inner.reset_daily_counters(today);
        if let Err(e) = self.persist(&inner) {
            error!(error = %e, "Failed to persist daily reset");
        }
    }

    /// First failing check, in priority order. Does not mutate.
    fn evaluate(&self, inner: &MonitorState) -> Result<(), BlockReason> {
        if self.kill_switch.is_active() {
            return Err(BlockReason::KillSwitch {
                reason: self.kill_switch.get_reason(),
            });
        }

        if inner.state != BotState::Running {
            return Err(BlockReason::BotState(inner.state));
        }

        if inner.mode == TradingMode::NoTrade {
            return Err(BlockReason::Mode(inner.mode));
        }

        if inner.daily_loss >= self.limits.max_daily_loss {
            return Err(BlockReason::DailyLoss {
                current: inner.daily_loss,
                limit: self.limits.max_daily_loss,
            });
        }

        if inner.daily_trades >= self.limits.max_daily_trades {
            return Err(BlockReason::DailyTrades {
                current: inner.daily_trades,
                limit: self.limits.max_daily_trades,
            });
        }

        if inner.consecutive_losses >= self.limits.max_consecutive_losses {
            return Err(BlockReason::ConsecutiveLosses {
                current: inner.consecutive_losses,
                limit: self.limits.max_consecutive_losses,
            });
        }

        Ok(())
    }

    fn pause_locked(&self, inner: &mut MonitorState, reason: &str) -> Result<(), StorageError> {
        inner.mark_paused(reason);
        info!(reason = %reason, "Bot paused");

        self.persist(inner).inspect_err(|e| {
            error!(error = %e, reason = %reason, "Pause applied but not persisted");
        })
    }

    /// Persists RUNNING first and only then applies it in memory.
    fn commit_running(&self, inner: &mut MonitorState) -> Result<(), SafetyError> {
        let mut next = inner.clone();
        next.state = BotState::Running;
        self.persist(&next)?;
        *inner = next;
        Ok(())
    }

    fn persist(&self, inner: &MonitorState) -> Result<(), StorageError> {
        self.store.save(&inner.to_snapshot())
    }

    fn kill_switch_reason(&self) -> String {
        self.kill_switch
            .get_reason()
            .unwrap_or_else(|| super::UNKNOWN_REASON.to_string())
    }
}
