//! Emergency stop and post-execution audit.

use tracing::error;

use super::{BlockReason, SafetyError, SafetyMonitor};

/// Activates the kill switch and pauses the monitor.
///
/// The switch is set first, so trading is blocked even if the pause cannot
/// be persisted. Both steps are attempted; the first failure is returned.
pub fn emergency_stop(monitor: &SafetyMonitor, reason: &str) -> Result<(), SafetyError> {
    let activation = monitor.kill_switch().activate(reason);
    let pause = monitor.pause(&format!("EMERGENCY_STOP: {}", reason));

    activation?;
    pause
}

/// Audits a trade the executor reports as already placed.
///
/// Call before [`SafetyMonitor::record_trade_result`]. If the gate is closed
/// the trade should never have happened: the governor triggers an emergency
/// stop and returns [`SafetyError::Violation`].
pub fn check_execution(monitor: &SafetyMonitor, executed: bool) -> Result<(), SafetyError> {
    if !executed {
        return Ok(());
    }

    match monitor.can_trade() {
        Ok(()) => Ok(()),
        Err(BlockReason::KillSwitch { reason }) => {
            let reason = reason.unwrap_or_else(|| super::UNKNOWN_REASON.to_string());
            error!(reason = %reason, "Trade executed while kill switch active");
            Err(SafetyError::KillSwitchActive(reason))
        }
        Err(reason) => {
            error!(reason = %reason, "SAFETY VIOLATION: trade executed but not allowed");
            emergency_stop(monitor, &format!("Safety violation: {}", reason))?;
            Err(SafetyError::Violation(reason.to_string()))
        }
    }
}
