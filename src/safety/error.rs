//! Safety error types.

use thiserror::Error;

use crate::config::ConfigError;
use crate::storage::StorageError;

/// Safety monitor error type.
///
/// Limit breaches are not errors; they surface as [`super::BlockReason`].
#[derive(Debug, Error)]
pub enum SafetyError {
    #[error("invalid safety limits: {0}")]
    InvalidLimits(#[from] ConfigError),
    #[error("failed to persist safety state: {0}")]
    Storage(#[from] StorageError),
    #[error("invalid trade outcome: {0}")]
    InvalidOutcome(f64),
    #[error("kill switch active: {0}")]
    KillSwitchActive(String),
    #[error("safety violation: {0}")]
    Violation(String),
}

/// Returned when a state or mode name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind}: {value:?}")]
pub struct UnknownVariant {
    kind: &'static str,
    value: String,
}

impl UnknownVariant {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}
