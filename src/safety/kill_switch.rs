//! File-backed emergency kill switch.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, info, warn};

use crate::storage::{StorageError, read_json, timestamp, write_json_atomic};

/// Reported when the switch is active but no readable reason exists.
pub const UNKNOWN_REASON: &str = "unknown";

/// Contents of the durable marker file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KillSwitchMarker {
    #[serde(default)]
    pub activated: bool,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default = "Utc::now", deserialize_with = "timestamp::deserialize")]
    pub timestamp: DateTime<Utc>,
}

/// Emergency stop that blocks all trading until a human clears it.
///
/// The marker file is the source of truth: while it exists the switch is
/// active for every process that points at the same path. Share one instance
/// per process through an `Arc<KillSwitch>`; nothing inside this crate ever
/// calls [`KillSwitch::deactivate`].
#[derive(Debug)]
pub struct KillSwitch {
    marker_path: PathBuf,
    active: AtomicBool,
}

impl KillSwitch {
    /// Creates a handle for the marker at `marker_path`.
    ///
    /// A marker left behind by an earlier process is honoured immediately.
    pub fn new(marker_path: impl Into<PathBuf>) -> Self {
        let switch = Self {
            marker_path: marker_path.into(),
            active: AtomicBool::new(false),
        };

        if switch.marker_exists() {
            warn!(
                path = %switch.marker_path.display(),
                reason = %switch.get_reason().unwrap_or_else(|| UNKNOWN_REASON.to_string()),
                "Kill switch marker found at startup"
            );
        }

        switch
    }

    /// Path to the durable marker.
    pub fn marker_path(&self) -> &Path {
        &self.marker_path
    }

    /// Stops all trading. Re-activating overwrites the reason and timestamp.
    ///
    /// The in-memory flag is set even if writing the marker fails; the error
    /// is returned so the caller knows the activation will not survive a restart.
    pub fn activate(&self, reason: &str) -> Result<(), StorageError> {
        self.active.store(true, Ordering::SeqCst);

        let marker = KillSwitchMarker {
            activated: true,
            reason: Some(reason.to_string()),
            timestamp: Utc::now(),
        };

        error!(reason = %reason, path = %self.marker_path.display(), "KILL SWITCH ACTIVATED");

        write_json_atomic(&self.marker_path, &marker).inspect_err(|e| {
            error!(error = %e, path = %self.marker_path.display(), "Failed to write kill switch marker");
        })
    }

    /// Clears the switch. Manual operator action only.
    pub fn deactivate(&self) -> Result<(), StorageError> {
        match fs::remove_file(&self.marker_path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                error!(error = %e, path = %self.marker_path.display(), "Failed to remove kill switch marker");
                return Err(e.into());
            }
        }

        self.active.store(false, Ordering::SeqCst);
        info!("Kill switch deactivated");
        Ok(())
    }

    /// True if this process activated the switch or the marker exists on disk.
    ///
    /// Hits the filesystem on every call so an activation by another process
    /// is never missed.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst) || self.marker_exists()
    }

    /// Recorded activation reason.
    ///
    /// `None` when inactive, [`UNKNOWN_REASON`] when active but the marker is
    /// missing a reason or cannot be parsed.
    pub fn get_reason(&self) -> Option<String> {
        match read_json::<KillSwitchMarker>(&self.marker_path) {
            Ok(Some(marker)) => Some(marker.reason.unwrap_or_else(|| UNKNOWN_REASON.to_string())),
            Ok(None) if self.active.load(Ordering::SeqCst) => Some(UNKNOWN_REASON.to_string()),
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, path = %self.marker_path.display(), "Unreadable kill switch marker");
                Some(UNKNOWN_REASON.to_string())
            }
        }
    }

    // An unanswerable existence check counts as present.
    fn marker_exists(&self) -> bool {
        self.marker_path.try_exists().unwrap_or(true)
    }
}
