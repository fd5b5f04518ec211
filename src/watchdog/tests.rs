//! Tests for the watchdog.

use super::*;
use crate::config::SafetyLimits;
use crate::safety::KillSwitch;
use crate::storage::JsonSnapshotStore;
use tempfile::TempDir;

fn watchdog(dir: &TempDir, interval: Duration) -> (Arc<Watchdog>, Arc<SafetyMonitor>) {
    let kill_switch = Arc::new(KillSwitch::new(dir.path().join("KILL_SWITCH.lock")));
    let store = JsonSnapshotStore::new(dir.path().join("safety_state.json"));
    let monitor = Arc::new(SafetyMonitor::new(SafetyLimits::default(), kill_switch, store).unwrap());
    (
        Arc::new(Watchdog::new(Arc::clone(&monitor), interval)),
        monitor,
    )
}

#[tokio::test]
async fn test_poll_counts_blocked_status() {
    let dir = TempDir::new().unwrap();
    let (watchdog, _monitor) = watchdog(&dir, Duration::from_secs(1));

    // A fresh monitor is STOPPED, so the gate is closed
    let status = watchdog.poll().await.unwrap();
    assert!(!status.can_trade);

    let stats = watchdog.stats().await;
    assert_eq!(stats.polls, 1);
    assert_eq!(stats.blocked_polls, 1);
    assert_eq!(stats.gate_changes, 0);
}

#[tokio::test]
async fn test_poll_detects_gate_and_kill_switch_changes() {
    let dir = TempDir::new().unwrap();
    let (watchdog, monitor) = watchdog(&dir, Duration::from_secs(1));

    watchdog.poll().await.unwrap();

    assert!(monitor.start().unwrap());
    let status = watchdog.poll().await.unwrap();
    assert!(status.can_trade);

    monitor.kill_switch().activate("WATCHDOG_TEST").unwrap();
    let status = watchdog.poll().await.unwrap();
    assert!(!status.can_trade);
    assert!(status.kill_switch_active);

    let stats = watchdog.stats().await;
    assert_eq!(stats.polls, 3);
    assert_eq!(stats.gate_changes, 2);
    assert_eq!(stats.kill_switch_activations, 1);
}

#[tokio::test]
async fn test_poll_applies_pending_breach_pause() {
    let dir = TempDir::new().unwrap();
    let (watchdog, monitor) = watchdog(&dir, Duration::from_secs(1));

    // Counters advance while stopped; the breach surfaces once running
    for _ in 0..3 {
        monitor.record_trade_result(-1.0).unwrap();
    }
    assert!(monitor.start().unwrap());

    let status = watchdog.poll().await.unwrap();
    assert!(!status.can_trade);
    assert_eq!(status.state, BotState::Paused);
    assert_eq!(monitor.state(), BotState::Paused);
}

#[tokio::test]
async fn test_start_and_stop() {
    let dir = TempDir::new().unwrap();
    let (watchdog, _monitor) = watchdog(&dir, Duration::from_millis(10));

    let runner = Arc::clone(&watchdog);
    let handle = tokio::spawn(async move { runner.start().await });

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(watchdog.is_running().await);
    assert!(matches!(
        watchdog.start().await,
        Err(WatchdogError::AlreadyRunning)
    ));

    watchdog.stop().await;
    handle.await.unwrap().unwrap();

    assert!(!watchdog.is_running().await);
    assert!(watchdog.stats().await.polls >= 1);
}

#[tokio::test]
async fn test_stop_when_not_running_is_noop() {
    let dir = TempDir::new().unwrap();
    let (watchdog, _monitor) = watchdog(&dir, Duration::from_secs(1));

    watchdog.stop().await;
    assert!(!watchdog.is_running().await);
    assert_eq!(watchdog.uptime().await, Duration::ZERO);
}
