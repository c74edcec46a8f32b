use std::{sync::Arc, time::Duration};

use chrono::{DateTime, TimeZone, Utc};
use tokio::{sync::mpsc, time::sleep};

use countdown_daemon::{
    services::{Alert, AlertSink, Notifier, SnapshotStore},
    state::{AppState, CountdownSnapshot, Outcome, RunState},
    tasks::{countdown_ticker_task, wake_up_recovery_task},
    utils::ManualClock,
};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 8, 2, 12, 0, 0).unwrap()
}

struct Harness {
    state: Arc<AppState>,
    clock: ManualClock,
    alerts: mpsc::UnboundedReceiver<Alert>,
}

fn harness_with_store(store: SnapshotStore) -> Harness {
    let clock = ManualClock::new(t0());
    let (tx, alerts) = mpsc::unbounded_channel();
    let state = Arc::new(AppState::new(
        0,
        "127.0.0.1".to_string(),
        Arc::new(clock.clone()),
        Notifier::new(AlertSink::Channel(tx)),
        store,
    ));
    tokio::spawn(countdown_ticker_task(Arc::clone(&state)));

    Harness { state, clock, alerts }
}

fn harness() -> Harness {
    harness_with_store(SnapshotStore::memory())
}

#[tokio::test(start_paused = true)]
async fn test_countdown_runs_to_completion_with_one_alert() {
    let mut h = harness();
    h.state.configure(0, 0, 3).unwrap();
    assert!(h.state.start().unwrap().is_applied());
    assert!(h.state.has_pending_notification());

    sleep(Duration::from_millis(3500)).await;

    let view = h.state.view().unwrap();
    assert_eq!(view.run_state, RunState::Completed);
    assert_eq!(view.remaining_seconds, 0);
    assert_eq!(view.progress, 1.0);
    assert!(!h.state.tick_control().running);

    assert_eq!(h.alerts.recv().await.unwrap(), Alert::completion());
    sleep(Duration::from_secs(10)).await;
    assert!(h.alerts.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_pause_freezes_and_resume_continues() {
    let h = harness();
    h.state.configure(0, 0, 10).unwrap();
    h.state.start().unwrap();

    sleep(Duration::from_millis(2500)).await;
    assert_eq!(h.state.view().unwrap().remaining_seconds, 8);

    let paused = h.state.pause().unwrap();
    assert_eq!(paused.view.run_state, RunState::Paused);
    assert!(!h.state.has_pending_notification());

    sleep(Duration::from_secs(5)).await;
    assert_eq!(h.state.view().unwrap().remaining_seconds, 8);

    let resumed = h.state.resume().unwrap();
    assert_eq!(resumed.view.remaining_seconds, 8);
    assert_eq!(resumed.view.run_state, RunState::Running);
    assert!(h.state.has_pending_notification());

    sleep(Duration::from_millis(1500)).await;
    assert_eq!(h.state.view().unwrap().remaining_seconds, 7);
}

#[tokio::test(start_paused = true)]
async fn test_quick_pause_resume_loses_no_time() {
    let h = harness();
    h.state.configure(0, 0, 30).unwrap();
    h.state.start().unwrap();
    sleep(Duration::from_millis(1500)).await;

    h.state.pause().unwrap();
    h.state.resume().unwrap();
    assert_eq!(h.state.view().unwrap().remaining_seconds, 29);
}

#[tokio::test(start_paused = true)]
async fn test_reset_stops_everything() {
    let mut h = harness();
    h.state.configure(0, 0, 5).unwrap();
    h.state.start().unwrap();
    sleep(Duration::from_millis(2500)).await;

    let report = h.state.reset().unwrap();
    assert_eq!(report.view.run_state, RunState::Idle);
    assert_eq!(report.view.remaining_seconds, 5);

    sleep(Duration::from_secs(10)).await;
    assert_eq!(h.state.view().unwrap().remaining_seconds, 5);
    assert!(h.alerts.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_guarded_operations_are_ignored() {
    let h = harness();
    assert_eq!(h.state.configure(0, 0, 0).unwrap().outcome, Outcome::Ignored);
    assert_eq!(h.state.start().unwrap().outcome, Outcome::Ignored);
    assert_eq!(h.state.pause().unwrap().outcome, Outcome::Ignored);
    assert_eq!(h.state.resume().unwrap().outcome, Outcome::Ignored);
    assert_eq!(h.state.on_suspend().unwrap().outcome, Outcome::Ignored);
    assert_eq!(h.state.get_last_action(), (None, None));
}

#[tokio::test(start_paused = true)]
async fn test_suspend_resume_reconciles_wall_clock() {
    let mut h = harness();
    h.state.configure(0, 1, 0).unwrap();
    h.state.start().unwrap();

    h.state.on_suspend().unwrap();
    h.clock.advance(20);
    let report = h.state.on_resume().unwrap();
    assert_eq!(report.view.remaining_seconds, 40);
    assert_eq!(report.view.run_state, RunState::Running);

    h.state.on_suspend().unwrap();
    h.clock.advance(100);
    let report = h.state.on_resume().unwrap();
    assert_eq!(report.view.remaining_seconds, 0);
    assert_eq!(report.view.run_state, RunState::Completed);
    assert_eq!(h.alerts.recv().await.unwrap(), Alert::completion());
}

#[tokio::test(start_paused = true)]
async fn test_suspend_writes_snapshot() {
    let store = SnapshotStore::memory();
    let h = harness_with_store(store.clone());
    h.state.configure(0, 2, 0).unwrap();
    h.state.start().unwrap();
    h.state.on_suspend().unwrap();

    let snapshot = store.load().unwrap().unwrap();
    assert_eq!(snapshot.run_state, RunState::Running);
    assert_eq!(snapshot.total_duration, 120);
    assert_eq!(snapshot.remaining_duration, 120);
    assert_eq!(snapshot.last_observed_wall_clock_time, Some(t0()));

    h.state.reset().unwrap();
    assert_eq!(store.load().unwrap(), None);
}

#[tokio::test(start_paused = true)]
async fn test_restore_running_snapshot_keeps_ticking() {
    let store = SnapshotStore::memory();
    store
        .save(&CountdownSnapshot {
            remaining_duration: 100,
            total_duration: 200,
            run_state: RunState::Running,
            last_observed_wall_clock_time: Some(t0() - chrono::Duration::seconds(40)),
        })
        .unwrap();

    let h = harness_with_store(store);
    let report = h.state.restore_from_store().unwrap().unwrap();
    assert_eq!(report.view.run_state, RunState::Running);
    assert_eq!(report.view.remaining_seconds, 60);

    sleep(Duration::from_millis(2500)).await;
    assert_eq!(h.state.view().unwrap().remaining_seconds, 58);
}

#[tokio::test(start_paused = true)]
async fn test_persist_then_restore_round_trip() {
    let store = SnapshotStore::memory();
    let first = harness_with_store(store.clone());
    first.state.configure(0, 5, 0).unwrap();
    first.state.start().unwrap();
    first.state.persist().unwrap();

    let second = harness_with_store(store);
    second.clock.advance(60);
    let report = second.state.restore_from_store().unwrap().unwrap();
    assert_eq!(report.view.remaining_seconds, 240);
}

#[tokio::test(start_paused = true)]
async fn test_subscribers_see_every_mutation() {
    let h = harness();
    let mut rx = h.state.subscribe();

    h.state.configure(0, 0, 4).unwrap();
    rx.changed().await.unwrap();
    assert_eq!(rx.borrow_and_update().formatted_time, "00:04");

    h.state.start().unwrap();
    rx.changed().await.unwrap();
    assert_eq!(rx.borrow_and_update().run_state, RunState::Running);

    rx.changed().await.unwrap();
    assert_eq!(rx.borrow_and_update().remaining_seconds, 3);
}

#[tokio::test(start_paused = true)]
async fn test_wake_up_recovery_subtracts_sleep() {
    let h = harness();
    h.state.configure(0, 10, 0).unwrap();
    h.state.start().unwrap();

    tokio::spawn(wake_up_recovery_task(
        Arc::clone(&h.state),
        Duration::from_secs(15),
        Duration::from_secs(5),
    ));
    sleep(Duration::from_millis(100)).await;

    // Host slept: wall clock jumps, monotonic time does not
    h.clock.advance(120);
    sleep(Duration::from_millis(15_400)).await;

    assert_eq!(h.state.view().unwrap().remaining_seconds, 600 - 15 - 105);
}

#[tokio::test(start_paused = true)]
async fn test_foreground_after_pause_does_not_reuse_old_snapshot() {
    let store = SnapshotStore::memory();
    let h = harness_with_store(store.clone());
    h.state.configure(0, 10, 0).unwrap();
    h.state.start().unwrap();

    h.state.on_suspend().unwrap();
    assert!(h.state.on_resume().unwrap().is_applied());
    assert_eq!(store.load().unwrap(), None);

    h.state.pause().unwrap();
    h.clock.advance(3600);
    h.state.resume().unwrap();

    let report = h.state.on_resume().unwrap();
    assert_eq!(report.outcome, Outcome::Ignored);
    assert_eq!(report.view.run_state, RunState::Running);
    assert_eq!(report.view.remaining_seconds, 600);
}

#[tokio::test(start_paused = true)]
async fn test_suspended_pause_discards_snapshot() {
    let store = SnapshotStore::memory();
    let h = harness_with_store(store.clone());
    h.state.configure(0, 10, 0).unwrap();
    h.state.start().unwrap();

    h.state.on_suspend().unwrap();
    h.state.pause().unwrap();
    assert_eq!(store.load().unwrap(), None);

    h.clock.advance(300);
    h.state.resume().unwrap();
    let report = h.state.on_resume().unwrap();
    assert_eq!(report.outcome, Outcome::Ignored);
    assert_eq!(report.view.remaining_seconds, 600);
}

#[tokio::test(start_paused = true)]
async fn test_restore_consumes_running_snapshot() {
    let store = SnapshotStore::memory();
    store
        .save(&CountdownSnapshot {
            remaining_duration: 100,
            total_duration: 200,
            run_state: RunState::Running,
            last_observed_wall_clock_time: Some(t0()),
        })
        .unwrap();

    let h = harness_with_store(store.clone());
    h.state.restore_from_store().unwrap();
    assert_eq!(store.load().unwrap(), None);

    h.clock.advance(50);
    let report = h.state.on_resume().unwrap();
    assert_eq!(report.outcome, Outcome::Ignored);
    assert_eq!(report.view.remaining_seconds, 100);
}

#[tokio::test(start_paused = true)]
async fn test_huge_duration_runs_without_scheduled_alert() {
    let h = harness();
    assert!(h.state.configure(u32::MAX, 59, 59).unwrap().is_applied());
    assert!(h.state.start().unwrap().is_applied());
    assert!(!h.state.has_pending_notification());

    sleep(Duration::from_millis(2500)).await;
    let view = h.state.view().unwrap();
    assert_eq!(view.run_state, RunState::Running);
    assert_eq!(view.remaining_seconds, u64::from(u32::MAX) * 3600 + 3599 - 2);

    assert!(h.state.pause().unwrap().is_applied());
    assert!(h.state.reset().unwrap().is_applied());
}
