//! Shared countdown engine state
//!
//! `AppState` owns the `Countdown`, performs the effects each transition asks
//! for and publishes a fresh `CountdownView` to subscribers after every
//! mutation.

use std::{
    sync::{Arc, Mutex},
    time::Instant,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::{Countdown, CountdownSnapshot, CountdownView, Effect, Outcome, Transition};
use crate::{
    services::{Notifier, SnapshotStore},
    utils::{clock::Clock, format::format_uptime},
};

/// Control word for the tick source. A new `epoch` restarts the one-second
/// cadence from that moment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickControl {
    pub running: bool,
    pub epoch: u64,
}

/// What a control operation did, and where it left the countdown
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionReport {
    pub outcome: Outcome,
    pub view: CountdownView,
    /// Engine time the operation ran at
    pub at: DateTime<Utc>,
}

impl ActionReport {
    pub fn is_applied(&self) -> bool {
        self.outcome == Outcome::Applied
    }
}

/// Main application state: the countdown plus its collaborators
#[derive(Debug)]
pub struct AppState {
    countdown: Mutex<Countdown>,
    clock: Arc<dyn Clock>,
    notifier: Notifier,
    store: SnapshotStore,
    /// Tick source control
    tick_tx: watch::Sender<TickControl>,
    _tick_rx: watch::Receiver<TickControl>,
    /// Subscribers to countdown changes
    view_tx: watch::Sender<CountdownView>,
    _view_rx: watch::Receiver<CountdownView>,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    last_action: Mutex<Option<(String, DateTime<Utc>)>>,
}

impl AppState {
    /// Create a new AppState with an unconfigured countdown
    pub fn new(
        port: u16,
        host: String,
        clock: Arc<dyn Clock>,
        notifier: Notifier,
        store: SnapshotStore,
    ) -> Self {
        let countdown = Countdown::new();
        let (tick_tx, tick_rx) = watch::channel(TickControl::default());
        let (view_tx, view_rx) = watch::channel(countdown.view());

        Self {
            countdown: Mutex::new(countdown),
            clock,
            notifier,
            store,
            tick_tx,
            _tick_rx: tick_rx,
            view_tx,
            _view_rx: view_rx,
            start_time: Instant::now(),
            port,
            host,
            last_action: Mutex::new(None),
        }
    }

    /// Current wall-clock time as seen by the engine
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn configure(&self, hours: u32, minutes: u32, seconds: u32) -> Result<ActionReport, String> {
        info!("Configuring countdown to {}h {}m {}s", hours, minutes, seconds);
        self.apply("configure", |countdown, _| countdown.configure(hours, minutes, seconds))
    }

    pub fn start(&self) -> Result<ActionReport, String> {
        self.apply("start", |countdown, now| countdown.start(now))
    }

    pub fn pause(&self) -> Result<ActionReport, String> {
        self.apply("pause", |countdown, _| countdown.pause())
    }

    pub fn resume(&self) -> Result<ActionReport, String> {
        self.apply("resume", |countdown, now| countdown.resume(now))
    }

    pub fn reset(&self) -> Result<ActionReport, String> {
        self.apply("reset", |countdown, _| countdown.reset())
    }

    /// One tick from the tick source
    pub fn tick(&self) -> Result<ActionReport, String> {
        self.apply_quiet(|countdown, _| countdown.tick())
    }

    /// Host is going to the background
    pub fn on_suspend(&self) -> Result<ActionReport, String> {
        self.apply("suspend", |countdown, now| countdown.on_suspend(now))
    }

    /// Host is back in the foreground
    pub fn on_resume(&self) -> Result<ActionReport, String> {
        let stored = self.load_snapshot();
        self.apply("foreground", |countdown, now| countdown.on_resume(now, stored.as_ref()))
    }

    /// Subtract time the host spent asleep
    pub fn reconcile_gap(&self, gap_seconds: u64) -> Result<ActionReport, String> {
        self.apply_quiet(|countdown, now| countdown.reconcile_gap(gap_seconds, now))
    }

    /// Rebuild the countdown from the snapshot store, if it holds anything
    pub fn restore_from_store(&self) -> Result<Option<ActionReport>, String> {
        let Some(snapshot) = self.load_snapshot() else {
            debug!("No stored snapshot to restore");
            return Ok(None);
        };

        info!(
            "Restoring {} countdown with {}s of {}s remaining",
            snapshot.run_state, snapshot.remaining_duration, snapshot.total_duration
        );
        let report = self.apply("restore", |countdown, now| {
            let (restored, effects) = Countdown::restore(&snapshot, now);
            *countdown = restored;
            Transition {
                outcome: Outcome::Applied,
                effects,
            }
        })?;
        Ok(Some(report))
    }

    /// Persist the countdown before the daemon exits
    pub fn persist(&self) -> Result<(), String> {
        let report = self.on_suspend()?;
        if report.is_applied() {
            return Ok(());
        }

        let snapshot = self.lock_countdown()?.snapshot();
        self.store.save(&snapshot)
    }

    /// Current read model
    pub fn view(&self) -> Result<CountdownView, String> {
        self.lock_countdown().map(|countdown| countdown.view())
    }

    /// Copy of the countdown itself
    pub fn countdown(&self) -> Result<Countdown, String> {
        self.lock_countdown().map(|countdown| countdown.clone())
    }

    /// Watch every mutation of the countdown
    pub fn subscribe(&self) -> watch::Receiver<CountdownView> {
        self.view_tx.subscribe()
    }

    /// Receiver used by the tick source
    pub fn subscribe_tick_control(&self) -> watch::Receiver<TickControl> {
        self.tick_tx.subscribe()
    }

    pub fn tick_control(&self) -> TickControl {
        *self.tick_tx.borrow()
    }

    /// Whether a completion alert is waiting to fire
    pub fn has_pending_notification(&self) -> bool {
        self.notifier.has_pending()
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        format_uptime(self.start_time.elapsed().as_secs())
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        match self.last_action.lock().ok().and_then(|last| last.clone()) {
            Some((action, at)) => (Some(action), Some(at)),
            None => (None, None),
        }
    }

    /// Run a user-facing operation and record it as the last action
    fn apply<F>(&self, action: &str, op: F) -> Result<ActionReport, String>
    where
        F: FnOnce(&mut Countdown, DateTime<Utc>) -> Transition,
    {
        let report = self.apply_quiet(op)?;

        if report.is_applied() {
            info!("Countdown {} applied: {} ({})", action, report.view.formatted_time, report.view.run_state);
            if let Ok(mut last_action) = self.last_action.lock() {
                *last_action = Some((action.to_string(), report.at));
            }
        } else {
            debug!("Countdown {} ignored in state {}", action, report.view.run_state);
        }

        Ok(report)
    }

    fn apply_quiet<F>(&self, op: F) -> Result<ActionReport, String>
    where
        F: FnOnce(&mut Countdown, DateTime<Utc>) -> Transition,
    {
        let now = self.clock.now();
        let mut countdown = self.lock_countdown()?;

        let transition = op(&mut countdown, now);
        let view = countdown.view();

        // Effects run under the countdown lock so a racing operation cannot
        // interleave its own tick or notification changes
        for effect in transition.effects {
            self.perform(effect, now);
        }
        drop(countdown);

        if transition.outcome == Outcome::Applied {
            self.view_tx.send_replace(view.clone());
        }

        Ok(ActionReport {
            outcome: transition.outcome,
            view,
            at: now,
        })
    }

    fn perform(&self, effect: Effect, now: DateTime<Utc>) {
        match effect {
            Effect::StartTicking => self.tick_tx.send_modify(|control| {
                control.running = true;
                control.epoch += 1;
            }),
            Effect::StopTicking => {
                self.tick_tx.send_if_modified(|control| {
                    let was_running = control.running;
                    control.running = false;
                    was_running
                });
            }
            Effect::ScheduleCompletion { due } => {
                if let Err(e) = self.notifier.schedule_completion(due, now) {
                    warn!("Failed to schedule completion alert: {}", e);
                }
            }
            Effect::CancelNotifications => {
                if let Err(e) = self.notifier.cancel_all() {
                    warn!("Failed to cancel pending alerts: {}", e);
                }
            }
            Effect::CancelPending => {
                if let Err(e) = self.notifier.cancel_pending() {
                    warn!("Failed to cancel pending alert: {}", e);
                }
            }
            Effect::Complete => {
                info!("Countdown finished");
                if let Err(e) = self.notifier.fire_completion() {
                    warn!("Failed to fire completion alert: {}", e);
                }
            }
            Effect::SaveSnapshot(snapshot) => {
                if let Err(e) = self.store.save(&snapshot) {
                    warn!("Failed to save snapshot: {}", e);
                }
            }
            Effect::ClearSnapshot => {
                if let Err(e) = self.store.clear() {
                    warn!("Failed to clear snapshot: {}", e);
                }
            }
        }
    }

    fn load_snapshot(&self) -> Option<CountdownSnapshot> {
        self.store.load().unwrap_or_else(|e| {
            warn!("Failed to load snapshot: {}", e);
            None
        })
    }

    fn lock_countdown(&self) -> Result<std::sync::MutexGuard<'_, Countdown>, String> {
        self.countdown
            .lock()
            .map_err(|e| format!("Failed to lock countdown: {}", e))
    }
}
