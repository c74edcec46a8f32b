//! Completion notification dispatch
//!
//! At most one completion alert is pending at any time: scheduling a new one
//! aborts the previous timer task, and firing the completion signal consumes
//! whatever is pending so the user is alerted exactly once.

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::{process::Command, sync::mpsc, task::JoinHandle, time::sleep};
use tracing::{debug, info, warn};

pub const COMPLETION_TITLE: &str = "Countdown Finished";
pub const COMPLETION_BODY: &str = "Your configured time has elapsed.";

/// A user-visible alert
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub title: String,
    pub body: String,
}

impl Alert {
    pub fn completion() -> Self {
        Self {
            title: COMPLETION_TITLE.to_string(),
            body: COMPLETION_BODY.to_string(),
        }
    }
}

/// Where alerts end up
#[derive(Debug, Clone)]
pub enum AlertSink {
    /// Only write the alert to the log
    Log,
    /// Run a desktop notification command as `<program> <title> <body>`
    Command { program: String },
    /// Hand the alert to an in-process receiver
    Channel(mpsc::UnboundedSender<Alert>),
}

impl AlertSink {
    /// Deliver a single alert
    pub async fn deliver(&self, alert: &Alert) -> Result<(), String> {
        match self {
            AlertSink::Log => {
                info!(title = %alert.title, body = %alert.body, "Alert");
                Ok(())
            }
            AlertSink::Command { program } => {
                let output = Command::new(program)
                    .args([&alert.title, &alert.body])
                    .output()
                    .await
                    .map_err(|e| format!("Failed to execute {}: {}", program, e))?;

                if !output.status.success() {
                    let stderr = String::from_utf8_lossy(&output.stderr);
                    return Err(format!("{} failed: {}", program, stderr));
                }
                Ok(())
            }
            AlertSink::Channel(tx) => tx
                .send(alert.clone())
                .map_err(|_| "Alert receiver dropped".to_string()),
        }
    }
}

/// Check that a notification command can be executed on this host
pub async fn check_notify_command_available(program: &str) -> Result<(), String> {
    Command::new(program)
        .arg("--version")
        .output()
        .await
        .map_err(|_| format!("{} is not available on this host", program))?;

    info!("{} is available", program);
    Ok(())
}

#[derive(Debug, Default)]
struct Slot {
    /// Bumped on every schedule/cancel so stale timer tasks stand down
    generation: u64,
    pending: Option<JoinHandle<()>>,
    /// The completion alert for the current run already went out
    alerted: bool,
}

impl Slot {
    fn abort_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
        self.generation += 1;
    }
}

/// Schedules, cancels and fires the completion alert
#[derive(Debug, Clone)]
pub struct Notifier {
    sink: AlertSink,
    slot: Arc<Mutex<Slot>>,
}

impl Notifier {
    pub fn new(sink: AlertSink) -> Self {
        Self {
            sink,
            slot: Arc::new(Mutex::new(Slot::default())),
        }
    }

    /// Replace any pending completion alert with one due at `due`. Nothing
    /// is scheduled once the current run has alerted.
    /// Must be called from within a tokio runtime.
    pub fn schedule_completion(&self, due: DateTime<Utc>, now: DateTime<Utc>) -> Result<(), String> {
        let delay = (due - now).to_std().unwrap_or(Duration::ZERO);

        let mut slot = self.lock_slot()?;
        slot.abort_pending();
        if slot.alerted {
            debug!("Completion alert already delivered for this run");
            return Ok(());
        }
        let generation = slot.generation;

        let sink = self.sink.clone();
        let slot_ref = Arc::clone(&self.slot);
        slot.pending = Some(tokio::spawn(async move {
            sleep(delay).await;
            {
                let Ok(mut slot) = slot_ref.lock() else {
                    return;
                };
                if slot.generation != generation {
                    return;
                }
                slot.pending = None;
                slot.alerted = true;
            }
            deliver(&sink, &Alert::completion()).await;
        }));

        debug!("Completion alert scheduled in {}s", delay.as_secs());
        Ok(())
    }

    /// Drop the pending alert, keeping the current run's alerted state
    pub fn cancel_pending(&self) -> Result<(), String> {
        let mut slot = self.lock_slot()?;
        if slot.pending.is_some() {
            debug!("Cancelling pending completion alert");
        }
        slot.abort_pending();
        Ok(())
    }

    /// Drop any pending alert and start a fresh run
    pub fn cancel_all(&self) -> Result<(), String> {
        let mut slot = self.lock_slot()?;
        if slot.pending.is_some() {
            debug!("Cancelling pending completion alert");
        }
        slot.abort_pending();
        slot.alerted = false;
        Ok(())
    }

    /// Fire the completion signal. Skipped when this run already alerted.
    pub fn fire_completion(&self) -> Result<(), String> {
        let already_alerted = {
            let mut slot = self.lock_slot()?;
            slot.abort_pending();
            std::mem::replace(&mut slot.alerted, true)
        };

        if already_alerted {
            debug!("Completion alert already delivered by its schedule");
            return Ok(());
        }

        let sink = self.sink.clone();
        tokio::spawn(async move {
            deliver(&sink, &Alert::completion()).await;
        });
        Ok(())
    }

    /// Whether a completion alert is waiting to fire
    pub fn has_pending(&self) -> bool {
        self.slot
            .lock()
            .map(|slot| slot.pending.is_some())
            .unwrap_or(false)
    }

    fn lock_slot(&self) -> Result<std::sync::MutexGuard<'_, Slot>, String> {
        self.slot
            .lock()
            .map_err(|e| format!("Failed to lock notification slot: {}", e))
    }
}

async fn deliver(sink: &AlertSink, alert: &Alert) {
    match sink.deliver(alert).await {
        Ok(()) => info!("Delivered alert: {}", alert.title),
        Err(e) => warn!("Failed to deliver alert: {}", e),
    }
}
