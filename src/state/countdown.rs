//! Countdown state machine
//!
//! Pure model of the single countdown. Nothing in here touches a clock, the
//! tick source or the notifier: transitions take the current wall-clock time
//! as an argument and hand back the side effects the caller has to carry out.

use std::fmt;

use chrono::{DateTime, Duration as WallDuration, Utc};
use serde::{Deserialize, Serialize};

use super::CountdownSnapshot;
use crate::utils::format::format_remaining;

/// Run state of the countdown
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    #[default]
    Idle,
    Running,
    Paused,
    Completed,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Idle => "idle",
            RunState::Running => "running",
            RunState::Paused => "paused",
            RunState::Completed => "completed",
        };
        f.write_str(name)
    }
}

/// Side effect requested by a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Arm the one-second tick source from this instant
    StartTicking,
    /// Disarm the tick source
    StopTicking,
    /// Replace any pending completion alert with one due at `due`
    ScheduleCompletion { due: DateTime<Utc> },
    /// Drop every pending alert and start a fresh run
    CancelNotifications,
    /// Drop the pending alert but remember whether this run already alerted
    CancelPending,
    /// Fire the completion signal now
    Complete,
    SaveSnapshot(CountdownSnapshot),
    ClearSnapshot,
}

/// Whether a guarded operation changed anything
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Applied,
    Ignored,
}

/// Result of a single operation on the countdown
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub outcome: Outcome,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn applied(effects: Vec<Effect>) -> Self {
        Self {
            outcome: Outcome::Applied,
            effects,
        }
    }

    fn ignored() -> Self {
        Self {
            outcome: Outcome::Ignored,
            effects: Vec::new(),
        }
    }

    pub fn is_applied(&self) -> bool {
        self.outcome == Outcome::Applied
    }
}

/// Read model handed to subscribers and the HTTP layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountdownView {
    pub run_state: RunState,
    pub total_seconds: u64,
    pub remaining_seconds: u64,
    pub formatted_time: String,
    pub progress: f64,
}

/// The countdown itself
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Countdown {
    total_duration: u64,
    remaining_duration: u64,
    run_state: RunState,
    last_observed_wall_clock_time: Option<DateTime<Utc>>,
    /// Remaining seconds captured together with the wall-clock mark
    remaining_at_suspend: Option<u64>,
}

impl Countdown {
    /// Create an unconfigured countdown
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_duration(&self) -> u64 {
        self.total_duration
    }

    pub fn remaining_duration(&self) -> u64 {
        self.remaining_duration
    }

    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    pub fn last_observed_wall_clock_time(&self) -> Option<DateTime<Utc>> {
        self.last_observed_wall_clock_time
    }

    /// Set a new duration from the picker values.
    ///
    /// Ignored for an all-zero duration and while a countdown is active.
    pub fn configure(&mut self, hours: u32, minutes: u32, seconds: u32) -> Transition {
        let total = u64::from(hours) * 3600 + u64::from(minutes) * 60 + u64::from(seconds);
        if total == 0 || matches!(self.run_state, RunState::Running | RunState::Paused) {
            return Transition::ignored();
        }

        self.total_duration = total;
        self.remaining_duration = total;
        self.run_state = RunState::Idle;
        self.clear_suspend_mark();
        Transition::applied(vec![Effect::CancelNotifications, Effect::ClearSnapshot])
    }

    pub fn start(&mut self, now: DateTime<Utc>) -> Transition {
        if self.remaining_duration == 0
            || !matches!(self.run_state, RunState::Idle | RunState::Paused)
        {
            return Transition::ignored();
        }

        self.run_state = RunState::Running;
        self.clear_suspend_mark();

        let mut effects = vec![Effect::StartTicking, Effect::ClearSnapshot];
        effects.extend(self.schedule_completion(now));
        Transition::applied(effects)
    }

    pub fn pause(&mut self) -> Transition {
        if self.run_state != RunState::Running {
            return Transition::ignored();
        }

        self.run_state = RunState::Paused;
        self.clear_suspend_mark();
        Transition::applied(vec![
            Effect::StopTicking,
            Effect::CancelPending,
            Effect::ClearSnapshot,
        ])
    }

    pub fn resume(&mut self, now: DateTime<Utc>) -> Transition {
        if self.run_state != RunState::Paused {
            return Transition::ignored();
        }
        self.start(now)
    }

    /// Back to `Idle` with the full configured duration. Valid from any state.
    pub fn reset(&mut self) -> Transition {
        self.remaining_duration = self.total_duration;
        self.run_state = RunState::Idle;
        self.clear_suspend_mark();
        Transition::applied(vec![
            Effect::StopTicking,
            Effect::CancelNotifications,
            Effect::ClearSnapshot,
        ])
    }

    /// One-second advancement. Does nothing unless running, so a tick that
    /// races a pause or reset is dropped.
    pub fn tick(&mut self) -> Transition {
        if self.run_state != RunState::Running {
            return Transition::ignored();
        }

        self.remaining_duration = self.remaining_duration.saturating_sub(1);
        if self.remaining_duration == 0 {
            return self.complete();
        }
        Transition::applied(Vec::new())
    }

    /// Host is going to the background: remember when, and persist.
    pub fn on_suspend(&mut self, now: DateTime<Utc>) -> Transition {
        if self.run_state != RunState::Running {
            return Transition::ignored();
        }

        self.last_observed_wall_clock_time = Some(now);
        self.remaining_at_suspend = Some(self.remaining_duration);
        Transition::applied(vec![Effect::SaveSnapshot(self.snapshot())])
    }

    /// Host is back in the foreground: recompute remaining time from the wall
    /// clock. `stored` is consulted when no in-memory suspend mark exists.
    pub fn on_resume(
        &mut self,
        now: DateTime<Utc>,
        stored: Option<&CountdownSnapshot>,
    ) -> Transition {
        if self.run_state != RunState::Running {
            return Transition::ignored();
        }

        let mark = match (self.last_observed_wall_clock_time, self.remaining_at_suspend) {
            (Some(observed_at), Some(remaining)) => Some((observed_at, remaining)),
            _ => stored
                .filter(|snapshot| snapshot.run_state == RunState::Running)
                .and_then(|snapshot| {
                    snapshot
                        .last_observed_wall_clock_time
                        .map(|observed_at| (observed_at, snapshot.remaining_duration))
                }),
        };
        let Some((observed_at, remaining)) = mark else {
            return Transition::ignored();
        };

        self.clear_suspend_mark();
        let elapsed = elapsed_seconds(observed_at, now);
        self.remaining_duration = remaining
            .saturating_sub(elapsed)
            .min(self.total_duration);

        if self.remaining_duration == 0 {
            return self.complete();
        }

        // The mark is consumed; a later foreground must not reuse it
        let mut effects = vec![Effect::ClearSnapshot];
        effects.extend(self.schedule_completion(now));
        Transition::applied(effects)
    }

    /// Subtract time the host spent asleep without the tick source firing.
    pub fn reconcile_gap(&mut self, gap_seconds: u64, now: DateTime<Utc>) -> Transition {
        if self.run_state != RunState::Running || gap_seconds == 0 {
            return Transition::ignored();
        }

        self.remaining_duration = self.remaining_duration.saturating_sub(gap_seconds);
        if self.remaining_duration == 0 {
            return self.complete();
        }
        Transition::applied(self.schedule_completion(now).into_iter().collect())
    }

    /// Rebuild a countdown from a stored snapshot, reconciling a running one
    /// against the wall clock.
    pub fn restore(snapshot: &CountdownSnapshot, now: DateTime<Utc>) -> (Self, Vec<Effect>) {
        let mut countdown = Self {
            total_duration: snapshot.total_duration,
            remaining_duration: snapshot.remaining_duration.min(snapshot.total_duration),
            run_state: snapshot.run_state,
            ..Self::default()
        };

        let effects = match snapshot.run_state {
            RunState::Running => {
                let elapsed = snapshot
                    .last_observed_wall_clock_time
                    .map(|observed_at| elapsed_seconds(observed_at, now))
                    .unwrap_or(0);
                countdown.remaining_duration = countdown.remaining_duration.saturating_sub(elapsed);

                if countdown.remaining_duration == 0 {
                    countdown.complete().effects
                } else {
                    let mut effects = vec![Effect::StartTicking, Effect::ClearSnapshot];
                    effects.extend(countdown.schedule_completion(now));
                    effects
                }
            }
            RunState::Paused if countdown.remaining_duration == 0 => {
                countdown.run_state = RunState::Completed;
                Vec::new()
            }
            RunState::Completed => {
                countdown.remaining_duration = 0;
                Vec::new()
            }
            RunState::Idle | RunState::Paused => Vec::new(),
        };

        (countdown, effects)
    }

    pub fn snapshot(&self) -> CountdownSnapshot {
        CountdownSnapshot {
            remaining_duration: self.remaining_duration,
            total_duration: self.total_duration,
            run_state: self.run_state,
            last_observed_wall_clock_time: self.last_observed_wall_clock_time,
        }
    }

    /// `HH:MM:SS` from one hour up, `MM:SS` below
    pub fn formatted_time(&self) -> String {
        format_remaining(self.remaining_duration)
    }

    /// Completed fraction in `[0, 1]`
    pub fn progress(&self) -> f64 {
        if self.total_duration == 0 {
            return 0.0;
        }
        1.0 - (self.remaining_duration as f64 / self.total_duration as f64)
    }

    pub fn view(&self) -> CountdownView {
        CountdownView {
            run_state: self.run_state,
            total_seconds: self.total_duration,
            remaining_seconds: self.remaining_duration,
            formatted_time: self.formatted_time(),
            progress: self.progress(),
        }
    }

    fn complete(&mut self) -> Transition {
        self.remaining_duration = 0;
        self.run_state = RunState::Completed;
        self.clear_suspend_mark();
        Transition::applied(vec![
            Effect::StopTicking,
            Effect::Complete,
            Effect::ClearSnapshot,
        ])
    }

    fn clear_suspend_mark(&mut self) {
        self.last_observed_wall_clock_time = None;
        self.remaining_at_suspend = None;
    }

    /// Alert due when the remaining time runs out. `None` when that instant
    /// is past what a timestamp can hold; the tick source still completes
    /// the countdown.
    fn schedule_completion(&self, now: DateTime<Utc>) -> Option<Effect> {
        let remaining = i64::try_from(self.remaining_duration).ok()?;
        let due = now.checked_add_signed(WallDuration::try_seconds(remaining)?)?;
        Some(Effect::ScheduleCompletion { due })
    }
}

/// Whole seconds between two wall-clock readings; a clock that went
/// backwards counts as no time at all.
fn elapsed_seconds(from: DateTime<Utc>, to: DateTime<Utc>) -> u64 {
    (to - from).num_seconds().max(0) as u64
}
