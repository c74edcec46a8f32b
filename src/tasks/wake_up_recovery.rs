//! Wake-up recovery background task

use std::{sync::Arc, time::Duration};
use tokio::time::{interval, Instant};
use tracing::{debug, info, warn};

use crate::state::AppState;

/// Seconds of wall-clock time that passed without the monotonic clock
/// noticing, i.e. time the host spent asleep
pub fn sleep_gap(wall_elapsed: chrono::Duration, monotonic_elapsed: Duration) -> u64 {
    let wall = wall_elapsed.num_seconds().max(0) as u64;
    wall.saturating_sub(monotonic_elapsed.as_secs())
}

/// Background task that detects host sleep and reconciles the countdown.
///
/// The tick source runs on the monotonic clock, which stands still while the
/// host sleeps, so the missed seconds only show up on the wall clock.
pub async fn wake_up_recovery_task(state: Arc<AppState>, check_every: Duration, threshold: Duration) {
    info!("Starting wake-up recovery task");

    let mut interval = interval(check_every);
    interval.tick().await;

    let mut last_wall = state.now();
    let mut last_monotonic = Instant::now();

    loop {
        interval.tick().await;

        let wall = state.now();
        let monotonic = Instant::now();
        let gap = sleep_gap(wall - last_wall, monotonic.duration_since(last_monotonic));
        last_wall = wall;
        last_monotonic = monotonic;

        if gap == 0 || gap < threshold.as_secs() {
            continue;
        }

        info!("Host wake-up detected after {}s asleep, reconciling countdown", gap);
        match state.reconcile_gap(gap) {
            Ok(report) if report.is_applied() => {
                info!("Countdown reconciled to {}", report.view.formatted_time);
            }
            Ok(_) => debug!("No running countdown to reconcile"),
            Err(e) => warn!("Failed to reconcile countdown after wake-up: {}", e),
        }
    }
}
