//! Countdown tick source

use std::{sync::Arc, time::Duration};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::state::AppState;

const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Background task that advances the countdown once per second while it runs.
///
/// This is the only tick source. It follows the engine's `TickControl`: every
/// new epoch restarts the cadence, and a stop disarms it until the next start.
pub async fn countdown_ticker_task(state: Arc<AppState>) {
    info!("Starting countdown ticker task");

    let mut control_rx = state.subscribe_tick_control();

    loop {
        let control = *control_rx.borrow_and_update();

        if !control.running {
            // Wait for the countdown to start
            if control_rx.changed().await.is_err() {
                break;
            }
            continue;
        }

        debug!("Tick source armed for epoch {}", control.epoch);
        let mut interval = interval_at(Instant::now() + TICK_PERIOD, TICK_PERIOD);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = state.tick() {
                        error!("Failed to advance countdown: {}", e);
                    }
                }

                // Start, pause, reset or completion: re-read the control word
                changed = control_rx.changed() => {
                    if changed.is_err() {
                        info!("Tick control closed, stopping ticker task");
                        return;
                    }
                    break;
                }
            }
        }
    }

    info!("Countdown ticker task finished");
}
