//! Signal handling for graceful shutdown and host lifecycle events

use std::sync::Arc;
use signal_hook::consts::{SIGINT, SIGTERM, SIGUSR1, SIGUSR2};
use signal_hook_tokio::Signals;
use futures::stream::StreamExt;
use tracing::{info, warn};

use crate::state::AppState;

/// Wait for shutdown signals (SIGTERM, SIGINT)
pub async fn shutdown_signal() -> Result<i32, String> {
    let mut signals = Signals::new([SIGTERM, SIGINT])
        .map_err(|e| format!("Failed to create signal handler: {}", e))?;

    signals
        .next()
        .await
        .ok_or_else(|| "Signal stream closed".to_string())
}

/// Map lifecycle signals onto the engine: SIGUSR1 means the host went to the
/// background, SIGUSR2 that it came back.
pub async fn lifecycle_signal_task(state: Arc<AppState>) {
    let mut signals = match Signals::new([SIGUSR1, SIGUSR2]) {
        Ok(signals) => signals,
        Err(e) => {
            warn!("Lifecycle signals unavailable: {}", e);
            return;
        }
    };

    info!("Listening for lifecycle signals (SIGUSR1 suspend, SIGUSR2 resume)");
    while let Some(signal) = signals.next().await {
        let result = match signal {
            SIGUSR1 => state.on_suspend(),
            SIGUSR2 => state.on_resume(),
            _ => continue,
        };

        if let Err(e) = result {
            warn!("Failed to handle lifecycle signal {}: {}", signal, e);
        }
    }
}
