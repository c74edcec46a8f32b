//! Countdown Daemon - a single countdown timer with completion notifications
//! 
//! This is the main entry point for the countdown-daemon application.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

use countdown_daemon::{
    api::create_router,
    config::{Config, NotifierKind},
    services::{check_notify_command_available, AlertSink, Notifier},
    state::AppState,
    tasks::{countdown_ticker_task, wake_up_recovery_task},
    utils::{lifecycle_signal_task, shutdown_signal, SystemClock},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("countdown_daemon={},tower_http=info", config.log_level()))
        .init();

    info!("Starting countdown-daemon v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: host={}, port={}, snapshot={}",
          config.host, config.port,
          if config.memory_snapshot { "memory".to_string() } else { config.snapshot.display().to_string() });

    // Fall back to log-only alerts when the desktop notifier is missing
    let sink = if config.notifier == NotifierKind::Command {
        match check_notify_command_available(&config.notify_command).await {
            Ok(()) => config.alert_sink(),
            Err(e) => {
                warn!("{}, alerts will only be logged", e);
                AlertSink::Log
            }
        }
    } else {
        config.alert_sink()
    };

    // Create application state
    let state = Arc::new(AppState::new(
        config.port,
        config.host.clone(),
        Arc::new(SystemClock),
        Notifier::new(sink),
        config.snapshot_store(),
    ));

    // Start the single tick source before restoring, so a running snapshot resumes ticking
    let ticker_state = Arc::clone(&state);
    tokio::spawn(async move {
        countdown_ticker_task(ticker_state).await;
    });

    if let Err(e) = state.restore_from_store() {
        warn!("Failed to restore countdown: {}", e);
    }

    let wake_state = Arc::clone(&state);
    let (check_every, threshold) = (config.wake_check_interval(), config.wake_threshold());
    tokio::spawn(async move {
        wake_up_recovery_task(wake_state, check_every, threshold).await;
    });

    let lifecycle_state = Arc::clone(&state);
    tokio::spawn(async move {
        lifecycle_signal_task(lifecycle_state).await;
    });

    // Create HTTP router with all endpoints
    let app = create_router(Arc::clone(&state));

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /configure         - Set hours/minutes/seconds");
    info!("  POST /start             - Start the countdown");
    info!("  POST /pause             - Pause the countdown");
    info!("  POST /resume            - Resume a paused countdown");
    info!("  POST /reset             - Reset to the configured duration");
    info!("  POST /lifecycle/suspend - Host went to the background");
    info!("  POST /lifecycle/resume  - Host came back to the foreground");
    info!("  GET  /status            - Current countdown");
    info!("  GET  /health            - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        signal = shutdown_signal() => {
            match signal {
                Ok(signal) => info!("Shutdown signal {} received", signal),
                Err(e) => tracing::error!("{}", e),
            }
        }
    }

    if let Err(e) = state.persist() {
        warn!("Failed to persist countdown on shutdown: {}", e);
    }

    info!("Server shutdown complete");
    Ok(())
}
