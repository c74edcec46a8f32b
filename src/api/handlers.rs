//! HTTP endpoint handlers

use std::sync::Arc;
use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use tracing::error;

use crate::state::{ActionReport, AppState};
use super::responses::{ApiResponse, ConfigureRequest, HealthResponse, StatusResponse};

type ControlResult = Result<Json<ApiResponse>, StatusCode>;

/// Turn an engine result into a control response
fn control_response(
    action: &str,
    result: Result<ActionReport, String>,
    applied: &str,
    ignored: &str,
) -> ControlResult {
    match result {
        Ok(report) => Ok(Json(ApiResponse::from_report(report, applied, ignored))),
        Err(e) => {
            error!("Failed to {} countdown: {}", action, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle POST /configure - Set a new duration
pub async fn configure_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ConfigureRequest>,
) -> ControlResult {
    control_response(
        "configure",
        state.configure(request.hours, request.minutes, request.seconds),
        "Countdown configured",
        "Configuration ignored: duration is zero or a countdown is active",
    )
}

/// Handle POST /start - Start the countdown
pub async fn start_handler(State(state): State<Arc<AppState>>) -> ControlResult {
    control_response(
        "start",
        state.start(),
        "Countdown started",
        "Start ignored: no time remaining or already running",
    )
}

/// Handle POST /pause - Pause a running countdown
pub async fn pause_handler(State(state): State<Arc<AppState>>) -> ControlResult {
    control_response(
        "pause",
        state.pause(),
        "Countdown paused",
        "Pause ignored: countdown is not running",
    )
}

/// Handle POST /resume - Resume a paused countdown
pub async fn resume_handler(State(state): State<Arc<AppState>>) -> ControlResult {
    control_response(
        "resume",
        state.resume(),
        "Countdown resumed",
        "Resume ignored: countdown is not paused",
    )
}

/// Handle POST /reset - Back to the configured duration
pub async fn reset_handler(State(state): State<Arc<AppState>>) -> ControlResult {
    control_response("reset", state.reset(), "Countdown reset", "Reset ignored")
}

/// Handle POST /lifecycle/suspend - Host went to the background
pub async fn suspend_handler(State(state): State<Arc<AppState>>) -> ControlResult {
    control_response(
        "suspend",
        state.on_suspend(),
        "Suspend recorded",
        "Suspend ignored: countdown is not running",
    )
}

/// Handle POST /lifecycle/resume - Host came back to the foreground
pub async fn foreground_handler(State(state): State<Arc<AppState>>) -> ControlResult {
    control_response(
        "reconcile",
        state.on_resume(),
        "Countdown reconciled with the wall clock",
        "Foreground ignored: no suspended running countdown",
    )
}

/// Handle GET /status - Return current countdown status
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Result<Json<StatusResponse>, StatusCode> {
    let countdown = match state.view() {
        Ok(view) => view,
        Err(e) => {
            error!("Failed to read countdown: {}", e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let (last_action, last_action_time) = state.get_last_action();

    Ok(Json(StatusResponse {
        countdown,
        notification_pending: state.has_pending_notification(),
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    }))
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
