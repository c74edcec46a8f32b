//! API request and response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::state::{ActionReport, CountdownView, Outcome};

/// Body of POST /configure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigureRequest {
    #[serde(default)]
    pub hours: u32,
    #[serde(default)]
    pub minutes: u32,
    #[serde(default)]
    pub seconds: u32,
}

/// API response structure for control endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: Outcome,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub countdown: CountdownView,
}

impl ApiResponse {
    /// Create a new API response
    pub fn new(
        status: Outcome,
        message: String,
        timestamp: DateTime<Utc>,
        countdown: CountdownView,
    ) -> Self {
        Self {
            status,
            message,
            timestamp,
            countdown,
        }
    }

    /// Build a response from an engine report, picking the matching message.
    /// The timestamp is the engine's time for the operation.
    pub fn from_report(report: ActionReport, applied: &str, ignored: &str) -> Self {
        let message = match report.outcome {
            Outcome::Applied => applied,
            Outcome::Ignored => ignored,
        };
        Self::new(report.outcome, message.to_string(), report.at, report.view)
    }
}

/// Status response with countdown and server information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub countdown: CountdownView,
    pub notification_pending: bool,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    /// Create a new health response
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
