//! Countdown Daemon - a single countdown timer with completion notifications
//! 
//! This library provides the countdown engine (configure, start, pause,
//! resume, reset), its one-second tick source, wall-clock reconciliation
//! after suspend or host sleep, and the notification and snapshot
//! collaborators it drives.

pub mod config;
pub mod state;
pub mod api;
pub mod services;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use state::{AppState, Countdown, CountdownView, RunState};
pub use api::create_router;
pub use utils::signals::shutdown_signal;
