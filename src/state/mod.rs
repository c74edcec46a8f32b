//! State management module
//! 
//! This module contains the countdown model, its persisted snapshot and the
//! shared engine state that drives them.

pub mod app_state;
pub mod countdown;
pub mod snapshot;

// Re-export main types
pub use app_state::{ActionReport, AppState, TickControl};
pub use countdown::{Countdown, CountdownView, Effect, Outcome, RunState, Transition};
pub use snapshot::CountdownSnapshot;
