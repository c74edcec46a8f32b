//! Utility functions module
//! 
//! This module contains utility functions used throughout the application.

pub mod clock;
pub mod format;
pub mod signals;

// Re-export main functions
pub use clock::{Clock, ManualClock, SystemClock};
pub use signals::{lifecycle_signal_task, shutdown_signal};
