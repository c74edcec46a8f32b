//! External collaborator module
//! 
//! This module contains the collaborators the countdown engine talks to:
//! notification dispatch and the snapshot key-value store.

pub mod notifier;
pub mod store;

// Re-export main types
pub use notifier::{check_notify_command_available, Alert, AlertSink, Notifier};
pub use store::SnapshotStore;
