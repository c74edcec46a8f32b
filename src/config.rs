//! Configuration and CLI argument handling

use std::{path::PathBuf, time::Duration};
use clap::{Parser, ValueEnum};

use crate::services::{AlertSink, SnapshotStore};

/// How completion alerts are delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum NotifierKind {
    /// Write alerts to the log only
    Log,
    /// Run the desktop notification command
    Command,
}

/// CLI argument parsing structure
#[derive(Debug, Parser)]
#[command(name = "countdown-daemon")]
#[command(about = "A single countdown timer with completion notifications")]
#[command(version)]
pub struct Config {
    /// Port to bind the control server to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// File holding the countdown snapshot between suspends and restarts
    #[arg(short, long, default_value = "countdown-snapshot.json")]
    pub snapshot: PathBuf,

    /// Keep the snapshot in memory only
    #[arg(long)]
    pub memory_snapshot: bool,

    /// Alert delivery
    #[arg(long, value_enum, default_value_t = NotifierKind::Command)]
    pub notifier: NotifierKind,

    /// Desktop notification command, invoked as `<command> <title> <body>`
    #[arg(long, default_value = "notify-send")]
    pub notify_command: String,

    /// Seconds between host sleep checks
    #[arg(long, default_value = "15")]
    pub wake_check_interval: u64,

    /// Seconds of unexplained wall-clock drift treated as host sleep
    #[arg(long, default_value = "5")]
    pub wake_threshold: u64,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    pub fn alert_sink(&self) -> AlertSink {
        match self.notifier {
            NotifierKind::Log => AlertSink::Log,
            NotifierKind::Command => AlertSink::Command {
                program: self.notify_command.clone(),
            },
        }
    }

    pub fn snapshot_store(&self) -> SnapshotStore {
        if self.memory_snapshot {
            SnapshotStore::memory()
        } else {
            SnapshotStore::file(&self.snapshot)
        }
    }

    pub fn wake_check_interval(&self) -> Duration {
        Duration::from_secs(self.wake_check_interval.max(1))
    }

    pub fn wake_threshold(&self) -> Duration {
        Duration::from_secs(self.wake_threshold)
    }
}
