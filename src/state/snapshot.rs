//! Snapshot record kept in the key-value store

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::RunState;

/// What gets written on suspend and read back on resume or at startup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountdownSnapshot {
    pub remaining_duration: u64,
    pub total_duration: u64,
    pub run_state: RunState,
    pub last_observed_wall_clock_time: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_snapshot_json_keys() {
        let snapshot = CountdownSnapshot {
            remaining_duration: 42,
            total_duration: 60,
            run_state: RunState::Running,
            last_observed_wall_clock_time: Some(Utc.with_ymd_and_hms(2025, 8, 2, 9, 30, 0).unwrap()),
        };

        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(value["remaining_duration"], 42);
        assert_eq!(value["total_duration"], 60);
        assert_eq!(value["run_state"], "running");
        assert_eq!(value["last_observed_wall_clock_time"], "2025-08-02T09:30:00Z");
    }
}
