//! Human readable durations

/// Remaining time as `HH:MM:SS` from one hour up, `MM:SS` below
pub fn format_remaining(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}

/// Daemon uptime as `1h 2m 3s`, dropping leading zero units
pub fn format_uptime(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_remaining() {
        assert_eq!(format_remaining(0), "00:00");
        assert_eq!(format_remaining(61), "01:01");
        assert_eq!(format_remaining(3599), "59:59");
        assert_eq!(format_remaining(3600), "01:00:00");
        assert_eq!(format_remaining(3661), "01:01:01");
        assert_eq!(format_remaining(100 * 3600), "100:00:00");
    }

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(7), "7s");
        assert_eq!(format_uptime(125), "2m 5s");
        assert_eq!(format_uptime(3725), "1h 2m 5s");
    }
}
