use std::time::Duration;

const UNKNOWN: &str = "Unknown";

struct Parts {
    total_seconds: u64,
    hours: u64,
    minutes: u64,
    seconds: u64,
}

fn split(millis: u64) -> Option<Parts> {
    if millis == 0 {
        return None;
    }
    let total_seconds = millis / 1000;
    Some(Parts {
        total_seconds,
        hours: total_seconds / 3600,
        minutes: (total_seconds % 3600) / 60,
        seconds: total_seconds % 60,
    })
}

/// `"Xh Ym"` for an hour or more, `"M:SS"` below that.
pub fn format_duration(millis: u64) -> String {
    match split(millis) {
        None => UNKNOWN.to_string(),
        Some(p) if p.hours > 0 => format!("{}h {}m", p.hours, p.minutes),
        Some(p) => format!("{}:{:02}", p.minutes, p.seconds),
    }
}

pub fn format_playlist_duration(millis: u64) -> String {
    match split(millis) {
        None => UNKNOWN.to_string(),
        Some(p) if p.hours > 0 => format!("{}h {}m", p.hours, p.minutes),
        Some(p) if p.minutes > 0 => format!("{}m", p.minutes),
        Some(p) => format!("{}s", p.total_seconds),
    }
}

/// Clock form for a single track: `"H:MM:SS"` or `"M:SS"`.
pub fn format_track_duration(millis: u64) -> String {
    match split(millis) {
        None => UNKNOWN.to_string(),
        Some(p) if p.hours > 0 => format!("{}:{:02}:{:02}", p.hours, p.minutes, p.seconds),
        Some(p) => format!("{}:{:02}", p.minutes, p.seconds),
    }
}

pub fn format_uptime(uptime: Duration) -> String {
    humantime::format_duration(Duration::from_secs(uptime.as_secs())).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn track_durations() {
        assert_eq!(format_track_duration(225_000), "3:45");
        assert_eq!(format_track_duration(5_025_000), "1:23:45");
        assert_eq!(format_track_duration(9_999), "0:09");
        assert_eq!(format_track_duration(0), "Unknown");
    }

    #[test]
    fn playlist_durations() {
        assert_eq!(format_playlist_duration(5_025_000), "1h 23m");
        assert_eq!(format_playlist_duration(600_000), "10m");
        assert_eq!(format_playlist_duration(45_000), "45s");
        assert_eq!(format_playlist_duration(0), "Unknown");
    }

    #[test]
    fn general_durations() {
        assert_eq!(format_duration(225_000), "3:45");
        assert_eq!(format_duration(9_000_000), "2h 30m");
    }

    #[test]
    fn uptime_drops_subsecond_noise() {
        assert_eq!(format_uptime(Duration::from_millis(3_723_456)), "1h 2m 3s");
    }
}
