use chrono::{DateTime, Local, Utc};

/// `950`, `1.2K`, `3.4M`.
pub fn format_viewer_count(count: u64) -> String {
    if count >= 1_000_000 {
        format!("{:.1}M", count as f64 / 1_000_000.0)
    } else if count >= 1_000 {
        format!("{:.1}K", count as f64 / 1_000.0)
    } else {
        count.to_string()
    }
}

/// `H:MM:SS` above an hour, `M:SS` otherwise.
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes}:{secs:02}")
    }
}

pub fn format_relative_time(date: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = now.signed_duration_since(date).num_seconds();
    if seconds < 60 {
        return "just now".to_string();
    }

    let minutes = seconds / 60;
    if minutes < 60 {
        return format!("{minutes}m ago");
    }

    let hours = minutes / 60;
    if hours < 24 {
        return format!("{hours}h ago");
    }

    let days = hours / 24;
    if days < 30 {
        return format!("{days}d ago");
    }

    date.format("%Y-%m-%d").to_string()
}

/// Parses an RFC 3339 timestamp from the API, `"unknown"` when it is not one.
pub fn format_relative_str(raw: &str, now: DateTime<Utc>) -> String {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(date) => format_relative_time(date.with_timezone(&Utc), now),
        Err(_) => "unknown".to_string(),
    }
}

/// Local `HH:MM` shown next to chat lines.
pub fn chat_time(timestamp: DateTime<Utc>) -> String {
    timestamp.with_timezone(&Local).format("%H:%M").to_string()
}

/// Wall clock in milliseconds, the time base of the throttle.
pub fn now_millis() -> u64 {
    Utc::now().timestamp_millis().max(0) as u64
}
