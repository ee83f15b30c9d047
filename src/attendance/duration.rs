use chrono::{DateTime, Duration, FixedOffset, Utc};

pub const PLACEHOLDER: &str = "—";

/// Whole-second elapsed time as `Hh Mm Ss`. Negative spans clamp to zero.
pub fn format_elapsed(elapsed: Duration) -> String {
    let total = elapsed.num_seconds().max(0);
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    format!("{}h {}m {}s", hours, minutes, seconds)
}

// Only a clocked-in status with a known start has a duration
pub fn duration_value(since: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    match since {
        Some(start) => format_elapsed(now - start),
        None => PLACEHOLDER.to_string(),
    }
}

pub fn format_local(instant: Option<DateTime<Utc>>, offset: &FixedOffset) -> String {
    match instant {
        Some(instant) => instant
            .with_timezone(offset)
            .format("%Y-%m-%d %I:%M:%S %p")
            .to_string(),
        None => PLACEHOLDER.to_string(),
    }
}

pub fn wall_clock(now: DateTime<Utc>, offset: &FixedOffset) -> String {
    now.with_timezone(offset).format("%I:%M:%S %p").to_string()
}

pub fn today(now: DateTime<Utc>, offset: &FixedOffset) -> String {
    now.with_timezone(offset).format("%A, %-d %b %Y").to_string()
}
