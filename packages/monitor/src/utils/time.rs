/// Utility functions for time-related operations

use std::time::Duration;

const SECS_PER_MINUTE: u64 = 60;
const SECS_PER_HOUR: u64 = 3_600;
const SECS_PER_DAY: u64 = 86_400;

/// Split whole seconds into (days, hours, minutes, seconds)
fn split(total: u64) -> (u64, u64, u64, u64) {
    (
        total / SECS_PER_DAY,
        (total % SECS_PER_DAY) / SECS_PER_HOUR,
        (total % SECS_PER_HOUR) / SECS_PER_MINUTE,
        total % SECS_PER_MINUTE,
    )
}

/// Format a duration to a compact human-readable string.
/// Zero-valued units are dropped; seconds are shown when nothing else is.
/// For example, 3_605 seconds becomes "1h 5s" and 0 becomes "0s".
pub fn format_duration(duration: Duration) -> String {
    let (days, hours, minutes, seconds) = split(duration.as_secs());

    let mut parts = Vec::with_capacity(4);
    if days > 0 {
        parts.push(format!("{}d", days));
    }
    if hours > 0 {
        parts.push(format!("{}h", hours));
    }
    if minutes > 0 {
        parts.push(format!("{}m", minutes));
    }
    if seconds > 0 || parts.is_empty() {
        parts.push(format!("{}s", seconds));
    }

    parts.join(" ")
}

/// Format a time-to-sync estimate with minute resolution.
/// Leading zero units are dropped but minutes are always shown:
/// 270 seconds becomes "4m", 3_600 becomes "1h 0m".
pub fn format_eta(eta: Duration) -> String {
    let (days, hours, minutes, _) = split(eta.as_secs());

    if days > 0 {
        format!("{}d {}h {}m", days, hours, minutes)
    } else if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}

/// Format blocks per second rate with appropriate unit scaling.
/// Slow rates are shown per minute or per hour; the sign is kept so a
/// node moving backwards stays visible.
pub fn format_rate(blocks_per_second: f64) -> String {
    let magnitude = blocks_per_second.abs();

    if magnitude == 0.0 || magnitude >= 1.0 {
        format!("{:.2} blocks/sec", blocks_per_second)
    } else if magnitude < 0.01 {
        format!("{:.2} blocks/hour", blocks_per_second * 3600.0)
    } else {
        format!("{:.2} blocks/min", blocks_per_second * 60.0)
    }
}
