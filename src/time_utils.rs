//! UTC calendar helpers for axis and tooltip labels.

use chrono::{DateTime, Utc};

const DAY_MS: u64 = 24 * 60 * 60 * 1000;

/// UTC instant of a millisecond timestamp; out-of-range values fall back to the epoch
pub fn utc_datetime(timestamp: u64) -> DateTime<Utc> {
    i64::try_from(timestamp)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// Axis label whose precision follows the time covered by the visible window.
///
/// - under two days -> `HH:MM`
/// - under half a year -> `DD.MM`
/// - otherwise -> `MM.YYYY`
pub fn format_time_label(timestamp: u64, visible_span_ms: u64) -> String {
    let pattern = if visible_span_ms < 2 * DAY_MS {
        "%H:%M"
    } else if visible_span_ms < 180 * DAY_MS {
        "%d.%m"
    } else {
        "%m.%Y"
    };
    utc_datetime(timestamp).format(pattern).to_string()
}

/// `YYYY-MM-DD HH:MM` for tooltips
pub fn format_datetime(timestamp: u64) -> String {
    utc_datetime(timestamp).format("%Y-%m-%d %H:%M").to_string()
}

/// `HH:MM:SS.mmm` for log stamps
pub fn format_clock(timestamp: u64) -> String {
    utc_datetime(timestamp).format("%H:%M:%S%.3f").to_string()
}

/// Evenly spaced bar indices in `[lo, hi]` for axis ticks
pub fn tick_indices(lo: usize, hi: usize, max_ticks: usize) -> Vec<usize> {
    if hi < lo || max_ticks == 0 {
        return Vec::new();
    }
    let count = hi - lo + 1;
    let step = count.div_ceil(max_ticks).max(1);
    (lo..=hi).step_by(step).collect()
}
