//! Mapping between decimal hours and horizontal positions on the day grid.
//!
//! The grid covers 8:00 to 21:00 and is divided into 15 minute cells. Hours are
//! decimal (`9.25` is 9:15) and every conversion snaps to a cell boundary.

pub const DAY_START_HOUR: f64 = 8.0;
pub const DAY_END_HOUR: f64 = 21.0;
/// Width of one grid cell in hours.
pub const QUANTUM_HOURS: f64 = 0.25;

const DAY_SPAN_HOURS: f64 = DAY_END_HOUR - DAY_START_HOUR;

/// Rounds to the nearest 15 minute boundary.
pub fn snap_to_quarter(hours: f64) -> f64 {
    (hours / QUANTUM_HOURS).round() * QUANTUM_HOURS
}

/// Converts an hour value to a percentage of the grid width.
///
/// Values outside the grid are clamped, so the result is always within `0..=100`.
pub fn time_to_position_percent(hours: f64) -> f64 {
    let snapped = snap_to_quarter(hours).clamp(DAY_START_HOUR, DAY_END_HOUR);
    (snapped - DAY_START_HOUR) / DAY_SPAN_HOURS * 100.0
}

/// Converts a percentage of the grid width back to an hour value on a cell boundary.
pub fn position_percent_to_time(percent: f64) -> f64 {
    let percent = percent.clamp(0.0, 100.0);
    let hours = DAY_START_HOUR + percent / 100.0 * DAY_SPAN_HOURS;
    snap_to_quarter(hours).clamp(DAY_START_HOUR, DAY_END_HOUR)
}

/// Formats decimal hours as `HH:MM`.
pub fn format_hours(hours: f64) -> String {
    let total_minutes = (hours * 60.0).round() as i64;
    format!("{:02}:{:02}", total_minutes / 60, total_minutes % 60)
}

/// Parses `HH:MM` (or a bare decimal like `9.5`) into decimal hours.
pub fn parse_hhmm(value: &str) -> Option<f64> {
    let value = value.trim();
    match value.split_once(':') {
        Some((h, m)) => {
            let hours: u32 = h.trim().parse().ok()?;
            let minutes: u32 = m.trim().parse().ok()?;
            if minutes >= 60 || hours > 24 || (hours == 24 && minutes > 0) {
                return None;
            }
            Some(hours as f64 + minutes as f64 / 60.0)
        }
        None => value
            .parse::<f64>()
            .ok()
            .filter(|h| (0.0..=24.0).contains(h)),
    }
}

/// Parses a `"HH:MM-HH:MM"` range into `(start, end)` hours.
pub fn parse_hour_range(value: &str) -> Option<(f64, f64)> {
    let (start, end) = value.split_once('-')?;
    let start = parse_hhmm(start)?;
    let end = parse_hhmm(end)?;
    (start < end).then_some((start, end))
}
