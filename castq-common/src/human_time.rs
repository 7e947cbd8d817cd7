//! Human-readable time formatting
//!
//! Consistent display of playback positions, durations and speeds for logs
//! and the command-line front end.

use std::time::Duration;

/// Episodes shorter than this are displayed as `M:SS`
const HOUR_FORMAT_MIN: Duration = Duration::from_secs(3600);

/// Format a playback position.
///
/// The format is selected by `typical_max` (normally the episode duration) so
/// that a position and its duration line up:
/// - `M:SS` when `typical_max` is under one hour
/// - `H:MM:SS` otherwise
///
/// Sub-second remainders are truncated.
///
/// # Examples
///
/// ```
/// use castq_common::human_time::format_position;
/// use std::time::Duration;
///
/// assert_eq!(format_position(Duration::from_secs(65), Duration::from_secs(600)), "1:05");
/// assert_eq!(format_position(Duration::from_secs(65), Duration::from_secs(7200)), "0:01:05");
/// ```
pub fn format_position(position: Duration, typical_max: Duration) -> String {
    let total = position.as_secs();
    if typical_max < HOUR_FORMAT_MIN {
        format!("{}:{:02}", total / 60, total % 60)
    } else {
        format!("{}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
    }
}

/// Format `elapsed / duration`, using `--:--` for an unknown duration.
///
/// ```
/// use castq_common::human_time::format_progress;
/// use std::time::Duration;
///
/// assert_eq!(format_progress(Duration::from_secs(5), Some(Duration::from_secs(60))), "0:05 / 1:00");
/// assert_eq!(format_progress(Duration::ZERO, None), "0:00 / --:--");
/// ```
pub fn format_progress(elapsed: Duration, duration: Option<Duration>) -> String {
    match duration {
        Some(duration) => format!(
            "{} / {}",
            format_position(elapsed, duration),
            format_position(duration, duration)
        ),
        None => format!("{} / --:--", format_position(elapsed, Duration::ZERO)),
    }
}

/// Format a playback speed (media time per wall-clock second) as a multiplier.
///
/// ```
/// use castq_common::human_time::format_speed;
/// use std::time::Duration;
///
/// assert_eq!(format_speed(Duration::from_millis(1500)), "1.5x");
/// assert_eq!(format_speed(Duration::from_secs(2)), "2x");
/// ```
pub fn format_speed(speed: Duration) -> String {
    let ratio = speed.as_millis() as f64 / 1000.0;
    let rounded = (ratio * 100.0).round() / 100.0;
    if (rounded - rounded.trunc()).abs() < f64::EPSILON {
        format!("{:.0}x", rounded)
    } else {
        let text = format!("{:.2}", rounded);
        format!("{}x", text.trim_end_matches('0'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minute_format() {
        let max = Duration::from_secs(60 * 59);
        assert_eq!(format_position(Duration::ZERO, max), "0:00");
        assert_eq!(format_position(Duration::from_millis(59_999), max), "0:59");
        assert_eq!(format_position(Duration::from_secs(600), max), "10:00");
    }

    #[test]
    fn test_hour_format() {
        let max = Duration::from_secs(3600);
        assert_eq!(format_position(Duration::from_secs(3600), max), "1:00:00");
        assert_eq!(format_position(Duration::from_secs(3661), max), "1:01:01");
        assert_eq!(format_position(Duration::from_secs(59), max), "0:00:59");
    }

    #[test]
    fn test_minute_format_overflows_past_an_hour() {
        // A position beyond a short typical max keeps counting minutes
        let max = Duration::from_secs(60);
        assert_eq!(format_position(Duration::from_secs(3720), max), "62:00");
    }

    #[test]
    fn test_progress() {
        assert_eq!(
            format_progress(Duration::from_secs(30), Some(Duration::from_secs(7200))),
            "0:00:30 / 2:00:00"
        );
        assert_eq!(format_progress(Duration::from_secs(30), None), "0:30 / --:--");
    }

    #[test]
    fn test_speed() {
        assert_eq!(format_speed(Duration::from_secs(1)), "1x");
        assert_eq!(format_speed(Duration::from_millis(500)), "0.5x");
        assert_eq!(format_speed(Duration::from_millis(1250)), "1.25x");
    }
}
