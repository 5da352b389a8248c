//! Time window arithmetic for the forecast endpoints.
//!
//! Start and end times are resolved once per call and never cached; the
//! `"now"` token means the moment of evaluation.

use chrono::{DateTime, Duration, NaiveTime, SecondsFormat, Utc};

use crate::error::{Error, Result};

/// Token accepted wherever a timestamp argument is expected.
pub const NOW: &str = "now";

/// Resolve a timestamp argument to a concrete instant.
pub fn resolve(token: &str) -> Result<DateTime<Utc>> {
    if token == NOW {
        return Ok(Utc::now());
    }

    DateTime::parse_from_rfc3339(token)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| Error::Timestamp(token.to_string()))
}

/// A resolved start/end pair, ready for the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Window {
    /// Forward-looking window: the end defaults to `start + span`.
    pub fn forward(start: Option<&str>, end: Option<&str>, span: Duration) -> Result<Self> {
        let start = resolve(start.unwrap_or(NOW))?;
        let end = match end {
            Some(token) => resolve(token)?,
            None => start + span,
        };
        Ok(Self { start, end })
    }

    /// Forward-looking window whose default end lands on the start of the
    /// day `days` days out, as the daily forecast endpoint expects.
    pub fn forward_days(start: Option<&str>, end: Option<&str>, days: i64) -> Result<Self> {
        let start = resolve(start.unwrap_or(NOW))?;
        let end = match end {
            Some(token) => resolve(token)?,
            None => day_start(start + Duration::days(days)),
        };
        Ok(Self { start, end })
    }

    /// Backward-looking window: the end defaults to now, the start to
    /// `end - span`.
    pub fn backward(start: Option<&str>, end: Option<&str>, span: Duration) -> Result<Self> {
        let end = resolve(end.unwrap_or(NOW))?;
        let start = match start {
            Some(token) => resolve(token)?,
            None => end - span,
        };
        Ok(Self { start, end })
    }
}

/// Truncate an instant to 00:00:00 UTC of its day.
fn day_start(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.date_naive().and_time(NaiveTime::MIN).and_utc()
}

/// Wire format for timestamps.
pub fn to_wire(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_now_means_current_time() {
        let before = Utc::now();
        let resolved = resolve("now").expect("now must resolve");
        assert!(resolved >= before);
        assert!(resolved <= Utc::now());
    }

    #[test]
    fn resolve_rejects_garbage() {
        let err = resolve("next tuesday").unwrap_err();
        assert!(matches!(err, Error::Timestamp(_)));
    }

    #[test]
    fn forward_window_default_end() {
        let window =
            Window::forward(Some("2021-01-02T03:00:00Z"), None, Duration::hours(108)).unwrap();

        assert_eq!(to_wire(window.start), "2021-01-02T03:00:00Z");
        assert_eq!(to_wire(window.end), "2021-01-06T15:00:00Z");
    }

    #[test]
    fn forward_window_explicit_end_wins() {
        let window = Window::forward(
            Some("2021-01-02T03:00:00Z"),
            Some("2021-01-02T04:00:00Z"),
            Duration::hours(108),
        )
        .unwrap();

        assert_eq!(to_wire(window.end), "2021-01-02T04:00:00Z");
    }

    #[test]
    fn forward_days_truncates_to_day_start() {
        let window = Window::forward_days(Some("2021-01-02T03:15:45Z"), None, 15).unwrap();

        assert_eq!(to_wire(window.end), "2021-01-17T00:00:00Z");
    }

    #[test]
    fn backward_window_default_start() {
        let window =
            Window::backward(None, Some("2021-01-02T06:00:00Z"), Duration::minutes(360)).unwrap();

        assert_eq!(to_wire(window.start), "2021-01-02T00:00:00Z");
        assert_eq!(to_wire(window.end), "2021-01-02T06:00:00Z");
    }

    #[test]
    fn wire_format_keeps_utc_offset_as_z() {
        let dt = resolve("2021-06-01T12:30:00+02:00").unwrap();
        assert_eq!(to_wire(dt), "2021-06-01T10:30:00Z");
    }
}
