use chrono::{DateTime, TimeZone as _, Utc};
use chrono_tz::Tz;
use serde_json::Value;
use tracing::warn;

use crate::error::{DashboardError, Result};

// ── System timezone detection ─────────────────────────────────────────────────

/// Detect the IANA timezone name of the running system.
///
/// Falls back to `"UTC"` if detection fails.
pub fn get_system_timezone() -> String {
    iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string())
}

// ── TimezoneHandler ───────────────────────────────────────────────────────────

/// Parses event timestamps, interpreting offset-less values in a default
/// timezone.
#[derive(Debug, Clone, Copy)]
pub struct TimezoneHandler {
    default_tz: Tz,
}

impl TimezoneHandler {
    /// Create a handler with the given IANA timezone name as the default.
    ///
    /// If `tz_name` is not a recognised IANA timezone, falls back to UTC
    /// and logs a warning.
    pub fn new(tz_name: &str) -> Self {
        let tz = tz_name.parse::<Tz>().unwrap_or_else(|_| {
            warn!(
                "TimezoneHandler: unrecognised timezone \"{}\", falling back to UTC",
                tz_name
            );
            Tz::UTC
        });
        Self { default_tz: tz }
    }

    /// Parse a JSON timestamp value into a UTC [`DateTime`].
    ///
    /// * string → RFC 3339 (including `Z`-suffix) or a naive date-time in
    ///   the default timezone
    /// * number → Unix seconds (integer or float)
    /// * anything else → `None`
    pub fn parse_value(&self, value: &Value) -> Option<DateTime<Utc>> {
        match value {
            Value::String(s) => self.parse_timestamp(s),
            Value::Number(n) => {
                if let Some(secs) = n.as_i64() {
                    DateTime::from_timestamp(secs, 0)
                } else if let Some(f) = n.as_f64().filter(|f| f.is_finite()) {
                    // Floor so the nanosecond part stays non-negative.
                    let floor = f.floor();
                    let nanos = ((f - floor) * 1_000_000_000.0).round() as u32;
                    if nanos >= 1_000_000_000 {
                        DateTime::from_timestamp(floor as i64 + 1, 0)
                    } else {
                        DateTime::from_timestamp(floor as i64, nanos)
                    }
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// Parse an ISO 8601 / RFC 3339 timestamp string into a UTC [`DateTime`].
    ///
    /// Returns `None` for empty strings or unrecognised formats.
    pub fn parse_timestamp(&self, s: &str) -> Option<DateTime<Utc>> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }

        let normalised = if let Some(stripped) = s.strip_suffix('Z') {
            format!("{}+00:00", stripped)
        } else {
            s.to_string()
        };

        if let Ok(dt) = DateTime::parse_from_rfc3339(&normalised) {
            return Some(dt.with_timezone(&Utc));
        }

        // Postgres `timestamptz` text form, e.g. "2024-01-15 10:30:00+00".
        if let Ok(dt) = DateTime::parse_from_str(&format!("{}00", s), "%Y-%m-%d %H:%M:%S%.f%z") {
            return Some(dt.with_timezone(&Utc));
        }

        const FMTS: &[&str] = &[
            "%Y-%m-%dT%H:%M:%S%.f",
            "%Y-%m-%dT%H:%M:%S",
            "%Y-%m-%d %H:%M:%S%.f",
            "%Y-%m-%d %H:%M:%S",
        ];
        for fmt in FMTS {
            if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, fmt) {
                if let chrono::LocalResult::Single(dt) = self.default_tz.from_local_datetime(&naive)
                {
                    return Some(dt.with_timezone(&Utc));
                }
            }
        }

        if let Ok(date) = chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            let naive = date.and_hms_opt(0, 0, 0)?;
            if let chrono::LocalResult::Single(dt) = self.default_tz.from_local_datetime(&naive) {
                return Some(dt.with_timezone(&Utc));
            }
        }

        warn!("TimezoneHandler: could not parse timestamp \"{}\"", s);
        None
    }

    /// Like [`parse_timestamp`](Self::parse_timestamp) but reports failure.
    pub fn parse_required(&self, s: &str) -> Result<DateTime<Utc>> {
        self.parse_timestamp(s)
            .ok_or_else(|| DashboardError::TimestampParse(s.to_string()))
    }

    /// Render `dt` in the default timezone as `"YYYY-MM-DD HH:MM"`.
    pub fn format_local(&self, dt: DateTime<Utc>) -> String {
        dt.with_timezone(&self.default_tz)
            .format("%Y-%m-%d %H:%M")
            .to_string()
    }

    /// Validate that `tz_name` is a recognised IANA timezone identifier.
    pub fn validate_timezone(tz_name: &str) -> bool {
        tz_name.parse::<Tz>().is_ok()
    }

    pub fn default_tz(&self) -> Tz {
        self.default_tz
    }
}

impl Default for TimezoneHandler {
    fn default() -> Self {
        Self {
            default_tz: Tz::UTC,
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
