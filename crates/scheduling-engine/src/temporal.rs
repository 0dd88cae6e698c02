//! Temporal value conversion for appointment input.
//!
//! Converts between three representations of a point in time:
//!
//! - **local wall-clock input** — a date, an `h:mm` time and an AM/PM marker
//!   as a user types them, always read in the user's local timezone
//! - **zoned instant** — `DateTime<Tz>`, an absolute instant labelled with an
//!   IANA zone
//! - **UTC instant** — `DateTime<Utc>`, the form persisted and compared
//!   against storage
//!
//! Reprojection between zones (`to_utc`, `to_zone`, `to_business_zone`)
//! always preserves the instant and changes only the wall-clock numbers.
//!
//! # Strict parsing
//!
//! Malformed fragments are hard failures. Nothing is trimmed, rounded or
//! clamped. Wall-clock times that a DST transition skips or repeats are
//! rejected with [`SchedulingError::NonexistentLocalTime`] or
//! [`SchedulingError::AmbiguousLocalTime`] instead of being resolved by a
//! library default.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::SchedulingError;

/// The fixed zone in which business hours are defined.
pub const BUSINESS_TIMEZONE: Tz = chrono_tz::America::New_York;

/// Storage format for UTC timestamps (naive, second precision).
const STORAGE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ── Meridiem ────────────────────────────────────────────────────────────────

/// The AM/PM half of a 12-hour clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Meridiem {
    #[serde(rename = "AM")]
    Am,
    #[serde(rename = "PM")]
    Pm,
}

impl Meridiem {
    /// Convert a 12-hour clock hour (1-12) to a 24-hour clock hour.
    fn to_24h(self, hour12: u32) -> u32 {
        match (hour12, self) {
            (12, Meridiem::Am) => 0,
            (12, Meridiem::Pm) => 12,
            (h, Meridiem::Am) => h,
            (h, Meridiem::Pm) => h + 12,
        }
    }
}

impl FromStr for Meridiem {
    type Err = SchedulingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("am") {
            Ok(Meridiem::Am)
        } else if s.eq_ignore_ascii_case("pm") {
            Ok(Meridiem::Pm)
        } else {
            Err(SchedulingError::InvalidTime(format!(
                "'{s}' is not AM or PM"
            )))
        }
    }
}

impl fmt::Display for Meridiem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Meridiem::Am => f.write_str("AM"),
            Meridiem::Pm => f.write_str("PM"),
        }
    }
}

// ── Timezones ───────────────────────────────────────────────────────────────

/// Parse an IANA timezone name into `Tz`.
pub fn parse_timezone(name: &str) -> Result<Tz, SchedulingError> {
    name.parse::<Tz>()
        .map_err(|_| SchedulingError::InvalidTimezone(format!("'{}'", name)))
}

/// The operating system's configured timezone.
///
/// Falls back to UTC when the OS zone cannot be detected or is not a known
/// IANA name.
pub fn system_timezone() -> Tz {
    match iana_time_zone::get_timezone() {
        Ok(name) => parse_timezone(&name).unwrap_or_else(|err| {
            tracing::warn!(%err, "unknown system timezone, using UTC");
            Tz::UTC
        }),
        Err(err) => {
            tracing::warn!(%err, "could not detect system timezone, using UTC");
            Tz::UTC
        }
    }
}

// ── parse_local_time ────────────────────────────────────────────────────────

/// Parse an ISO 8601 calendar date (`YYYY-MM-DD`).
///
/// # Errors
///
/// Returns [`SchedulingError::InvalidDate`] for empty or unparseable text.
pub fn parse_date(date_text: &str) -> Result<NaiveDate, SchedulingError> {
    if date_text.is_empty() {
        return Err(SchedulingError::InvalidDate("date is empty".to_string()));
    }
    NaiveDate::parse_from_str(date_text, "%Y-%m-%d")
        .map_err(|e| SchedulingError::InvalidDate(format!("'{}': {}", date_text, e)))
}

/// Parse an `h:mm` clock time with its AM/PM marker.
///
/// The hour is one or two digits in `1..=12`; the minute is exactly two
/// digits in `00..=59`. Any other shape is rejected.
///
/// # Errors
///
/// Returns [`SchedulingError::InvalidTime`] if either fragment is malformed.
pub fn parse_clock_time(time_text: &str, meridiem: &str) -> Result<NaiveTime, SchedulingError> {
    let meridiem: Meridiem = meridiem.parse()?;
    let invalid = || SchedulingError::InvalidTime(format!("'{}' is not h:mm", time_text));

    let (hour_text, minute_text) = time_text.split_once(':').ok_or_else(invalid)?;
    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(hour_text) || hour_text.len() > 2 {
        return Err(invalid());
    }
    if !all_digits(minute_text) || minute_text.len() != 2 {
        return Err(invalid());
    }

    let hour: u32 = hour_text.parse().map_err(|_| invalid())?;
    let minute: u32 = minute_text.parse().map_err(|_| invalid())?;
    if !(1..=12).contains(&hour) || minute > 59 {
        return Err(invalid());
    }

    NaiveTime::from_hms_opt(meridiem.to_24h(hour), minute, 0).ok_or_else(invalid)
}

/// Combine user-entered date and time fragments into a zoned instant.
///
/// # Arguments
///
/// * `date_text` — An ISO 8601 date (e.g., `"2024-03-10"`)
/// * `time_text` — A 12-hour clock time (e.g., `"9:00"`, `"10:30"`)
/// * `meridiem` — `"AM"` or `"PM"` (case-insensitive)
/// * `zone` — The user's local timezone
///
/// # Errors
///
/// Returns [`SchedulingError::InvalidDate`] or [`SchedulingError::InvalidTime`]
/// for malformed fragments, and [`SchedulingError::NonexistentLocalTime`] or
/// [`SchedulingError::AmbiguousLocalTime`] when a DST transition skips or
/// repeats the wall-clock time.
///
/// # Examples
///
/// ```
/// use scheduling_engine::temporal::{parse_local_time, to_utc};
///
/// let zone = chrono_tz::America::Chicago;
/// let start = parse_local_time("2024-03-11", "9:00", "AM", zone).unwrap();
/// // March 11 2024 is CDT (UTC-5)
/// assert_eq!(to_utc(&start).to_rfc3339(), "2024-03-11T14:00:00+00:00");
/// ```
pub fn parse_local_time(
    date_text: &str,
    time_text: &str,
    meridiem: &str,
    zone: Tz,
) -> Result<DateTime<Tz>, SchedulingError> {
    let date = parse_date(date_text)?;
    let time = parse_clock_time(time_text, meridiem)?;
    resolve_local(date.and_time(time), zone)
}

/// Attach a zone to a wall-clock datetime, refusing DST gaps and overlaps.
pub fn resolve_local(naive: NaiveDateTime, zone: Tz) -> Result<DateTime<Tz>, SchedulingError> {
    match zone.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Ok(dt),
        LocalResult::Ambiguous(_, _) => Err(SchedulingError::AmbiguousLocalTime(format!(
            "{} occurs twice in {}",
            naive,
            zone.name()
        ))),
        LocalResult::None => Err(SchedulingError::NonexistentLocalTime(format!(
            "{} does not exist in {}",
            naive,
            zone.name()
        ))),
    }
}

// ── Reprojection ────────────────────────────────────────────────────────────

/// Reproject a zoned instant onto UTC. Total and lossless.
pub fn to_utc<T: TimeZone>(instant: &DateTime<T>) -> DateTime<Utc> {
    instant.with_timezone(&Utc)
}

/// Reproject a zoned instant onto an arbitrary zone, keeping the instant.
pub fn to_zone<T: TimeZone>(instant: &DateTime<T>, zone: Tz) -> DateTime<Tz> {
    instant.with_timezone(&zone)
}

/// Reproject a zoned instant onto [`BUSINESS_TIMEZONE`], keeping the instant.
pub fn to_business_zone<T: TimeZone>(instant: &DateTime<T>) -> DateTime<Tz> {
    to_zone(instant, BUSINESS_TIMEZONE)
}

/// Render a UTC instant in the naive `YYYY-MM-DD HH:MM:SS` storage form.
pub fn to_storage_timestamp(instant: &DateTime<Utc>) -> String {
    instant.format(STORAGE_FORMAT).to_string()
}

// ── Tests ───────────────────────────────────────────────────────────────────
