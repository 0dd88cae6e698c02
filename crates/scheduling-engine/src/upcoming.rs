//! Appointments starting soon, for the alert shown after sign-in.

use chrono::{DateTime, Duration, Utc};

use crate::conflict::Appointment;

/// How far ahead the sign-in alert looks.
pub const UPCOMING_ALERT_MINUTES: i64 = 15;

/// Appointments whose start lies in `[now, now + minutes]`, earliest first.
///
/// A negative `minutes` yields nothing. A horizon past the representable
/// range is clamped to [`DateTime::<Utc>::MAX_UTC`].
pub fn upcoming_within(
    appointments: &[Appointment],
    now: DateTime<Utc>,
    minutes: i64,
) -> Vec<&Appointment> {
    if minutes < 0 {
        return Vec::new();
    }
    let horizon = Duration::try_minutes(minutes)
        .and_then(|ahead| now.checked_add_signed(ahead))
        .unwrap_or(DateTime::<Utc>::MAX_UTC);
    let mut upcoming: Vec<&Appointment> = appointments
        .iter()
        .filter(|a| a.start >= now && a.start <= horizon)
        .collect();
    upcoming.sort_by_key(|a| (a.start, a.id));
    upcoming
}
