//! Business-hours validation.
//!
//! Appointments must start and end inside a fixed daily window expressed in
//! the business timezone, regardless of the user's own zone or DST.

use chrono::{DateTime, NaiveTime, TimeZone};
use chrono_tz::Tz;

use crate::error::SchedulingError;
use crate::temporal::{self, BUSINESS_TIMEZONE};

/// A daily `[open, close]` window of wall-clock times in a single zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusinessWindow {
    zone: Tz,
    open: NaiveTime,
    close: NaiveTime,
}

impl BusinessWindow {
    /// Build a window, requiring `open` to precede `close`.
    pub fn new(zone: Tz, open: NaiveTime, close: NaiveTime) -> Result<Self, SchedulingError> {
        if open >= close {
            return Err(SchedulingError::InvalidWindow(format!(
                "open {} is not before close {}",
                open, close
            )));
        }
        Ok(Self { zone, open, close })
    }

    pub fn zone(&self) -> Tz {
        self.zone
    }

    pub fn open(&self) -> NaiveTime {
        self.open
    }

    pub fn close(&self) -> NaiveTime {
        self.close
    }

    /// Whether both endpoints fall inside the window, boundaries inclusive.
    ///
    /// Both endpoints are reprojected into the window's zone. The boundaries
    /// are built once from the calendar date of the *reprojected start*, so
    /// an appointment that crosses midnight in the business zone is judged
    /// against the start day's window and its end falls outside it.
    ///
    /// A boundary that does not exist on that date (a DST gap at the open or
    /// close time) makes the day unbookable and yields `false`.
    pub fn is_within_business_hours<T: TimeZone>(
        &self,
        start: &DateTime<T>,
        end: &DateTime<T>,
    ) -> bool {
        let start = temporal::to_zone(start, self.zone);
        let end = temporal::to_zone(end, self.zone);
        let date = start.date_naive();

        let bounds = (
            temporal::resolve_local(date.and_time(self.open), self.zone),
            temporal::resolve_local(date.and_time(self.close), self.zone),
        );
        let (open, close) = match bounds {
            (Ok(open), Ok(close)) => (open, close),
            _ => {
                tracing::debug!(%date, "business window boundary missing on this date");
                return false;
            }
        };

        let inside = |t: &DateTime<Tz>| *t >= open && *t <= close;
        inside(&start) && inside(&end)
    }
}

impl Default for BusinessWindow {
    /// 08:00 to 22:00 in [`BUSINESS_TIMEZONE`].
    fn default() -> Self {
        Self {
            zone: BUSINESS_TIMEZONE,
            open: NaiveTime::from_hms_opt(8, 0, 0).unwrap_or_default(),
            close: NaiveTime::from_hms_opt(22, 0, 0).unwrap_or_default(),
        }
    }
}

/// Check an appointment against the system's default business window.
pub fn is_within_business_hours<T: TimeZone>(start: &DateTime<T>, end: &DateTime<T>) -> bool {
    BusinessWindow::default().is_within_business_hours(start, end)
}
