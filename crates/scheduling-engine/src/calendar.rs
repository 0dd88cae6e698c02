//! Week and month ranges for browsing appointments.
//!
//! A [`DateRange`] is a half-open run of local calendar days
//! `[start, end)`. Weeks run Sunday through Saturday.

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::conflict::Appointment;
use crate::error::{Result, SchedulingError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Week,
    Month,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    period: Period,
    start: NaiveDate,
    end: NaiveDate,
}

fn out_of_range(date: NaiveDate) -> SchedulingError {
    SchedulingError::InvalidDate(format!("{date}: period out of range"))
}

/// The Sunday-to-Saturday week containing `date`.
pub fn week_range(date: NaiveDate) -> Result<DateRange> {
    let back = u64::from(date.weekday().num_days_from_sunday());
    let start = date
        .checked_sub_days(Days::new(back))
        .ok_or_else(|| out_of_range(date))?;
    let end = start
        .checked_add_days(Days::new(7))
        .ok_or_else(|| out_of_range(date))?;
    Ok(DateRange {
        period: Period::Week,
        start,
        end,
    })
}

/// The calendar month containing `date`.
pub fn month_range(date: NaiveDate) -> Result<DateRange> {
    let start = date.with_day(1).ok_or_else(|| out_of_range(date))?;
    let end = start
        .checked_add_months(Months::new(1))
        .ok_or_else(|| out_of_range(date))?;
    Ok(DateRange {
        period: Period::Month,
        start,
        end,
    })
}

impl DateRange {
    pub fn period(&self) -> Period {
        self.period
    }

    /// First day of the range.
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// First day after the range.
    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains_date(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }

    /// The following week or month.
    pub fn next(&self) -> Result<DateRange> {
        self.for_period(self.end)
    }

    /// The preceding week or month.
    pub fn previous(&self) -> Result<DateRange> {
        let day_before = self
            .start
            .pred_opt()
            .ok_or_else(|| out_of_range(self.start))?;
        self.for_period(day_before)
    }

    fn for_period(&self, date: NaiveDate) -> Result<DateRange> {
        match self.period {
            Period::Week => week_range(date),
            Period::Month => month_range(date),
        }
    }

    /// The range as UTC instants `[start, end)` for a viewer in `zone`.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulingError::NonexistentLocalTime`] if midnight is
    /// skipped by a DST transition on a boundary day in `zone`.
    pub fn to_utc_bounds(
        &self,
        zone: Tz,
    ) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
        Ok((
            start_of_day(self.start, zone)?.with_timezone(&Utc),
            start_of_day(self.end, zone)?.with_timezone(&Utc),
        ))
    }

    /// Whether `appointment` starts on a day of this range, as seen in `zone`.
    pub fn contains(&self, appointment: &Appointment, zone: Tz) -> bool {
        self.contains_date(appointment.start.with_timezone(&zone).date_naive())
    }

    /// The appointments that start within this range, as seen in `zone`.
    pub fn filter<'a>(&self, appointments: &'a [Appointment], zone: Tz) -> Vec<&'a Appointment> {
        appointments
            .iter()
            .filter(|a| self.contains(a, zone))
            .collect()
    }
}

/// Local midnight of `date`; the earlier instant if midnight repeats.
fn start_of_day(date: NaiveDate, zone: Tz) -> Result<DateTime<Tz>> {
    zone.from_local_datetime(&date.and_time(NaiveTime::MIN))
        .earliest()
        .ok_or_else(|| {
            SchedulingError::NonexistentLocalTime(format!("midnight of {date} in {}", zone.name()))
        })
}
