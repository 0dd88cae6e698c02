//! # scheduling-engine
//!
//! Validation core for booking customer appointments.
//!
//! Turns the date and 12-hour times a user types into timezone-independent
//! UTC instants, checks them against fixed business hours in the business
//! timezone, and rejects bookings that overlap another appointment of the
//! same customer or contact. The engine never touches storage: existing
//! appointments come from an [`AppointmentSource`] supplied by the caller.
//!
//! ## Modules
//!
//! - [`temporal`] — Local input parsing and zone reprojection
//! - [`business_hours`] — The business-hours window check
//! - [`conflict`] — Open-interval overlap detection per customer/contact
//! - [`validation`] — The ordered validation pipeline and its decision
//! - [`calendar`] — Week/month ranges for browsing appointments
//! - [`upcoming`] — Appointments starting shortly
//! - [`config`] — Engine configuration
//! - [`error`] — Error and rejection types

pub mod business_hours;
pub mod calendar;
pub mod config;
pub mod conflict;
pub mod error;
pub mod temporal;
pub mod upcoming;
pub mod validation;

pub use business_hours::{is_within_business_hours, BusinessWindow};
pub use calendar::{month_range, week_range, DateRange, Period};
pub use config::EngineConfig;
pub use conflict::{
    find_conflicts, has_conflict, has_conflict_in, overlaps, Appointment, AppointmentSource,
    Conflict, OverlapQuery,
};
pub use error::{RejectionReason, SchedulingError};
pub use temporal::{
    parse_local_time, to_business_zone, to_storage_timestamp, to_utc, Meridiem, BUSINESS_TIMEZONE,
};
pub use upcoming::{upcoming_within, UPCOMING_ALERT_MINUTES};
pub use validation::{validate, AppointmentForm, Decision, ValidationStage, Validator};
