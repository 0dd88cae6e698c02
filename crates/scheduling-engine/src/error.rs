//! Error types for scheduling-engine operations.
//!
//! [`SchedulingError`] covers failures of the engine's own functions (bad
//! timezone names, unparseable input, a collaborator that could not answer).
//! [`RejectionReason`] is not an error: it is the user-correctable outcome of
//! a validation run, carried by [`crate::validation::Decision::Rejected`].

use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulingError {
    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid time: {0}")]
    InvalidTime(String),

    #[error("Nonexistent local time: {0}")]
    NonexistentLocalTime(String),

    #[error("Ambiguous local time: {0}")]
    AmbiguousLocalTime(String),

    #[error("Invalid business window: {0}")]
    InvalidWindow(String),

    #[error("Invalid appointment: {0}")]
    InvalidAppointment(String),

    #[error("Appointment data unavailable: {0}")]
    DataUnavailable(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl SchedulingError {
    /// Whether this error came from parsing a user's date/time fragments.
    ///
    /// Skipped and repeated DST wall-clock times count as malformed input.
    pub fn is_malformed_input(&self) -> bool {
        matches!(
            self,
            SchedulingError::InvalidDate(_)
                | SchedulingError::InvalidTime(_)
                | SchedulingError::NonexistentLocalTime(_)
                | SchedulingError::AmbiguousLocalTime(_)
        )
    }
}

impl From<config::ConfigError> for SchedulingError {
    fn from(err: config::ConfigError) -> Self {
        SchedulingError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SchedulingError>;

/// Why a candidate appointment was rejected.
///
/// Exactly one reason is reported per rejection: the first failed stage of
/// the pipeline. The presentation layer maps [`RejectionReason::key`] to
/// localized text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RejectionReason {
    /// A required form field was empty or unselected.
    MissingField { field: &'static str },
    /// The date or a start/end time could not be parsed.
    MalformedTime,
    /// The start does not strictly precede the end.
    StartAfterEnd,
    /// An endpoint falls outside the business window.
    OutsideBusinessHours,
    /// Another appointment of the same customer or contact overlaps.
    OverlappingAppointment,
    /// Existing appointments could not be fetched; rejected fail-closed.
    DataUnavailable,
}

impl RejectionReason {
    /// Stable machine key, suitable as a lookup into a message catalog.
    pub fn key(&self) -> &'static str {
        match self {
            RejectionReason::MissingField { .. } => "missing_field",
            RejectionReason::MalformedTime => "malformed_time",
            RejectionReason::StartAfterEnd => "start_after_end",
            RejectionReason::OutsideBusinessHours => "outside_business_hours",
            RejectionReason::OverlappingAppointment => "overlapping_appointment",
            RejectionReason::DataUnavailable => "data_unavailable",
        }
    }

    /// Whether the caller may simply retry the same input later.
    ///
    /// Only a data-source outage is transient; every other reason needs the
    /// user to change the form.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RejectionReason::DataUnavailable)
    }

    /// Whether the booking must not be stored. True for every reason,
    /// including [`RejectionReason::DataUnavailable`].
    pub fn blocks_booking(&self) -> bool {
        match self {
            RejectionReason::MissingField { .. }
            | RejectionReason::MalformedTime
            | RejectionReason::StartAfterEnd
            | RejectionReason::OutsideBusinessHours
            | RejectionReason::OverlappingAppointment
            | RejectionReason::DataUnavailable => true,
        }
    }
}

impl std::fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectionReason::MissingField { field } => write!(f, "missing field: {field}"),
            RejectionReason::MalformedTime => f.write_str("malformed date or time"),
            RejectionReason::StartAfterEnd => f.write_str("start must be before end"),
            RejectionReason::OutsideBusinessHours => f.write_str("outside business hours"),
            RejectionReason::OverlappingAppointment => {
                f.write_str("overlaps an existing appointment")
            }
            RejectionReason::DataUnavailable => {
                f.write_str("existing appointments could not be checked")
            }
        }
    }
}
