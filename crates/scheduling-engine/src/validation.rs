//! The appointment validation pipeline.
//!
//! A candidate moves through fixed stages and stops at the first failure:
//!
//! 1. every required field is filled in ([`RejectionReason::MissingField`])
//! 2. start and end parse in the user's zone ([`RejectionReason::MalformedTime`])
//! 3. start strictly precedes end ([`RejectionReason::StartAfterEnd`])
//! 4. both endpoints are inside business hours ([`RejectionReason::OutsideBusinessHours`])
//! 5. no other appointment of the same customer or contact overlaps
//!    ([`RejectionReason::OverlappingAppointment`], or
//!    [`RejectionReason::DataUnavailable`] when the store cannot answer)
//!
//! An accepted candidate comes back with its UTC bounds, ready to persist.
//! [`Validator`] holds no mutable state, so one instance can serve
//! concurrent validations.

use std::fmt;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::business_hours::BusinessWindow;
use crate::config::EngineConfig;
use crate::conflict::{has_conflict, AppointmentSource, OverlapQuery};
use crate::error::RejectionReason;
use crate::temporal::{self, parse_local_time, to_storage_timestamp, to_utc};

// ── Input ───────────────────────────────────────────────────────────────────

/// The appointment form as submitted.
///
/// Text fields are blank when empty; selections are `None` when nothing was
/// picked. `appointment_id` is set only when editing an existing record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppointmentForm {
    pub appointment_id: Option<i64>,
    pub title: String,
    pub description: String,
    pub location: String,
    #[serde(rename = "type")]
    pub appointment_type: String,
    /// ISO 8601 date, `YYYY-MM-DD`.
    pub date: String,
    /// `h:mm`, 12-hour clock.
    pub start_time: String,
    pub start_meridiem: Option<String>,
    pub end_time: String,
    pub end_meridiem: Option<String>,
    pub customer_id: Option<i64>,
    pub contact_id: Option<i64>,
    pub user_id: Option<i64>,
}

/// The form once every required field is known to be present.
struct CompleteForm<'a> {
    date: &'a str,
    start_time: &'a str,
    start_meridiem: &'a str,
    end_time: &'a str,
    end_meridiem: &'a str,
    customer_id: i64,
    contact_id: i64,
}

impl AppointmentForm {
    fn complete(&self) -> Result<CompleteForm<'_>, RejectionReason> {
        required_text("title", &self.title)?;
        required_text("description", &self.description)?;
        required_text("location", &self.location)?;
        required_text("type", &self.appointment_type)?;
        let date = required_text("date", &self.date)?;
        let start_time = required_text("start_time", &self.start_time)?;
        let start_meridiem = required_text("start_meridiem", choice(&self.start_meridiem))?;
        let end_time = required_text("end_time", &self.end_time)?;
        let end_meridiem = required_text("end_meridiem", choice(&self.end_meridiem))?;
        let customer_id = required_id("customer", self.customer_id)?;
        let contact_id = required_id("contact", self.contact_id)?;
        required_id("user", self.user_id)?;

        Ok(CompleteForm {
            date,
            start_time,
            start_meridiem,
            end_time,
            end_meridiem,
            customer_id,
            contact_id,
        })
    }
}

fn choice(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or_default()
}

fn required_text<'a>(field: &'static str, value: &'a str) -> Result<&'a str, RejectionReason> {
    if value.trim().is_empty() {
        Err(RejectionReason::MissingField { field })
    } else {
        Ok(value)
    }
}

fn required_id(field: &'static str, value: Option<i64>) -> Result<i64, RejectionReason> {
    value.ok_or(RejectionReason::MissingField { field })
}

// ── Output ──────────────────────────────────────────────────────────────────

/// The outcome of one validation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Decision {
    Accepted {
        start_utc: DateTime<Utc>,
        end_utc: DateTime<Utc>,
    },
    Rejected {
        #[serde(flatten)]
        reason: RejectionReason,
    },
}

impl Decision {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Decision::Accepted { .. })
    }

    pub fn reason(&self) -> Option<RejectionReason> {
        match self {
            Decision::Accepted { .. } => None,
            Decision::Rejected { reason } => Some(*reason),
        }
    }

    /// The accepted bounds in storage form (`YYYY-MM-DD HH:MM:SS`, UTC).
    pub fn storage_bounds(&self) -> Option<(String, String)> {
        match self {
            Decision::Accepted { start_utc, end_utc } => Some((
                to_storage_timestamp(start_utc),
                to_storage_timestamp(end_utc),
            )),
            Decision::Rejected { .. } => None,
        }
    }
}

/// The pipeline stages, in the order they are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationStage {
    FieldsComplete,
    TimeParsed,
    OrderValid,
    BusinessHoursValid,
    ConflictFree,
}

impl ValidationStage {
    /// The stage a rejection reason belongs to.
    pub fn of(reason: &RejectionReason) -> Self {
        match reason {
            RejectionReason::MissingField { .. } => ValidationStage::FieldsComplete,
            RejectionReason::MalformedTime => ValidationStage::TimeParsed,
            RejectionReason::StartAfterEnd => ValidationStage::OrderValid,
            RejectionReason::OutsideBusinessHours => ValidationStage::BusinessHoursValid,
            RejectionReason::OverlappingAppointment | RejectionReason::DataUnavailable => {
                ValidationStage::ConflictFree
            }
        }
    }
}

impl fmt::Display for ValidationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValidationStage::FieldsComplete => "fields_complete",
            ValidationStage::TimeParsed => "time_parsed",
            ValidationStage::OrderValid => "order_valid",
            ValidationStage::BusinessHoursValid => "business_hours_valid",
            ValidationStage::ConflictFree => "conflict_free",
        };
        f.write_str(name)
    }
}

// ── Validator ───────────────────────────────────────────────────────────────

/// Validates appointment forms entered in one local timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Validator {
    local_zone: Tz,
    window: BusinessWindow,
}

impl Validator {
    /// A validator for users in `local_zone`, using the default business window.
    pub fn new(local_zone: Tz) -> Self {
        Self {
            local_zone,
            window: BusinessWindow::default(),
        }
    }

    /// A validator for the operating system's timezone.
    pub fn for_system() -> Self {
        Self::new(temporal::system_timezone())
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.local_zone())
    }

    pub fn with_window(mut self, window: BusinessWindow) -> Self {
        self.window = window;
        self
    }

    pub fn local_zone(&self) -> Tz {
        self.local_zone
    }

    /// Run the pipeline over `form`, checking conflicts against `existing`.
    ///
    /// Never fails: malformed input and an unreachable store both come back
    /// as [`Decision::Rejected`].
    pub fn validate<S: AppointmentSource + ?Sized>(
        &self,
        form: &AppointmentForm,
        existing: &S,
    ) -> Decision {
        let span = tracing::info_span!(
            "validate",
            appointment_id = ?form.appointment_id,
            customer_id = ?form.customer_id,
            contact_id = ?form.contact_id,
        );
        let _enter = span.enter();

        match self.run(form, existing) {
            Ok((start_utc, end_utc)) => {
                tracing::info!(%start_utc, %end_utc, "appointment accepted");
                Decision::Accepted { start_utc, end_utc }
            }
            Err(reason) => {
                let stage = ValidationStage::of(&reason);
                tracing::info!(%stage, %reason, "appointment rejected");
                Decision::Rejected { reason }
            }
        }
    }

    fn run<S: AppointmentSource + ?Sized>(
        &self,
        form: &AppointmentForm,
        existing: &S,
    ) -> Result<(DateTime<Utc>, DateTime<Utc>), RejectionReason> {
        let fields = form.complete()?;
        tracing::debug!(stage = %ValidationStage::FieldsComplete, "passed");

        let parse = |time: &str, meridiem: &str| {
            parse_local_time(fields.date, time, meridiem, self.local_zone).map_err(|err| {
                if err.is_malformed_input() {
                    tracing::debug!(%err, "unparseable appointment time");
                } else {
                    tracing::warn!(%err, "unexpected error parsing appointment time");
                }
                RejectionReason::MalformedTime
            })
        };
        let start = parse(fields.start_time, fields.start_meridiem)?;
        let end = parse(fields.end_time, fields.end_meridiem)?;
        tracing::debug!(stage = %ValidationStage::TimeParsed, %start, %end, "passed");

        if start >= end {
            return Err(RejectionReason::StartAfterEnd);
        }
        tracing::debug!(stage = %ValidationStage::OrderValid, "passed");

        if !self.window.is_within_business_hours(&start, &end) {
            return Err(RejectionReason::OutsideBusinessHours);
        }
        tracing::debug!(stage = %ValidationStage::BusinessHoursValid, "passed");

        let query = OverlapQuery::for_candidate(
            fields.customer_id,
            fields.contact_id,
            form.appointment_id,
            to_utc(&start),
            to_utc(&end),
        );
        let rows = existing.fetch_for_overlap_check(&query).map_err(|err| {
            tracing::warn!(%err, "overlap check failed, rejecting");
            RejectionReason::DataUnavailable
        })?;
        if has_conflict(&query, &rows) {
            return Err(RejectionReason::OverlappingAppointment);
        }
        tracing::debug!(stage = %ValidationStage::ConflictFree, "passed");

        Ok((query.start, query.end))
    }
}

/// Validate `form` in the operating system's timezone against the default
/// business window.
pub fn validate<S: AppointmentSource + ?Sized>(form: &AppointmentForm, existing: &S) -> Decision {
    Validator::for_system().validate(form, existing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conflict::Appointment;
    use crate::error::SchedulingError;
    use chrono::TimeZone;
    use chrono_tz::America::New_York;

    fn form() -> AppointmentForm {
        AppointmentForm {
            appointment_id: None,
            title: "Quarterly review".to_string(),
            description: "Review Q1 numbers".to_string(),
            location: "Room 4".to_string(),
            appointment_type: "Planning".to_string(),
            date: "2024-03-12".to_string(),
            start_time: "9:00".to_string(),
            start_meridiem: Some("AM".to_string()),
            end_time: "10:00".to_string(),
            end_meridiem: Some("AM".to_string()),
            customer_id: Some(5),
            contact_id: Some(2),
            user_id: Some(1),
        }
    }

    fn none() -> Vec<Appointment> {
        Vec::new()
    }

    fn reject(f: &AppointmentForm) -> Option<RejectionReason> {
        Validator::new(New_York).validate(f, &none()).reason()
    }

    // ── stage ordering ──────────────────────────────────────────────────

    #[test]
    fn test_accepts_complete_form() {
        let decision = Validator::new(New_York).validate(&form(), &none());
        assert_eq!(
            decision,
            Decision::Accepted {
                start_utc: Utc.with_ymd_and_hms(2024, 3, 12, 13, 0, 0).unwrap(),
                end_utc: Utc.with_ymd_and_hms(2024, 3, 12, 14, 0, 0).unwrap(),
            }
        );
    }

    #[test]
    fn test_each_required_field_reported() {
        let cases: Vec<(&'static str, fn(&mut AppointmentForm))> = vec![
            ("title", |f| f.title.clear()),
            ("description", |f| f.description = "   ".into()),
            ("location", |f| f.location.clear()),
            ("type", |f| f.appointment_type.clear()),
            ("date", |f| f.date.clear()),
            ("start_time", |f| f.start_time.clear()),
            ("start_meridiem", |f| f.start_meridiem = None),
            ("end_time", |f| f.end_time.clear()),
            ("end_meridiem", |f| f.end_meridiem = Some(String::new())),
            ("customer", |f| f.customer_id = None),
            ("contact", |f| f.contact_id = None),
            ("user", |f| f.user_id = None),
        ];
        for (field, blank) in cases {
            let mut f = form();
            blank(&mut f);
            assert_eq!(
                reject(&f),
                Some(RejectionReason::MissingField { field }),
                "blanking {field}"
            );
        }
    }

    #[test]
    fn test_missing_field_reported_before_malformed_time() {
        let mut f = form();
        f.title.clear();
        f.start_time = "nine".into();
        assert_eq!(reject(&f), Some(RejectionReason::MissingField { field: "title" }));
    }

    #[test]
    fn test_malformed_time() {
        let mut f = form();
        f.end_time = "10:0".into();
        assert_eq!(reject(&f), Some(RejectionReason::MalformedTime));
    }

    #[test]
    fn test_malformed_meridiem() {
        let mut f = form();
        f.start_meridiem = Some("XM".into());
        assert_eq!(reject(&f), Some(RejectionReason::MalformedTime));
    }

    #[test]
    fn test_dst_gap_is_malformed_time() {
        let mut f = form();
        f.date = "2024-03-10".into();
        f.start_time = "2:30".into();
        assert_eq!(reject(&f), Some(RejectionReason::MalformedTime));
    }

    #[test]
    fn test_start_after_end() {
        let mut f = form();
        f.start_time = "11:00".into();
        assert_eq!(reject(&f), Some(RejectionReason::StartAfterEnd));
    }

    #[test]
    fn test_equal_start_and_end_rejected() {
        let mut f = form();
        f.end_time = "9:00".into();
        assert_eq!(reject(&f), Some(RejectionReason::StartAfterEnd));
    }

    #[test]
    fn test_order_checked_before_business_hours() {
        let mut f = form();
        f.start_time = "11:00".into();
        f.start_meridiem = Some("PM".into());
        f.end_time = "6:00".into();
        assert_eq!(reject(&f), Some(RejectionReason::StartAfterEnd));
    }

    #[test]
    fn test_outside_business_hours() {
        let mut f = form();
        f.start_time = "7:59".into();
        assert_eq!(reject(&f), Some(RejectionReason::OutsideBusinessHours));
    }

    #[test]
    fn test_custom_window() {
        let open = chrono::NaiveTime::from_hms_opt(10, 0, 0).unwrap();
        let close = chrono::NaiveTime::from_hms_opt(16, 0, 0).unwrap();
        let window = BusinessWindow::new(New_York, open, close).unwrap();
        let v = Validator::new(New_York).with_window(window);
        assert_eq!(
            v.validate(&form(), &none()).reason(),
            Some(RejectionReason::OutsideBusinessHours)
        );
    }

    // ── conflict stage ──────────────────────────────────────────────────

    struct Offline;

    impl AppointmentSource for Offline {
        fn fetch_for_overlap_check(
            &self,
            _query: &OverlapQuery,
        ) -> Result<Vec<Appointment>, SchedulingError> {
            Err(SchedulingError::DataUnavailable("timeout".to_string()))
        }
    }

    #[test]
    fn test_unavailable_store_rejects() {
        let decision = Validator::new(New_York).validate(&form(), &Offline);
        assert_eq!(decision.reason(), Some(RejectionReason::DataUnavailable));
    }

    #[test]
    fn test_unavailable_store_not_consulted_for_earlier_failures() {
        let mut f = form();
        f.start_time = "7:00".into();
        let decision = Validator::new(New_York).validate(&f, &Offline);
        assert_eq!(decision.reason(), Some(RejectionReason::OutsideBusinessHours));
    }

    #[test]
    fn test_storage_bounds() {
        let decision = Validator::new(New_York).validate(&form(), &none());
        assert_eq!(
            decision.storage_bounds(),
            Some(("2024-03-12 13:00:00".into(), "2024-03-12 14:00:00".into()))
        );
    }

    #[test]
    fn test_stage_of_reason() {
        assert_eq!(
            ValidationStage::of(&RejectionReason::DataUnavailable),
            ValidationStage::ConflictFree
        );
        assert_eq!(ValidationStage::TimeParsed.to_string(), "time_parsed");
    }

    #[test]
    fn test_decision_serializes_with_status_tag() {
        let decision = Decision::Rejected {
            reason: RejectionReason::MissingField { field: "title" },
        };
        let json = serde_json::to_value(&decision).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"status": "rejected", "reason": "missing_field", "field": "title"})
        );
    }
}
