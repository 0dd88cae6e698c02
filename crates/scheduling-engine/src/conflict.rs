//! Detect appointments that overlap a candidate booking.
//!
//! Overlap is open-interval: two appointments overlap when
//! `a.start < b.end && b.start < a.end`. Appointments that merely touch,
//! where one ends exactly when the other starts, are NOT conflicts.
//!
//! Only appointments that share the candidate's customer *or* its contact are
//! compared, and the appointment being edited is excluded so a record never
//! conflicts with its own pre-edit self.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SchedulingError;

/// A stored appointment as seen by the conflict detector.
///
/// Start strictly precedes end; [`Appointment::new`] and deserialization
/// both enforce it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "AppointmentRecord")]
pub struct Appointment {
    pub id: i64,
    pub customer_id: i64,
    pub contact_id: i64,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Deserialize)]
struct AppointmentRecord {
    id: i64,
    customer_id: i64,
    contact_id: i64,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TryFrom<AppointmentRecord> for Appointment {
    type Error = SchedulingError;

    fn try_from(r: AppointmentRecord) -> Result<Self, Self::Error> {
        Appointment::new(r.id, r.customer_id, r.contact_id, r.start, r.end)
    }
}

impl Appointment {
    pub fn new(
        id: i64,
        customer_id: i64,
        contact_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Self, SchedulingError> {
        if start >= end {
            return Err(SchedulingError::InvalidAppointment(format!(
                "appointment {id}: start {start} is not before end {end}"
            )));
        }
        Ok(Self {
            id,
            customer_id,
            contact_id,
            start,
            end,
        })
    }
}

/// Whether `[a_start, a_end)` and `[b_start, b_end)` share any instant.
///
/// Symmetric in its two intervals; touching intervals do not overlap.
pub fn overlaps(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> bool {
    a_start < b_end && b_start < a_end
}

// ── OverlapQuery ────────────────────────────────────────────────────────────

/// The question asked of the appointment store for one candidate.
///
/// A store answering this query must return every appointment for which
/// [`OverlapQuery::matches`] holds. The query window is exactly the
/// candidate interval: since the overlap predicate itself is applied, no
/// appointment that could conflict lies outside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OverlapQuery {
    pub customer_id: i64,
    pub contact_id: i64,
    /// The appointment being edited, if any.
    pub exclude_id: Option<i64>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl OverlapQuery {
    pub fn for_candidate(
        customer_id: i64,
        contact_id: i64,
        exclude_id: Option<i64>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Self {
        Self {
            customer_id,
            contact_id,
            exclude_id,
            start,
            end,
        }
    }

    /// Whether `other` is a comparison candidate that overlaps this query.
    pub fn matches(&self, other: &Appointment) -> bool {
        self.shares_party(other) && overlaps(self.start, self.end, other.start, other.end)
    }

    fn shares_party(&self, other: &Appointment) -> bool {
        let same_party =
            other.customer_id == self.customer_id || other.contact_id == self.contact_id;
        same_party && Some(other.id) != self.exclude_id
    }
}

// ── Detection ───────────────────────────────────────────────────────────────

/// An existing appointment that overlaps the candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conflict {
    pub appointment: Appointment,
    pub overlap_minutes: i64,
}

/// Find every existing appointment that conflicts with the candidate.
///
/// The overlap duration is `min(a.end, b.end) - max(a.start, b.start)`.
pub fn find_conflicts(query: &OverlapQuery, existing: &[Appointment]) -> Vec<Conflict> {
    existing
        .iter()
        .filter(|other| query.matches(other))
        .map(|other| {
            let overlap_start = query.start.max(other.start);
            let overlap_end = query.end.min(other.end);
            tracing::debug!(
                appointment_id = other.id,
                customer_id = other.customer_id,
                contact_id = other.contact_id,
                "conflicting appointment"
            );
            Conflict {
                appointment: other.clone(),
                overlap_minutes: (overlap_end - overlap_start).num_minutes(),
            }
        })
        .collect()
}

/// Whether any existing appointment conflicts with the candidate.
///
/// Stops at the first match.
pub fn has_conflict(query: &OverlapQuery, existing: &[Appointment]) -> bool {
    existing.iter().any(|other| query.matches(other))
}

// ── AppointmentSource ───────────────────────────────────────────────────────

/// A collaborator that can list the appointments relevant to an
/// [`OverlapQuery`], typically backed by the relational store.
///
/// Implementations may return extra rows; the detector re-applies
/// [`OverlapQuery::matches`]. They must not return fewer.
pub trait AppointmentSource {
    fn fetch_for_overlap_check(
        &self,
        query: &OverlapQuery,
    ) -> Result<Vec<Appointment>, SchedulingError>;
}

impl AppointmentSource for [Appointment] {
    fn fetch_for_overlap_check(
        &self,
        query: &OverlapQuery,
    ) -> Result<Vec<Appointment>, SchedulingError> {
        Ok(self.iter().filter(|a| query.matches(a)).cloned().collect())
    }
}

impl AppointmentSource for Vec<Appointment> {
    fn fetch_for_overlap_check(
        &self,
        query: &OverlapQuery,
    ) -> Result<Vec<Appointment>, SchedulingError> {
        self.as_slice().fetch_for_overlap_check(query)
    }
}

impl<S: AppointmentSource + ?Sized> AppointmentSource for &S {
    fn fetch_for_overlap_check(
        &self,
        query: &OverlapQuery,
    ) -> Result<Vec<Appointment>, SchedulingError> {
        (**self).fetch_for_overlap_check(query)
    }
}

/// Ask `source` whether the candidate conflicts, failing closed.
///
/// If the source cannot answer, a conflict is reported.
pub fn has_conflict_in<S: AppointmentSource + ?Sized>(source: &S, query: &OverlapQuery) -> bool {
    match source.fetch_for_overlap_check(query) {
        Ok(rows) => has_conflict(query, &rows),
        Err(err) => {
            tracing::warn!(%err, "overlap check failed, treating as conflict");
            true
        }
    }
}
