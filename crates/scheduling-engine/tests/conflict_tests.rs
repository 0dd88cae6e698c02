//! Tests for candidate-versus-existing conflict detection.

use chrono::{DateTime, TimeZone, Utc};
use scheduling_engine::{
    find_conflicts, has_conflict, has_conflict_in, Appointment, AppointmentSource, OverlapQuery,
    SchedulingError,
};

/// Helper to build a UTC instant on March 12 2026.
fn at(hour: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 12, hour, min, 0).unwrap()
}

fn appointment(
    id: i64,
    customer: i64,
    contact: i64,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Appointment {
    Appointment::new(id, customer, contact, start, end).unwrap()
}

fn candidate(start: DateTime<Utc>, end: DateTime<Utc>) -> OverlapQuery {
    OverlapQuery::for_candidate(5, 2, None, start, end)
}

#[test]
fn touching_appointments_do_not_conflict() {
    // Existing 10:00-11:00, candidate 11:00-12:00 → adjacent, not overlapping
    let existing = vec![appointment(1, 5, 2, at(10, 0), at(11, 0))];
    assert!(!has_conflict(&candidate(at(11, 0), at(12, 0)), &existing));
    assert!(!has_conflict(&candidate(at(9, 0), at(10, 0)), &existing));
}

#[test]
fn one_minute_overlap_conflicts() {
    // Existing 10:00-11:00, candidate 10:59-11:01
    let existing = vec![appointment(1, 5, 2, at(10, 0), at(11, 0))];
    assert!(has_conflict(&candidate(at(10, 59), at(11, 1)), &existing));
}

#[test]
fn contained_and_containing_intervals_conflict() {
    let existing = vec![appointment(1, 5, 2, at(10, 0), at(11, 0))];
    assert!(has_conflict(&candidate(at(10, 15), at(10, 45)), &existing));
    assert!(has_conflict(&candidate(at(9, 0), at(12, 0)), &existing));
    assert!(has_conflict(&candidate(at(10, 0), at(11, 0)), &existing));
}

#[test]
fn customer_match_alone_is_enough() {
    let existing = vec![appointment(1, 5, 99, at(10, 0), at(11, 0))];
    assert!(has_conflict(&candidate(at(10, 30), at(11, 30)), &existing));
}

#[test]
fn contact_match_alone_is_enough() {
    let existing = vec![appointment(1, 99, 2, at(10, 0), at(11, 0))];
    assert!(has_conflict(&candidate(at(10, 30), at(11, 30)), &existing));
}

#[test]
fn unrelated_parties_never_conflict() {
    let existing = vec![appointment(1, 98, 99, at(10, 0), at(11, 0))];
    assert!(!has_conflict(&candidate(at(10, 0), at(11, 0)), &existing));
}

#[test]
fn editing_excludes_only_the_edited_record() {
    // Appointment 7 moves from 09:00-10:00 to 09:15-10:15; appointment 8 sits at 10:00-10:30.
    let existing = vec![
        appointment(7, 5, 2, at(9, 0), at(10, 0)),
        appointment(8, 5, 3, at(10, 0), at(10, 30)),
    ];
    let edit = OverlapQuery::for_candidate(5, 2, Some(7), at(9, 15), at(10, 15));
    let conflicts = find_conflicts(&edit, &existing);

    assert_eq!(conflicts.len(), 1, "only appointment 8 should conflict");
    assert_eq!(conflicts[0].appointment.id, 8);
    assert_eq!(conflicts[0].overlap_minutes, 15);
}

#[test]
fn empty_snapshot_has_no_conflicts() {
    assert!(!has_conflict(&candidate(at(9, 0), at(10, 0)), &[]));
    assert!(find_conflicts(&candidate(at(9, 0), at(10, 0)), &[]).is_empty());
}

#[test]
fn query_predicate_matches_detection() {
    let existing = vec![
        appointment(1, 5, 2, at(8, 0), at(9, 0)),
        appointment(2, 5, 2, at(9, 30), at(9, 45)),
        appointment(3, 6, 7, at(9, 30), at(9, 45)),
    ];
    let query = candidate(at(9, 0), at(10, 0));
    let matched: Vec<i64> = existing
        .iter()
        .filter(|a| query.matches(a))
        .map(|a| a.id)
        .collect();
    assert_eq!(matched, vec![2]);
}

// ── sources ─────────────────────────────────────────────────────────────────

/// A store that ignores the query and returns everything it holds.
struct Unfiltered(Vec<Appointment>);

impl AppointmentSource for Unfiltered {
    fn fetch_for_overlap_check(
        &self,
        _query: &OverlapQuery,
    ) -> Result<Vec<Appointment>, SchedulingError> {
        Ok(self.0.clone())
    }
}

struct Broken;

impl AppointmentSource for Broken {
    fn fetch_for_overlap_check(
        &self,
        _query: &OverlapQuery,
    ) -> Result<Vec<Appointment>, SchedulingError> {
        Err(SchedulingError::DataUnavailable("query failed".to_string()))
    }
}

#[test]
fn over_wide_source_is_refiltered() {
    let store = Unfiltered(vec![
        appointment(1, 98, 99, at(9, 0), at(10, 0)),
        appointment(2, 5, 2, at(10, 0), at(11, 0)),
    ]);
    assert!(!has_conflict_in(&store, &candidate(at(9, 0), at(10, 0))));
}

#[test]
fn broken_source_reports_conflict() {
    assert!(has_conflict_in(&Broken, &candidate(at(9, 0), at(10, 0))));
}

#[test]
fn slice_snapshot_is_a_source() {
    let existing = [appointment(1, 5, 2, at(9, 0), at(10, 0))];
    assert!(has_conflict_in(&existing[..], &candidate(at(9, 30), at(10, 30))));
}
