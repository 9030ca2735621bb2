//! Property-based tests for the interval-overlap check.
//!
//! Intervals are half-open `[start, start + duration)`. The properties below
//! must hold for any start/duration pair, not just the hand-picked cases in
//! the unit tests.

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use uuid::Uuid;

use salon_booking::{
    db::ReferenceData,
    models::scheduling::{AppointmentStatus, ScheduleEntry},
    services::conflict::{ConflictCandidate, ConflictDetector},
};

// PROPERTY TEST STRATEGIES

/// Minutes from midnight and a duration, both inside one day
fn slot_strategy() -> impl Strategy<Value = (i64, u32)> {
    (0i64..1200, 5u32..=240)
}

fn status_strategy() -> impl Strategy<Value = AppointmentStatus> {
    prop_oneof![
        Just(AppointmentStatus::Pending),
        Just(AppointmentStatus::Confirmed),
        Just(AppointmentStatus::Completed),
    ]
}

fn day_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 10, 0, 0, 0).unwrap()
}

struct Agenda {
    staff: Uuid,
    location: Uuid,
    service: Uuid,
}

impl Agenda {
    fn new() -> Self {
        Self {
            staff: Uuid::new_v4(),
            location: Uuid::new_v4(),
            service: Uuid::new_v4(),
        }
    }

    fn entry(&self, offset: i64, minutes: u32, status: AppointmentStatus) -> ScheduleEntry {
        let starts_at = day_start() + Duration::minutes(offset);
        ScheduleEntry {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            location_id: self.location,
            staff_id: self.staff,
            service_id: self.service,
            client_id: None,
            client_name: "Cliente".into(),
            starts_at,
            duration_minutes: Some(minutes),
            status,
            notes: None,
            created_at: starts_at,
            updated_at: starts_at,
        }
    }

    fn candidate(&self, offset: i64, minutes: u32) -> ConflictCandidate {
        ConflictCandidate {
            staff_id: self.staff,
            location_id: self.location,
            service_id: self.service,
            starts_at: day_start() + Duration::minutes(offset),
            duration_minutes: Some(minutes),
            exclude_entry_id: None,
        }
    }
}

fn overlaps(a: (i64, u32), b: (i64, u32)) -> bool {
    a.0 < b.0 + i64::from(b.1) && a.0 + i64::from(a.1) > b.0
}

proptest! {
    /// The detector agrees with the plain half-open interval test
    #[test]
    fn conflict_iff_intervals_intersect(
        existing in slot_strategy(),
        proposed in slot_strategy(),
        status in status_strategy(),
    ) {
        let reference = ReferenceData::default();
        let agenda = Agenda::new();
        let schedule = vec![agenda.entry(existing.0, existing.1, status)];

        let found = ConflictDetector::new(&reference)
            .find_conflict(&agenda.candidate(proposed.0, proposed.1), &schedule);

        prop_assert_eq!(found.is_some(), overlaps(existing, proposed));
    }

    /// Back-to-back slots never collide
    #[test]
    fn touching_intervals_do_not_conflict((offset, minutes) in slot_strategy(), next in 5u32..=240) {
        let reference = ReferenceData::default();
        let agenda = Agenda::new();
        let schedule = vec![agenda.entry(offset, minutes, AppointmentStatus::Confirmed)];

        let after = agenda.candidate(offset + i64::from(minutes), next);
        let before = agenda.candidate(offset - i64::from(next), next);
        let detector = ConflictDetector::new(&reference);

        prop_assert!(detector.find_conflict(&after, &schedule).is_none());
        prop_assert!(detector.find_conflict(&before, &schedule).is_none());
    }

    /// Cancelled entries never block anything
    #[test]
    fn cancelled_entries_are_ignored(existing in slot_strategy(), proposed in slot_strategy()) {
        let reference = ReferenceData::default();
        let agenda = Agenda::new();
        let schedule = vec![agenda.entry(existing.0, existing.1, AppointmentStatus::Cancelled)];

        let found = ConflictDetector::new(&reference)
            .find_conflict(&agenda.candidate(proposed.0, proposed.1), &schedule);

        prop_assert!(found.is_none());
    }

    /// Whether a conflict exists does not depend on the order of the schedule
    #[test]
    fn result_is_independent_of_schedule_order(
        slots in prop::collection::vec(slot_strategy(), 0..8),
        proposed in slot_strategy(),
    ) {
        let reference = ReferenceData::default();
        let agenda = Agenda::new();
        let schedule: Vec<ScheduleEntry> = slots
            .iter()
            .map(|(offset, minutes)| agenda.entry(*offset, *minutes, AppointmentStatus::Confirmed))
            .collect();
        let mut reversed = schedule.clone();
        reversed.reverse();

        let detector = ConflictDetector::new(&reference);
        let candidate = agenda.candidate(proposed.0, proposed.1);

        prop_assert_eq!(
            detector.find_conflict(&candidate, &schedule).is_some(),
            detector.find_conflict(&candidate, &reversed).is_some()
        );
        prop_assert_eq!(
            detector.find_conflict(&candidate, &schedule).is_some(),
            slots.iter().any(|slot| overlaps(*slot, proposed))
        );
    }

    /// Another staff member's agenda is never consulted
    #[test]
    fn other_staff_never_conflicts(existing in slot_strategy()) {
        let reference = ReferenceData::default();
        let agenda = Agenda::new();
        let schedule = vec![agenda.entry(existing.0, existing.1, AppointmentStatus::Confirmed)];

        let mut candidate = agenda.candidate(existing.0, existing.1);
        candidate.staff_id = Uuid::new_v4();

        prop_assert!(ConflictDetector::new(&reference).find_conflict(&candidate, &schedule).is_none());
    }
}
