// src/services/conflict.rs

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    db::ReferenceData,
    models::scheduling::{AppointmentStatus, ScheduleEntry},
};

// O turno que se quer marcar (ou mover)
#[derive(Debug, Clone, Copy)]
pub struct ConflictCandidate {
    pub staff_id: Uuid,
    pub location_id: Uuid,
    pub service_id: Uuid,
    pub starts_at: DateTime<Utc>,
    pub duration_minutes: Option<u32>,

    // Num reagendamento, o próprio turno não conta como conflito
    pub exclude_entry_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Conflict {
    pub entry_id: Uuid,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub suggestions: Vec<String>,
}

/// Deteta sobreposição de horários na agenda de um profissional num local.
///
/// Intervalos semiabertos `[início, início + duração)`: um turno que começa
/// exatamente quando outro acaba não conflita.
pub struct ConflictDetector<'a> {
    reference: &'a ReferenceData,
}

impl<'a> ConflictDetector<'a> {
    pub fn new(reference: &'a ReferenceData) -> Self {
        Self { reference }
    }

    fn entry_duration(&self, entry: &ScheduleEntry) -> Option<u32> {
        entry
            .duration_minutes
            .or_else(|| self.reference.resolve_duration(entry.location_id, entry.service_id))
    }

    /// Devolve o primeiro turno que colide com o candidato, se houver.
    ///
    /// Sem duração conhecida (de qualquer um dos lados) o par é ignorado: falta
    /// de dados nunca gera um conflito falso.
    pub fn find_conflict(&self, candidate: &ConflictCandidate, existing: &[ScheduleEntry]) -> Option<Conflict> {
        let candidate_minutes = candidate.duration_minutes.or_else(|| {
            self.reference
                .resolve_duration(candidate.location_id, candidate.service_id)
        })?;

        let candidate_start = candidate.starts_at;
        let candidate_end = candidate_start + Duration::minutes(i64::from(candidate_minutes));

        existing
            .iter()
            .filter(|e| e.staff_id == candidate.staff_id && e.location_id == candidate.location_id)
            .filter(|e| e.status != AppointmentStatus::Cancelled)
            .filter(|e| Some(e.id) != candidate.exclude_entry_id)
            .find_map(|entry| {
                let Some(minutes) = self.entry_duration(entry) else {
                    tracing::debug!(entry_id = %entry.id, "Turno sem duração resolvível, ignorado na verificação de conflito");
                    return None;
                };

                let existing_start = entry.starts_at;
                let existing_end = existing_start + Duration::minutes(i64::from(minutes));

                (candidate_start < existing_end && candidate_end > existing_start).then(|| Conflict {
                    entry_id: entry.id,
                    starts_at: existing_start,
                    ends_at: existing_end,
                    suggestions: vec![
                        "Escolha outro horário livre.".to_string(),
                        "Atribua o turno a outro profissional.".to_string(),
                    ],
                })
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, hour, minute, 0).unwrap()
    }

    fn entry(staff: Uuid, location: Uuid, starts_at: DateTime<Utc>, minutes: Option<u32>) -> ScheduleEntry {
        ScheduleEntry {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            location_id: location,
            staff_id: staff,
            service_id: Uuid::new_v4(),
            client_id: None,
            client_name: "Cliente".into(),
            starts_at,
            duration_minutes: minutes,
            status: AppointmentStatus::Confirmed,
            notes: None,
            created_at: starts_at,
            updated_at: starts_at,
        }
    }

    fn candidate(staff: Uuid, location: Uuid, starts_at: DateTime<Utc>, minutes: u32) -> ConflictCandidate {
        ConflictCandidate {
            staff_id: staff,
            location_id: location,
            service_id: Uuid::new_v4(),
            starts_at,
            duration_minutes: Some(minutes),
            exclude_entry_id: None,
        }
    }

    #[test]
    fn back_to_back_entries_do_not_conflict() {
        let reference = ReferenceData::default();
        let (staff, location) = (Uuid::new_v4(), Uuid::new_v4());
        let existing = vec![entry(staff, location, at(10, 0), Some(30))];

        let result = ConflictDetector::new(&reference)
            .find_conflict(&candidate(staff, location, at(10, 30), 30), &existing);

        assert!(result.is_none());
    }

    #[test]
    fn identical_start_is_a_conflict() {
        let reference = ReferenceData::default();
        let (staff, location) = (Uuid::new_v4(), Uuid::new_v4());
        let existing = vec![entry(staff, location, at(10, 0), Some(30))];

        let conflict = ConflictDetector::new(&reference)
            .find_conflict(&candidate(staff, location, at(10, 0), 15), &existing)
            .expect("conflito");

        assert_eq!(conflict.entry_id, existing[0].id);
        assert_eq!(conflict.starts_at, at(10, 0));
        assert_eq!(conflict.suggestions.len(), 2);
    }

    #[test]
    fn cancelled_and_other_staff_are_ignored() {
        let reference = ReferenceData::default();
        let (staff, location) = (Uuid::new_v4(), Uuid::new_v4());
        let mut cancelled = entry(staff, location, at(10, 0), Some(60));
        cancelled.status = AppointmentStatus::Cancelled;
        let other_staff = entry(Uuid::new_v4(), location, at(10, 0), Some(60));
        let other_location = entry(staff, Uuid::new_v4(), at(10, 0), Some(60));

        let result = ConflictDetector::new(&reference).find_conflict(
            &candidate(staff, location, at(10, 15), 30),
            &[cancelled, other_staff, other_location],
        );

        assert!(result.is_none());
    }

    #[test]
    fn unresolvable_duration_is_skipped() {
        let reference = ReferenceData::default();
        let (staff, location) = (Uuid::new_v4(), Uuid::new_v4());
        let existing = vec![entry(staff, location, at(10, 0), None)];

        let result = ConflictDetector::new(&reference)
            .find_conflict(&candidate(staff, location, at(10, 0), 30), &existing);

        assert!(result.is_none());
    }

    #[test]
    fn the_entry_being_moved_is_excluded() {
        let reference = ReferenceData::default();
        let (staff, location) = (Uuid::new_v4(), Uuid::new_v4());
        let existing = vec![entry(staff, location, at(10, 0), Some(60))];

        let mut moving = candidate(staff, location, at(10, 30), 60);
        moving.exclude_entry_id = Some(existing[0].id);

        assert!(ConflictDetector::new(&reference).find_conflict(&moving, &existing).is_none());
    }

    #[test]
    fn returns_only_the_first_collision() {
        let reference = ReferenceData::default();
        let (staff, location) = (Uuid::new_v4(), Uuid::new_v4());
        let existing = vec![
            entry(staff, location, at(9, 0), Some(90)),
            entry(staff, location, at(10, 0), Some(30)),
        ];

        let conflict = ConflictDetector::new(&reference)
            .find_conflict(&candidate(staff, location, at(10, 0), 30), &existing)
            .expect("conflito");

        assert_eq!(conflict.entry_id, existing[0].id);
    }
}
