// src/services/appointment_validator.rs

use chrono::{DateTime, Datelike, Duration, Utc};
use uuid::Uuid;

use crate::{
    db::ReferenceData,
    models::{
        catalog::{Service, Staff},
        scheduling::{AppointmentIntent, NormalizedAppointment, ScheduleEntry},
        tenancy::Location,
        validation::{ErrorCode, RuleViolation},
    },
    services::conflict::{ConflictCandidate, ConflictDetector},
};

// Campos obrigatórios já extraídos do pedido
struct RequiredFields<'i> {
    tenant_id: Uuid,
    location_id: Uuid,
    staff_id: Uuid,
    service_id: Uuid,
    starts_at: &'i str,
}

/// Cadeia de regras de negócio de um turno, sempre na mesma ordem.
/// Para na primeira regra violada.
pub struct AppointmentValidator<'a> {
    reference: &'a ReferenceData,
    schedule: &'a [ScheduleEntry],
}

impl<'a> AppointmentValidator<'a> {
    pub fn new(reference: &'a ReferenceData, schedule: &'a [ScheduleEntry]) -> Self {
        Self { reference, schedule }
    }

    pub fn validate(&self, intent: &AppointmentIntent) -> Result<NormalizedAppointment, RuleViolation> {
        self.validate_excluding(intent, None)
    }

    /// Igual a `validate`, mas ignora o turno `exclude_entry_id` na verificação
    /// de conflito (reagendamento).
    pub fn validate_excluding(
        &self,
        intent: &AppointmentIntent,
        exclude_entry_id: Option<Uuid>,
    ) -> Result<NormalizedAppointment, RuleViolation> {
        // 1. Campos obrigatórios
        let fields = Self::required_fields(intent)?;

        // 2. Formato da data/hora
        let starts_at = Self::parse_start(fields.starts_at)?;

        // 3. O local pertence ao tenant
        let location = self.location_in_tenant(fields.location_id, fields.tenant_id)?;

        // 4. O serviço está ativo no local
        let service = self.service_in_location(location, fields.service_id)?;

        // 5. O profissional está ativo no local
        let staff = self.staff_in_location(location, fields.staff_id)?;

        // 6. O profissional faz o serviço
        self.staff_can_perform(location, staff, service)?;

        let duration_minutes = intent
            .duration_minutes
            .or_else(|| self.reference.resolve_duration(location.id, service.id))
            .ok_or_else(|| {
                RuleViolation::new(
                    ErrorCode::MissingRequiredField,
                    format!("Não foi possível determinar a duração do serviço '{}'. Informe durationMinutes.", service.name),
                )
            })?;

        // 7. O local está aberto
        Self::location_open(location, starts_at, duration_minutes)?;

        // 8. Sem sobreposição na agenda do profissional
        let candidate = ConflictCandidate {
            staff_id: staff.id,
            location_id: location.id,
            service_id: service.id,
            starts_at,
            duration_minutes: Some(duration_minutes),
            exclude_entry_id,
        };

        if let Some(conflict) = ConflictDetector::new(self.reference).find_conflict(&candidate, self.schedule) {
            return Err(RuleViolation::new(
                ErrorCode::StaffConflict,
                format!(
                    "{} já tem um turno às {} que se sobrepõe a este horário.",
                    staff.full_name,
                    conflict.starts_at.with_timezone(&location.local_offset()).format("%d/%m/%Y %H:%M")
                ),
            )
            .with_suggestions(conflict.suggestions));
        }

        Ok(NormalizedAppointment {
            tenant_id: fields.tenant_id,
            location_id: location.id,
            staff_id: staff.id,
            service_id: service.id,
            client_id: intent.client_id,
            client_name: Self::display_name(intent),
            starts_at,
            duration_minutes,
            notes: intent.notes.clone(),
        })
    }

    fn required_fields(intent: &AppointmentIntent) -> Result<RequiredFields<'_>, RuleViolation> {
        let starts_at = intent
            .starts_at
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());

        let mut missing = Vec::new();
        if intent.tenant_id.is_none() {
            missing.push("tenantId");
        }
        if intent.location_id.is_none() {
            missing.push("locationId");
        }
        if intent.staff_id.is_none() {
            missing.push("staffId");
        }
        if intent.service_id.is_none() {
            missing.push("serviceId");
        }
        if starts_at.is_none() {
            missing.push("startsAt");
        }

        match (intent.tenant_id, intent.location_id, intent.staff_id, intent.service_id, starts_at) {
            (Some(tenant_id), Some(location_id), Some(staff_id), Some(service_id), Some(starts_at)) => {
                Ok(RequiredFields {
                    tenant_id,
                    location_id,
                    staff_id,
                    service_id,
                    starts_at,
                })
            }
            _ => Err(RuleViolation::new(
                ErrorCode::MissingRequiredField,
                format!("Campos obrigatórios em falta: {}.", missing.join(", ")),
            )),
        }
    }

    fn parse_start(raw: &str) -> Result<DateTime<Utc>, RuleViolation> {
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|_| {
                RuleViolation::new(
                    ErrorCode::InvalidTimeFormat,
                    format!("'{}' não é uma data/hora válida. Use o formato ISO 8601 com fuso (ex: 2026-03-10T14:30:00-03:00).", raw),
                )
            })
    }

    fn location_in_tenant(&self, location_id: Uuid, tenant_id: Uuid) -> Result<&'a Location, RuleViolation> {
        self.reference
            .location(location_id)
            .filter(|l| l.tenant_id == tenant_id && l.is_active)
            .ok_or_else(|| {
                RuleViolation::new(
                    ErrorCode::LocationNotInTenant,
                    "O salão selecionado não pertence a este estabelecimento ou está inativo.",
                )
            })
    }

    fn service_in_location(&self, location: &Location, service_id: Uuid) -> Result<&'a Service, RuleViolation> {
        let service = self
            .reference
            .service(service_id)
            .filter(|s| s.is_active && s.tenant_id == location.tenant_id);

        let assigned = self
            .reference
            .location_service(location.id, service_id)
            .is_some_and(|ls| ls.is_active);

        match service {
            Some(service) if assigned => Ok(service),
            _ => Err(RuleViolation::new(
                ErrorCode::ServiceNotInLocation,
                format!("O serviço não está disponível no salão {}.", location.name),
            )),
        }
    }

    fn staff_in_location(&self, location: &Location, staff_id: Uuid) -> Result<&'a Staff, RuleViolation> {
        let staff = self.reference.staff_member(staff_id).filter(|s| s.is_active);

        let assigned = self
            .reference
            .location_staff(location.id, staff_id)
            .is_some_and(|ls| ls.is_active);

        match staff {
            Some(staff) if assigned => Ok(staff),
            _ => Err(RuleViolation::new(
                ErrorCode::StaffNotInLocation,
                format!("O profissional não trabalha no salão {}.", location.name),
            )),
        }
    }

    fn staff_can_perform(&self, location: &Location, staff: &Staff, service: &Service) -> Result<(), RuleViolation> {
        if staff.can_perform(service.id) {
            return Ok(());
        }

        let alternative = self
            .reference
            .active_staff_at(location.id)
            .filter(|other| other.id != staff.id)
            .find(|other| other.can_perform(service.id));

        let suggestion = match alternative {
            Some(other) => format!("{} realiza '{}' neste salão.", other.full_name, service.name),
            None => format!("Escolha um serviço que {} realize.", staff.full_name),
        };

        Err(RuleViolation::new(
            ErrorCode::StaffCantDoService,
            format!("{} não realiza o serviço '{}'.", staff.full_name, service.name),
        )
        .with_suggestions(vec![suggestion]))
    }

    fn location_open(location: &Location, starts_at: DateTime<Utc>, duration_minutes: u32) -> Result<(), RuleViolation> {
        // Sem horário declarado = sempre aberto
        let Some(windows) = &location.opening_hours else {
            return Ok(());
        };

        let offset = location.local_offset();
        let local_start = starts_at.with_timezone(&offset);
        let local_end = local_start + Duration::minutes(i64::from(duration_minutes));
        let weekday = local_start.weekday();

        let same_day = local_end.date_naive() == local_start.date_naive();
        let todays: Vec<_> = windows.iter().filter(|w| w.weekday == weekday).collect();

        let fits = same_day
            && todays
                .iter()
                .any(|w| w.opens_at <= local_start.time() && local_end.time() <= w.closes_at);

        if fits {
            return Ok(());
        }

        let suggestions = if todays.is_empty() {
            vec![format!("O salão {} não abre neste dia da semana.", location.name)]
        } else {
            todays
                .iter()
                .map(|w| format!("Horário de atendimento: {} às {}.", w.opens_at.format("%H:%M"), w.closes_at.format("%H:%M")))
                .collect()
        };

        Err(RuleViolation::new(
            ErrorCode::LocationClosed,
            format!(
                "O salão {} está fechado em {}.",
                location.name,
                local_start.format("%d/%m/%Y %H:%M")
            ),
        )
        .with_suggestions(suggestions))
    }

    fn display_name(intent: &AppointmentIntent) -> String {
        if let Some(name) = intent.client_name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            return name.to_string();
        }

        match intent.client_id {
            Some(id) => {
                let short = id.simple().to_string();
                format!("Cliente {}", &short[..8])
            }
            None => "Cliente avulso".to_string(),
        }
    }
}
