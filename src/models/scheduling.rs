// src/models/scheduling.rs

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;
use utoipa::ToSchema;

use crate::models::tenancy::ClientAssertedContext;

// --- Enums ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }

    // Um turno "aberto" ainda pode ser movido ou cancelado
    pub fn is_open(&self) -> bool {
        matches!(self, AppointmentStatus::Pending | AppointmentStatus::Confirmed)
    }

    /// pending -> confirmed -> completed; qualquer turno aberto pode ser cancelado.
    /// Nunca se volta para `pending`.
    pub fn can_transition_to(&self, next: AppointmentStatus) -> bool {
        use AppointmentStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed) | (Confirmed, Completed) | (Pending | Confirmed, Cancelled)
        )
    }
}

// ---
// 1. AppointmentIntent (O pedido ainda não validado)
// ---
// Efémero: só vira ScheduleEntry depois de passar pelo pipeline.
// Os campos obrigatórios são `Option` de propósito: a ausência é uma regra de
// negócio (MISSING_REQUIRED_FIELD), não um erro de desserialização.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentIntent {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub tenant_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    pub client_id: Option<Uuid>,

    #[validate(length(max = 120, message = "O nome do cliente deve ter no máximo 120 caracteres."))]
    #[schema(example = "Maria Souza")]
    pub client_name: Option<String>,

    pub staff_id: Option<Uuid>,
    pub service_id: Option<Uuid>,

    // Data/hora absoluta em RFC 3339 (ex: 2026-03-10T14:30:00-03:00)
    #[schema(example = "2026-03-10T14:30:00-03:00")]
    pub starts_at: Option<String>,

    #[validate(range(min = 1, max = 720, message = "A duração deve estar entre 1 e 720 minutos."))]
    #[schema(example = 45)]
    pub duration_minutes: Option<u32>,

    #[validate(length(max = 500, message = "As observações devem ter no máximo 500 caracteres."))]
    pub notes: Option<String>,
}

impl AppointmentIntent {
    pub fn asserted_context(&self) -> ClientAssertedContext {
        ClientAssertedContext {
            tenant_id: self.tenant_id,
            location_id: self.location_id,
        }
    }
}

// ---
// 2. ScheduleEntry (O "Turno" agendado)
// ---
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub location_id: Uuid,
    pub staff_id: Uuid,
    pub service_id: Uuid,
    pub client_id: Option<Uuid>,
    #[schema(example = "Maria Souza")]
    pub client_name: String,
    pub starts_at: DateTime<Utc>,

    // Resolvida a partir do serviço no momento da criação
    #[schema(example = 45)]
    pub duration_minutes: Option<u32>,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ScheduleEntry {
    /// Materializa um turno a partir de um pedido já validado.
    pub fn from_normalized(appointment: &NormalizedAppointment, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            tenant_id: appointment.tenant_id,
            location_id: appointment.location_id,
            staff_id: appointment.staff_id,
            service_id: appointment.service_id,
            client_id: appointment.client_id,
            client_name: appointment.client_name.clone(),
            starts_at: appointment.starts_at,
            duration_minutes: Some(appointment.duration_minutes),
            status: AppointmentStatus::Pending,
            notes: appointment.notes.clone(),
            created_at: now,
            updated_at: now,
        }
    }
}

// ---
// 3. NormalizedAppointment (O pedido validado, pronto para persistir)
// ---
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedAppointment {
    pub tenant_id: Uuid,
    pub location_id: Uuid,
    pub staff_id: Uuid,
    pub service_id: Uuid,
    pub client_id: Option<Uuid>,
    pub client_name: String,
    pub starts_at: DateTime<Utc>,
    pub duration_minutes: u32,
    pub notes: Option<String>,
}

impl NormalizedAppointment {
    pub fn ends_at(&self) -> DateTime<Utc> {
        self.starts_at + Duration::minutes(i64::from(self.duration_minutes))
    }
}
