// src/db/demo_repo.rs

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::scheduling::{AppointmentStatus, NormalizedAppointment, ScheduleEntry},
};

/// O caminho de escrita dos turnos.
///
/// As regras de negócio NÃO vivem aqui: quem chama já passou pelo
/// `OperationValidator`. Trocar de backend (demo, banco real) troca só este
/// adaptador.
#[async_trait]
pub trait BookingBackend: Send + Sync {
    async fn persist_appointment(&self, appointment: &NormalizedAppointment) -> Result<ScheduleEntry, AppError>;

    async fn update_status(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        status: AppointmentStatus,
    ) -> Result<ScheduleEntry, AppError>;

    async fn reschedule(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        staff_id: Uuid,
        starts_at: DateTime<Utc>,
        duration_minutes: u32,
    ) -> Result<ScheduleEntry, AppError>;

    async fn list_appointments(&self, tenant_id: Uuid) -> Result<Vec<ScheduleEntry>, AppError>;
}

// ---
// Backend de demonstração (em memória)
// ---
#[derive(Clone, Default)]
pub struct DemoBookingBackend {
    rows: Arc<RwLock<HashMap<Uuid, ScheduleEntry>>>,
}

impl DemoBookingBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookingBackend for DemoBookingBackend {
    async fn persist_appointment(&self, appointment: &NormalizedAppointment) -> Result<ScheduleEntry, AppError> {
        let entry = ScheduleEntry::from_normalized(appointment, Utc::now());

        self.rows.write().await.insert(entry.id, entry.clone());
        tracing::info!(appointment_id = %entry.id, "Turno gravado (modo demonstração)");

        Ok(entry)
    }

    async fn update_status(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        status: AppointmentStatus,
    ) -> Result<ScheduleEntry, AppError> {
        let mut rows = self.rows.write().await;
        let entry = rows
            .get_mut(&id)
            .filter(|e| e.tenant_id == tenant_id)
            .ok_or_else(|| AppError::ResourceNotFound(format!("Turno {}", id)))?;

        entry.status = status;
        entry.updated_at = Utc::now();
        Ok(entry.clone())
    }

    async fn reschedule(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        staff_id: Uuid,
        starts_at: DateTime<Utc>,
        duration_minutes: u32,
    ) -> Result<ScheduleEntry, AppError> {
        let mut rows = self.rows.write().await;
        let entry = rows
            .get_mut(&id)
            .filter(|e| e.tenant_id == tenant_id)
            .ok_or_else(|| AppError::ResourceNotFound(format!("Turno {}", id)))?;

        entry.staff_id = staff_id;
        entry.starts_at = starts_at;
        entry.duration_minutes = Some(duration_minutes);
        entry.updated_at = Utc::now();
        Ok(entry.clone())
    }

    async fn list_appointments(&self, tenant_id: Uuid) -> Result<Vec<ScheduleEntry>, AppError> {
        let rows = self.rows.read().await;
        let mut entries: Vec<ScheduleEntry> = rows
            .values()
            .filter(|e| e.tenant_id == tenant_id)
            .cloned()
            .collect();
        entries.sort_by_key(|e| e.starts_at);
        Ok(entries)
    }
}
