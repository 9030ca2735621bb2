// src/db/reference_repo.rs

use std::{
    path::Path,
    sync::{Arc, PoisonError, RwLock},
};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        catalog::{LocationService, LocationStaff, Service, Staff},
        tenancy::Location,
    },
};

// ---
// Dados de referência (já carregados pela camada CRUD)
// ---
// O pipeline nunca busca estes dados sozinho: recebe as coleções prontas.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceData {
    #[serde(default)]
    pub locations: Vec<Location>,
    #[serde(default)]
    pub services: Vec<Service>,
    #[serde(default)]
    pub location_services: Vec<LocationService>,
    #[serde(default)]
    pub staff: Vec<Staff>,
    #[serde(default)]
    pub location_staff: Vec<LocationStaff>,
}

impl ReferenceData {
    pub fn location(&self, id: Uuid) -> Option<&Location> {
        self.locations.iter().find(|l| l.id == id)
    }

    pub fn service(&self, id: Uuid) -> Option<&Service> {
        self.services.iter().find(|s| s.id == id)
    }

    pub fn staff_member(&self, id: Uuid) -> Option<&Staff> {
        self.staff.iter().find(|s| s.id == id)
    }

    pub fn location_service(&self, location_id: Uuid, service_id: Uuid) -> Option<&LocationService> {
        self.location_services
            .iter()
            .find(|ls| ls.location_id == location_id && ls.service_id == service_id)
    }

    pub fn location_staff(&self, location_id: Uuid, staff_id: Uuid) -> Option<&LocationStaff> {
        self.location_staff
            .iter()
            .find(|ls| ls.location_id == location_id && ls.staff_id == staff_id)
    }

    /// Profissionais ativos com vínculo ativo no local.
    pub fn active_staff_at(&self, location_id: Uuid) -> impl Iterator<Item = &Staff> + '_ {
        self.location_staff
            .iter()
            .filter(move |ls| ls.location_id == location_id && ls.is_active)
            .filter_map(|ls| self.staff_member(ls.staff_id))
            .filter(|s| s.is_active)
    }

    /// Duração de um serviço num local: override do local, senão a do serviço.
    pub fn resolve_duration(&self, location_id: Uuid, service_id: Uuid) -> Option<u32> {
        self.location_service(location_id, service_id)
            .and_then(|ls| ls.duration_override)
            .or_else(|| self.service(service_id).and_then(|s| s.duration_minutes))
    }

    /// Troca a fatia de um tenant pela que chegou, mantendo a dos outros.
    /// Vínculos (local-serviço, local-profissional) pertencem ao tenant do local.
    pub fn with_tenant_replaced(&self, tenant_id: Uuid, incoming: ReferenceData) -> ReferenceData {
        let owns_location = |data: &ReferenceData, location_id: Uuid| {
            data.location(location_id).is_some_and(|l| l.tenant_id == tenant_id)
        };

        let mut next = ReferenceData {
            locations: self.locations.iter().filter(|l| l.tenant_id != tenant_id).cloned().collect(),
            services: self.services.iter().filter(|s| s.tenant_id != tenant_id).cloned().collect(),
            location_services: self
                .location_services
                .iter()
                .filter(|ls| !owns_location(self, ls.location_id))
                .cloned()
                .collect(),
            staff: self.staff.iter().filter(|s| s.tenant_id != tenant_id).cloned().collect(),
            location_staff: self
                .location_staff
                .iter()
                .filter(|ls| !owns_location(self, ls.location_id))
                .cloned()
                .collect(),
        };

        next.locations.extend(incoming.locations.iter().filter(|l| l.tenant_id == tenant_id).cloned());
        next.services.extend(incoming.services.into_iter().filter(|s| s.tenant_id == tenant_id));
        next.staff.extend(incoming.staff.into_iter().filter(|s| s.tenant_id == tenant_id));
        next.location_services.extend(
            incoming
                .location_services
                .into_iter()
                .filter(|ls| next.locations.iter().any(|l| l.id == ls.location_id && l.tenant_id == tenant_id)),
        );
        next.location_staff.extend(
            incoming
                .location_staff
                .into_iter()
                .filter(|ls| next.locations.iter().any(|l| l.id == ls.location_id && l.tenant_id == tenant_id)),
        );

        next
    }

    pub fn from_json_str(raw: &str) -> Result<Self, AppError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }
}

// ---
// Repositório: guarda a versão atual e troca-a inteira de uma vez
// ---
#[derive(Clone, Default)]
pub struct ReferenceRepository {
    current: Arc<RwLock<Arc<ReferenceData>>>,
}

impl ReferenceRepository {
    pub fn new(data: ReferenceData) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(data))),
        }
    }

    pub fn current(&self) -> Arc<ReferenceData> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Substitui só os dados de um tenant e devolve a versão resultante.
    pub fn replace_tenant(&self, tenant_id: Uuid, incoming: ReferenceData) -> Arc<ReferenceData> {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let next = Arc::new(guard.with_tenant_replaced(tenant_id, incoming));
        *guard = next.clone();

        tracing::info!(tenant_id = %tenant_id, "Dados de referência do tenant atualizados");
        next
    }

    pub fn replace(&self, data: ReferenceData) {
        tracing::info!(
            locations = data.locations.len(),
            services = data.services.len(),
            staff = data.staff.len(),
            "Dados de referência atualizados"
        );
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(data);
    }
}
