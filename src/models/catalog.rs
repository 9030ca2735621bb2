// src/models/catalog.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::tenancy::default_true;

// --- Serviços (O que o salão vende) ---

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,

    // Duração padrão em minutos. Pode ser sobrescrita por local.
    pub duration_minutes: Option<u32>,
    pub price: Option<Decimal>,

    #[serde(default = "default_true")]
    pub is_active: bool,
}

// Vínculo Local <-> Serviço, com preço/duração opcionais por local
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationService {
    pub location_id: Uuid,
    pub service_id: Uuid,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub price_override: Option<Decimal>,
    pub duration_override: Option<u32>,
}

// --- Equipa ---

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Staff {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub full_name: String,
    #[serde(default = "default_true")]
    pub is_active: bool,

    // Lista explícita de serviços que o profissional faz.
    // `None` (ou vazia) = faz todos os serviços do local.
    #[serde(default)]
    pub service_ids: Option<Vec<Uuid>>,
}

impl Staff {
    pub fn declares_capabilities(&self) -> bool {
        self.service_ids.as_ref().is_some_and(|ids| !ids.is_empty())
    }

    pub fn can_perform(&self, service_id: Uuid) -> bool {
        match &self.service_ids {
            Some(ids) if !ids.is_empty() => ids.contains(&service_id),
            _ => true,
        }
    }
}

// Vínculo Local <-> Profissional
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationStaff {
    pub location_id: Uuid,
    pub staff_id: Uuid,
    #[serde(default = "default_true")]
    pub is_active: bool,
}
