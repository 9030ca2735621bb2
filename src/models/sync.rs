// src/models/sync.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// Os recursos que precisam ser recarregados quando o local ativo muda.
// A ordem de declaração é a ordem em que aparecem nas mensagens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum SyncResource {
    Appointments,
    Clients,
    Staff,
    LocationServices,
}

impl SyncResource {
    pub const REQUIRED: [SyncResource; 4] = [
        SyncResource::Appointments,
        SyncResource::Clients,
        SyncResource::Staff,
        SyncResource::LocationServices,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SyncResource::Appointments => "appointments",
            SyncResource::Clients => "clients",
            SyncResource::Staff => "staff",
            SyncResource::LocationServices => "location-services",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::REQUIRED.iter().copied().find(|r| r.as_str() == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Idle,
    Updating,
    Error,
}

// Resposta do `can_operate()`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OperateCheck {
    pub can_operate: bool,
    pub state: SyncStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_resources: Option<Vec<SyncResource>>,

    // `true` quando o estado de erro veio de um timeout de sincronização
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub timed_out: bool,
}
