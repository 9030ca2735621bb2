// src/models/tenancy.rs

use chrono::{DateTime, FixedOffset, NaiveTime, Offset, Utc, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::rbac::Role;

// ---
// 1. Location (O "Salão")
// ---
// Uma unidade física que pertence a um tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    #[serde(default = "default_true")]
    pub is_active: bool,

    // Fuso do salão em minutos (ex: -180 para UTC-3)
    #[serde(default)]
    pub utc_offset_minutes: i32,

    // `None` = sem horário declarado (sempre aberto)
    #[serde(default)]
    pub opening_hours: Option<Vec<OpeningWindow>>,
}

impl Location {
    pub fn local_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes * 60)
            .unwrap_or_else(|| Utc.fix())
    }
}

// Uma janela [open, close) num dia da semana. Vários registos no mesmo dia
// representam turnos partidos (ex: manhã e tarde).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpeningWindow {
    pub weekday: Weekday,
    pub opens_at: NaiveTime,
    pub closes_at: NaiveTime,
}

pub(crate) fn default_true() -> bool {
    true
}

// ---
// 2. TenantContext (A "Verdade" do servidor)
// ---
// Reconstruído a cada refresh de autenticação. Só leitura.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantContext {
    pub principal_id: Option<Uuid>,
    pub server_tenant_id: Option<Uuid>,
    pub server_location_id: Option<Uuid>,
}

// ---
// 3. Principal (O utilizador autenticado)
// ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub principal_id: Option<Uuid>,
    pub role: Role,
    pub server_tenant_id: Option<Uuid>,
    pub server_location_id: Option<Uuid>,
}

impl Principal {
    pub fn tenant_context(&self) -> TenantContext {
        TenantContext {
            principal_id: self.principal_id,
            server_tenant_id: self.server_tenant_id,
            server_location_id: self.server_location_id,
        }
    }
}

// ---
// 4. ClientAssertedContext (O que o cliente "diz")
// ---
// Nunca é confiável sem comparar com o TenantContext.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientAssertedContext {
    pub tenant_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
}

// ---
// 5. ContextSnapshot (Resultado de uma reconciliação bem-sucedida)
// ---
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextSnapshot {
    pub principal_id: Uuid,
    pub server_tenant_id: Uuid,
    pub asserted_tenant_id: Uuid,
    pub asserted_location_id: Option<Uuid>,
    pub timestamp: DateTime<Utc>,
}
