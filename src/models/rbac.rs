// src/models/rbac.rs

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use utoipa::ToSchema;

// ---
// 1. Role (O "Cargo" do utilizador dentro do tenant)
// ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Owner,
    Admin,
    Staff,
    Viewer,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Owner, Role::Admin, Role::Staff, Role::Viewer];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Admin => "admin",
            Role::Staff => "staff",
            Role::Viewer => "viewer",
        }
    }
}

// ---
// 2. Operation (A "Permissão" no formato recurso.ação.escopo)
// ---
// Operações terminadas em `.own_location` são escopadas ao local do utilizador.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum Operation {
    #[serde(rename = "appointment.create.all")]
    AppointmentCreateAll,
    #[serde(rename = "appointment.create.own_location")]
    AppointmentCreateOwnLocation,
    #[serde(rename = "appointment.update.all")]
    AppointmentUpdateAll,
    #[serde(rename = "appointment.update.own_location")]
    AppointmentUpdateOwnLocation,
    #[serde(rename = "appointment.cancel.all")]
    AppointmentCancelAll,
    #[serde(rename = "appointment.cancel.own_location")]
    AppointmentCancelOwnLocation,
    #[serde(rename = "appointment.read.all")]
    AppointmentReadAll,
    #[serde(rename = "appointment.read.own_location")]
    AppointmentReadOwnLocation,
    #[serde(rename = "client.read.all")]
    ClientReadAll,
    #[serde(rename = "client.write.all")]
    ClientWriteAll,
    #[serde(rename = "staff.manage.all")]
    StaffManageAll,
    #[serde(rename = "finance.read.all")]
    FinanceReadAll,
    #[serde(rename = "finance.read.own_location")]
    FinanceReadOwnLocation,
    #[serde(rename = "location.manage.all")]
    LocationManageAll,
    #[serde(rename = "settings.manage.all")]
    SettingsManageAll,
}

impl Operation {
    pub const ALL: [Operation; 15] = [
        Operation::AppointmentCreateAll,
        Operation::AppointmentCreateOwnLocation,
        Operation::AppointmentUpdateAll,
        Operation::AppointmentUpdateOwnLocation,
        Operation::AppointmentCancelAll,
        Operation::AppointmentCancelOwnLocation,
        Operation::AppointmentReadAll,
        Operation::AppointmentReadOwnLocation,
        Operation::ClientReadAll,
        Operation::ClientWriteAll,
        Operation::StaffManageAll,
        Operation::FinanceReadAll,
        Operation::FinanceReadOwnLocation,
        Operation::LocationManageAll,
        Operation::SettingsManageAll,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::AppointmentCreateAll => "appointment.create.all",
            Operation::AppointmentCreateOwnLocation => "appointment.create.own_location",
            Operation::AppointmentUpdateAll => "appointment.update.all",
            Operation::AppointmentUpdateOwnLocation => "appointment.update.own_location",
            Operation::AppointmentCancelAll => "appointment.cancel.all",
            Operation::AppointmentCancelOwnLocation => "appointment.cancel.own_location",
            Operation::AppointmentReadAll => "appointment.read.all",
            Operation::AppointmentReadOwnLocation => "appointment.read.own_location",
            Operation::ClientReadAll => "client.read.all",
            Operation::ClientWriteAll => "client.write.all",
            Operation::StaffManageAll => "staff.manage.all",
            Operation::FinanceReadAll => "finance.read.all",
            Operation::FinanceReadOwnLocation => "finance.read.own_location",
            Operation::LocationManageAll => "location.manage.all",
            Operation::SettingsManageAll => "settings.manage.all",
        }
    }

    /// Converte o slug ("appointment.create.own_location") na operação tipada.
    pub fn parse(slug: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|op| op.as_str() == slug)
    }

    pub fn is_scoped(&self) -> bool {
        self.as_str().ends_with(".own_location")
    }

    /// A versão sem escopo de uma operação `.own_location`, quando existe.
    pub fn broad_counterpart(&self) -> Option<Self> {
        match self {
            Operation::AppointmentCreateOwnLocation => Some(Operation::AppointmentCreateAll),
            Operation::AppointmentUpdateOwnLocation => Some(Operation::AppointmentUpdateAll),
            Operation::AppointmentCancelOwnLocation => Some(Operation::AppointmentCancelAll),
            Operation::AppointmentReadOwnLocation => Some(Operation::AppointmentReadAll),
            Operation::FinanceReadOwnLocation => Some(Operation::FinanceReadAll),
            _ => None,
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---
// 3. PermissionDecision (O "Veredito")
// ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PermissionReason {
    Granted,
    RoleNotAuthorized,
    ScopeViolation,
}

impl PermissionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionReason::Granted => "GRANTED",
            PermissionReason::RoleNotAuthorized => "ROLE_NOT_AUTHORIZED",
            PermissionReason::ScopeViolation => "SCOPE_VIOLATION",
        }
    }
}

// Derivada apenas das tabelas estáticas. Nunca é persistida.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PermissionDecision {
    pub permitted: bool,
    pub role: Role,
    pub operation: Operation,
    pub reason: PermissionReason,
    pub scoped_tenant_id: Uuid,
    pub scoped_location_id: Option<Uuid>,
}

// Resposta do GET /api/permissions
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RolePermissions {
    pub role: Role,
    pub operations: Vec<Operation>,
}
