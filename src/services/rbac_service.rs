// src/services/rbac_service.rs

use uuid::Uuid;

use crate::models::rbac::{Operation, PermissionDecision, PermissionReason, Role, RolePermissions};

// ---
// Tabela de permissões por cargo
// ---
// Fonte única de verdade: os predicados de conveniência abaixo consultam esta
// mesma tabela.
const OWNER_OPERATIONS: &[Operation] = &Operation::ALL;

const ADMIN_OPERATIONS: &[Operation] = &[
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
];

const STAFF_OPERATIONS: &[Operation] = &[
    Operation::AppointmentCreateOwnLocation,
    Operation::AppointmentUpdateOwnLocation,
    Operation::AppointmentCancelOwnLocation,
    Operation::AppointmentReadOwnLocation,
    Operation::ClientReadAll,
    Operation::ClientWriteAll,
    Operation::FinanceReadOwnLocation,
];

const VIEWER_OPERATIONS: &[Operation] = &[
    Operation::AppointmentReadOwnLocation,
    Operation::ClientReadAll,
];

/// Resolve (cargo, operação, escopo) -> permitido/negado.
///
/// Não faz I/O e não guarda estado: pode ser copiado e chamado de qualquer
/// thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct PermissionResolver;

impl PermissionResolver {
    pub fn new() -> Self {
        Self
    }

    pub fn operations_for(&self, role: Role) -> &'static [Operation] {
        match role {
            Role::Owner => OWNER_OPERATIONS,
            Role::Admin => ADMIN_OPERATIONS,
            Role::Staff => STAFF_OPERATIONS,
            Role::Viewer => VIEWER_OPERATIONS,
        }
    }

    pub fn role_has(&self, role: Role, operation: Operation) -> bool {
        self.operations_for(role).contains(&operation)
    }

    pub fn check_permission(
        &self,
        principal_id: Uuid,
        role: Role,
        operation: Operation,
        scoped_tenant_id: Uuid,
        scoped_location_id: Option<Uuid>,
        resource_location_id: Option<Uuid>,
    ) -> PermissionDecision {
        let reason = if !self.role_has(role, operation) {
            PermissionReason::RoleNotAuthorized
        } else if operation.is_scoped()
            && resource_location_id.is_some()
            && resource_location_id != scoped_location_id
        {
            // O cargo tem a capacidade, mas não sobre este local
            PermissionReason::ScopeViolation
        } else {
            PermissionReason::Granted
        };

        let permitted = reason == PermissionReason::Granted;

        if !permitted {
            tracing::debug!(
                principal_id = %principal_id,
                role = role.as_str(),
                operation = operation.as_str(),
                reason = reason.as_str(),
                "Permissão negada"
            );
        }

        PermissionDecision {
            permitted,
            role,
            operation,
            reason,
            scoped_tenant_id,
            scoped_location_id,
        }
    }

    /// Escolhe a variante mais ampla de uma operação que o cargo possui.
    /// Quem tem `appointment.create.all` não fica preso ao próprio local.
    pub fn effective_operation(&self, role: Role, scoped: Operation) -> Operation {
        match scoped.broad_counterpart() {
            Some(broad) if self.role_has(role, broad) => broad,
            _ => scoped,
        }
    }

    // --- Predicados de conveniência ---

    pub fn can_create_appointments(&self, role: Role) -> bool {
        self.role_has(role, Operation::AppointmentCreateOwnLocation)
            || self.role_has(role, Operation::AppointmentCreateAll)
    }

    pub fn can_cancel_appointments(&self, role: Role) -> bool {
        self.role_has(role, Operation::AppointmentCancelOwnLocation)
            || self.role_has(role, Operation::AppointmentCancelAll)
    }

    pub fn can_read_all_finances(&self, role: Role) -> bool {
        self.role_has(role, Operation::FinanceReadAll)
    }

    pub fn can_manage_staff(&self, role: Role) -> bool {
        self.role_has(role, Operation::StaffManageAll)
    }

    pub fn permissions_for(&self, role: Role) -> RolePermissions {
        RolePermissions {
            role,
            operations: self.operations_for(role).to_vec(),
        }
    }
}
