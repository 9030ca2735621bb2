// src/services/operation_service.rs

use uuid::Uuid;

use crate::{
    db::ReferenceData,
    models::{
        rbac::{Operation, PermissionDecision},
        scheduling::{AppointmentIntent, AppointmentStatus, NormalizedAppointment, ScheduleEntry},
        sync::SyncStatus,
        tenancy::{ClientAssertedContext, ContextSnapshot, Principal},
        validation::{ContextState, ErrorCode, OperationResult, RecoveryHint, RuleViolation},
    },
    services::{
        appointment_validator::AppointmentValidator,
        context_service::ContextValidator,
        rbac_service::PermissionResolver,
        sync_state::ContextStateManager,
    },
};

// Um estágio que falhou já carrega o resultado final
type Gate<T, P> = Result<T, OperationResult<P>>;

// Pedido de reagendamento (mover um turno existente)
#[derive(Debug, Clone, Default)]
pub struct RescheduleRequest {
    pub entry_id: Uuid,
    pub starts_at: Option<String>,
    pub staff_id: Option<Uuid>,
    pub duration_minutes: Option<u32>,
}

/// Orquestra o pipeline de validação:
/// Contexto -> Estado -> Permissão -> Regras de negócio, nesta ordem.
/// O primeiro estágio que falhar decide o resultado.
pub struct OperationValidator<'a> {
    state: &'a ContextStateManager,
    reference: &'a ReferenceData,
    schedule: &'a [ScheduleEntry],
    context: ContextValidator,
    resolver: PermissionResolver,
}

impl<'a> OperationValidator<'a> {
    pub fn new(
        state: &'a ContextStateManager,
        reference: &'a ReferenceData,
        schedule: &'a [ScheduleEntry],
    ) -> Self {
        Self {
            state,
            reference,
            schedule,
            context: ContextValidator::new(),
            resolver: PermissionResolver::new(),
        }
    }

    // =========================================================================
    //  1. CRIAR
    // =========================================================================

    pub fn validate_create_appointment(
        &self,
        intent: &AppointmentIntent,
        principal: &Principal,
    ) -> OperationResult {
        let result = self
            .create_pipeline(intent, principal)
            .unwrap_or_else(|rejected| rejected);

        Self::log_outcome("create", &result);
        result
    }

    fn create_pipeline(
        &self,
        intent: &AppointmentIntent,
        principal: &Principal,
    ) -> Gate<OperationResult, NormalizedAppointment> {
        let snapshot = self.check_context::<NormalizedAppointment>(&intent.asserted_context(), principal)?;
        self.check_state::<NormalizedAppointment>()?;
        let permission = self.check_permission::<NormalizedAppointment>(
            principal,
            &snapshot,
            Operation::AppointmentCreateOwnLocation,
            intent.location_id,
        )?;

        let appointment = AppointmentValidator::new(self.reference, self.schedule).validate(intent)?;

        Ok(OperationResult::Valid {
            snapshot,
            permission,
            appointment,
        })
    }

    // =========================================================================
    //  2. REAGENDAR
    // =========================================================================

    pub fn validate_reschedule_appointment(
        &self,
        request: &RescheduleRequest,
        asserted: &ClientAssertedContext,
        principal: &Principal,
    ) -> OperationResult {
        let result = self
            .reschedule_pipeline(request, asserted, principal)
            .unwrap_or_else(|rejected| rejected);

        Self::log_outcome("reschedule", &result);
        result
    }

    fn reschedule_pipeline(
        &self,
        request: &RescheduleRequest,
        asserted: &ClientAssertedContext,
        principal: &Principal,
    ) -> Gate<OperationResult, NormalizedAppointment> {
        let snapshot = self.check_context::<NormalizedAppointment>(asserted, principal)?;
        self.check_state::<NormalizedAppointment>()?;

        let existing = self.find_entry(request.entry_id, snapshot.server_tenant_id);
        let permission = self.check_permission::<NormalizedAppointment>(
            principal,
            &snapshot,
            Operation::AppointmentUpdateOwnLocation,
            existing.map(|e| e.location_id),
        )?;

        let entry = Self::open_entry(existing, request.entry_id)?;

        // O turno movido passa pela mesma cadeia de regras de um turno novo
        let intent = AppointmentIntent {
            tenant_id: Some(entry.tenant_id),
            location_id: Some(entry.location_id),
            client_id: entry.client_id,
            client_name: Some(entry.client_name.clone()),
            staff_id: Some(request.staff_id.unwrap_or(entry.staff_id)),
            service_id: Some(entry.service_id),
            starts_at: request.starts_at.clone(),
            // Mover não encurta: sem duração nova, vale a gravada no turno
            duration_minutes: request.duration_minutes.or(entry.duration_minutes),
            notes: entry.notes.clone(),
        };

        let appointment = AppointmentValidator::new(self.reference, self.schedule)
            .validate_excluding(&intent, Some(entry.id))?;

        Ok(OperationResult::Valid {
            snapshot,
            permission,
            appointment,
        })
    }

    // =========================================================================
    //  3. CANCELAR
    // =========================================================================

    pub fn validate_cancel_appointment(
        &self,
        entry_id: Uuid,
        asserted: &ClientAssertedContext,
        principal: &Principal,
    ) -> OperationResult<ScheduleEntry> {
        let result = self
            .cancel_pipeline(entry_id, asserted, principal)
            .unwrap_or_else(|rejected| rejected);

        Self::log_outcome("cancel", &result);
        result
    }

    fn cancel_pipeline(
        &self,
        entry_id: Uuid,
        asserted: &ClientAssertedContext,
        principal: &Principal,
    ) -> Gate<OperationResult<ScheduleEntry>, ScheduleEntry> {
        let snapshot = self.check_context::<ScheduleEntry>(asserted, principal)?;
        self.check_state::<ScheduleEntry>()?;

        let existing = self.find_entry(entry_id, snapshot.server_tenant_id);
        let permission = self.check_permission::<ScheduleEntry>(
            principal,
            &snapshot,
            Operation::AppointmentCancelOwnLocation,
            existing.map(|e| e.location_id),
        )?;

        let entry = Self::open_entry(existing, entry_id)?;

        Ok(OperationResult::Valid {
            snapshot,
            permission,
            appointment: entry.clone(),
        })
    }

    // =========================================================================
    //  4. MUDAR ESTADO (confirmar, concluir, cancelar)
    // =========================================================================

    pub fn validate_status_change(
        &self,
        entry_id: Uuid,
        next: AppointmentStatus,
        asserted: &ClientAssertedContext,
        principal: &Principal,
    ) -> OperationResult<ScheduleEntry> {
        let result = self
            .status_pipeline(entry_id, next, asserted, principal)
            .unwrap_or_else(|rejected| rejected);

        Self::log_outcome("status", &result);
        result
    }

    fn status_pipeline(
        &self,
        entry_id: Uuid,
        next: AppointmentStatus,
        asserted: &ClientAssertedContext,
        principal: &Principal,
    ) -> Gate<OperationResult<ScheduleEntry>, ScheduleEntry> {
        let snapshot = self.check_context::<ScheduleEntry>(asserted, principal)?;
        self.check_state::<ScheduleEntry>()?;

        // Cancelar por aqui exige a mesma permissão que o cancelamento direto
        let scoped_operation = match next {
            AppointmentStatus::Cancelled => Operation::AppointmentCancelOwnLocation,
            _ => Operation::AppointmentUpdateOwnLocation,
        };

        let existing = self.find_entry(entry_id, snapshot.server_tenant_id);
        let permission = self.check_permission::<ScheduleEntry>(
            principal,
            &snapshot,
            scoped_operation,
            existing.map(|e| e.location_id),
        )?;

        let entry = Self::open_entry(existing, entry_id)?;

        if !entry.status.can_transition_to(next) {
            return Err(RuleViolation::new(
                ErrorCode::InvalidStatusTransition,
                format!(
                    "Não é possível passar o turno de {} para {}.",
                    entry.status.as_str(),
                    next.as_str()
                ),
            )
            .into());
        }

        let mut updated = entry.clone();
        updated.status = next;

        Ok(OperationResult::Valid {
            snapshot,
            permission,
            appointment: updated,
        })
    }

    // =========================================================================
    //  ESTÁGIOS
    // =========================================================================

    fn check_context<P>(&self, asserted: &ClientAssertedContext, principal: &Principal) -> Gate<ContextSnapshot, P> {
        let validation = self.context.validate_context(asserted, &principal.tenant_context());

        match (validation.snapshot, validation.error) {
            (Some(snapshot), _) if validation.valid => Ok(snapshot),
            (_, Some(error)) => {
                debug_assert!(validation.state != ContextState::Clean);
                Err(error.into())
            }
            // Inválido sem erro descrito não acontece; tratamos como dados em falta
            _ => Err(OperationResult::Inconsistent {
                error_code: ErrorCode::MissingTenant,
                message: "Contexto do pedido incompleto.".to_string(),
                recovery: RecoveryHint::RefreshCredentials,
                expected: None,
                actual: None,
            }),
        }
    }

    fn check_state<P>(&self) -> Gate<(), P> {
        let check = self.state.can_operate();
        if check.can_operate {
            return Ok(());
        }

        let message = check.reason.unwrap_or_default();
        match check.state {
            SyncStatus::Updating => Err(OperationResult::InconsistentTemporary {
                error_code: ErrorCode::StateUpdating,
                message,
                pending_resources: check.pending_resources.unwrap_or_default(),
                recovery: RecoveryHint::Wait,
            }),
            _ => Err(OperationResult::Inconsistent {
                error_code: if check.timed_out {
                    ErrorCode::StateTimeout
                } else {
                    ErrorCode::StateError
                },
                message,
                recovery: RecoveryHint::Reload,
                expected: None,
                actual: None,
            }),
        }
    }

    fn check_permission<P>(
        &self,
        principal: &Principal,
        snapshot: &ContextSnapshot,
        scoped_operation: Operation,
        resource_location_id: Option<Uuid>,
    ) -> Gate<PermissionDecision, P> {
        // Cargos com a variante `.all` não ficam presos ao próprio local
        let operation = self.resolver.effective_operation(principal.role, scoped_operation);

        let decision = self.resolver.check_permission(
            snapshot.principal_id,
            principal.role,
            operation,
            snapshot.server_tenant_id,
            principal.server_location_id,
            resource_location_id,
        );

        if decision.permitted {
            return Ok(decision);
        }

        let message = format!(
            "O cargo '{}' não tem permissão para '{}' neste contexto.",
            decision.role.as_str(),
            decision.operation.as_str()
        );
        Err(OperationResult::PermissionDenied { decision, message })
    }

    fn find_entry(&self, entry_id: Uuid, tenant_id: Uuid) -> Option<&'a ScheduleEntry> {
        self.schedule
            .iter()
            .find(|e| e.id == entry_id && e.tenant_id == tenant_id)
    }

    fn open_entry(existing: Option<&ScheduleEntry>, entry_id: Uuid) -> Result<&ScheduleEntry, RuleViolation> {
        let entry = existing.ok_or_else(|| {
            RuleViolation::new(
                ErrorCode::AppointmentNotFound,
                format!("Turno {} não encontrado.", entry_id),
            )
        })?;

        if !entry.status.is_open() {
            return Err(RuleViolation::new(
                ErrorCode::AppointmentClosed,
                format!("O turno já está {} e não pode ser alterado.", entry.status.as_str()),
            ));
        }

        Ok(entry)
    }

    fn log_outcome<T>(operation: &str, result: &OperationResult<T>) {
        match result.error_code() {
            None => tracing::info!(operation, status = result.status(), "Operação validada"),
            Some(code) => tracing::warn!(
                operation,
                status = result.status(),
                code = code.as_str(),
                "Operação rejeitada: {}",
                result.message().unwrap_or_default()
            ),
        }
    }
}
