// src/handlers/appointments.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tokio::sync::OwnedMutexGuard;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::{ApiError, AppError},
        i18n::I18nStore,
    },
    config::AppState,
    middleware::{
        auth::AuthenticatedPrincipal,
        i18n::Locale,
        rbac::{PermAppointmentRead, RequireOperation},
        tenancy::ClientContext,
    },
    models::{
        rbac::Operation,
        scheduling::{AppointmentIntent, AppointmentStatus, ScheduleEntry},
        validation::OperationResult,
    },
    services::{
        operation_service::{OperationValidator, RescheduleRequest},
        rbac_service::PermissionResolver,
    },
};

// =============================================================================
//  RESPOSTA DO PIPELINE
// =============================================================================

// O OperationResult serializado + a mensagem no idioma do pedido
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OperationResponse<T: Serialize> {
    #[serde(flatten)]
    result: OperationResult<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    localized_message: Option<String>,
}

fn status_for<T>(result: &OperationResult<T>, success: StatusCode) -> StatusCode {
    match result {
        OperationResult::Valid { .. } => success,
        OperationResult::Invalid { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        OperationResult::PermissionDenied { .. } => StatusCode::FORBIDDEN,
        OperationResult::Inconsistent { .. } => StatusCode::CONFLICT,
        OperationResult::InconsistentTemporary { .. } => StatusCode::SERVICE_UNAVAILABLE,
    }
}

fn operation_response<T: Serialize>(
    result: OperationResult<T>,
    success: StatusCode,
    locale: &Locale,
    store: &I18nStore,
) -> Response {
    let status = status_for(&result, success);
    let localized_message = result
        .error_code()
        .map(|code| store.message(&locale.0, code.as_str()).to_string());

    (
        status,
        Json(OperationResponse {
            result,
            localized_message,
        }),
    )
        .into_response()
}

// O tenant do token é a única fonte de verdade para escrever
fn tenant_of(principal: &AuthenticatedPrincipal) -> Result<Uuid, AppError> {
    principal.0.server_tenant_id.ok_or(AppError::InvalidToken)
}

// Da leitura do snapshot ao upsert, uma escrita de cada vez por unidade.
// Sem loja ou unidade o pipeline rejeita de qualquer forma.
async fn write_guard(
    app_state: &AppState,
    principal: &AuthenticatedPrincipal,
    location_id: Option<Uuid>,
) -> Option<OwnedMutexGuard<()>> {
    match (principal.0.server_tenant_id, location_id) {
        (Some(tenant_id), Some(location_id)) => Some(app_state.booking_locks.acquire(tenant_id, location_id).await),
        _ => None,
    }
}

// A unidade de um turno já gravado
fn entry_location(app_state: &AppState, id: Uuid) -> Option<Uuid> {
    app_state.schedule.get(id).map(|e| e.location_id)
}

// =============================================================================
//  1. VALIDAR / CRIAR
// =============================================================================

// Preenche o contexto do corpo com os cabeçalhos quando o corpo não o traz
fn merge_context(mut intent: AppointmentIntent, client: &ClientContext) -> AppointmentIntent {
    intent.tenant_id = intent.tenant_id.or(client.0.tenant_id);
    intent.location_id = intent.location_id.or(client.0.location_id);
    intent
}

// POST /api/appointments/validate
#[utoipa::path(
    post,
    path = "/api/appointments/validate",
    tag = "Appointments",
    request_body = AppointmentIntent,
    responses(
        (status = 200, description = "Turno válido (nada é gravado)"),
        (status = 422, description = "Regra de negócio falhou"),
        (status = 403, description = "Permissão negada"),
        (status = 409, description = "Contexto ou estado inconsistente"),
        (status = 503, description = "Contexto a sincronizar, tentar de novo")
    ),
    params(
        ("x-tenant-id" = Option<Uuid>, Header, description = "ID da Loja"),
        ("x-location-id" = Option<Uuid>, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn validate_appointment(
    State(app_state): State<AppState>,
    locale: Locale,
    principal: AuthenticatedPrincipal,
    client: ClientContext,
    Json(payload): Json<AppointmentIntent>,
) -> Result<Response, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let intent = merge_context(payload, &client);
    let session = app_state.session_for(&principal.0);
    let reference = app_state.reference.current();
    let schedule = app_state.schedule.snapshot();

    let result = OperationValidator::new(&session, &reference, &schedule)
        .validate_create_appointment(&intent, &principal.0);

    Ok(operation_response(result, StatusCode::OK, &locale, &app_state.i18n_store))
}

// POST /api/appointments
#[utoipa::path(
    post,
    path = "/api/appointments",
    tag = "Appointments",
    request_body = AppointmentIntent,
    responses(
        (status = 201, description = "Turno criado"),
        (status = 422, description = "Regra de negócio falhou"),
        (status = 403, description = "Permissão negada"),
        (status = 409, description = "Contexto ou estado inconsistente"),
        (status = 503, description = "Contexto a sincronizar, tentar de novo")
    ),
    params(
        ("x-tenant-id" = Option<Uuid>, Header, description = "ID da Loja"),
        ("x-location-id" = Option<Uuid>, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_appointment(
    State(app_state): State<AppState>,
    locale: Locale,
    principal: AuthenticatedPrincipal,
    client: ClientContext,
    Json(payload): Json<AppointmentIntent>,
) -> Result<Response, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let intent = merge_context(payload, &client);
    let _guard = write_guard(&app_state, &principal, intent.location_id).await;

    let session = app_state.session_for(&principal.0);
    let reference = app_state.reference.current();
    let schedule = app_state.schedule.snapshot();

    let result = OperationValidator::new(&session, &reference, &schedule)
        .validate_create_appointment(&intent, &principal.0);

    let (snapshot, permission, appointment) = match result {
        OperationResult::Valid { snapshot, permission, appointment } => (snapshot, permission, appointment),
        rejected => return Ok(operation_response(rejected, StatusCode::OK, &locale, &app_state.i18n_store)),
    };

    // Só chega aqui o que passou pelo pipeline inteiro
    let entry = app_state
        .backend
        .persist_appointment(&appointment)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    app_state.schedule.upsert(entry.clone());

    let created: OperationResult<ScheduleEntry> = OperationResult::Valid {
        snapshot,
        permission,
        appointment: entry,
    };
    Ok(operation_response(created, StatusCode::CREATED, &locale, &app_state.i18n_store))
}

// =============================================================================
//  2. LISTAR
// =============================================================================

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListAppointmentsQuery {
    /// Filtra por unidade
    pub location_id: Option<Uuid>,
}

// GET /api/appointments
#[utoipa::path(
    get,
    path = "/api/appointments",
    tag = "Appointments",
    params(ListAppointmentsQuery),
    responses(
        (status = 200, description = "Turnos da loja", body = Vec<ScheduleEntry>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_appointments(
    State(app_state): State<AppState>,
    locale: Locale,
    RequireOperation(principal, _): RequireOperation<PermAppointmentRead>,
    Query(query): Query<ListAppointmentsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let tenant_id = tenant_of(&principal).map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    // Sem `appointment.read.all` só se vê a própria unidade
    let can_read_all = PermissionResolver::new().role_has(principal.0.role, Operation::AppointmentReadAll);
    let location_id = if can_read_all {
        query.location_id
    } else {
        match (principal.0.server_location_id, query.location_id) {
            (Some(own), Some(asked)) if own != asked => {
                return Err(AppError::Forbidden.to_api_error(&locale, &app_state.i18n_store));
            }
            (Some(own), _) => Some(own),
            (None, _) => return Err(AppError::Forbidden.to_api_error(&locale, &app_state.i18n_store)),
        }
    };

    let entries = app_state.schedule.entries_for_location(tenant_id, location_id);
    Ok((StatusCode::OK, Json(entries)))
}

// =============================================================================
//  3. REAGENDAR
// =============================================================================

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReschedulePayload {
    #[schema(example = "2026-03-10T15:00:00-03:00")]
    pub starts_at: Option<String>,

    pub staff_id: Option<Uuid>,

    #[validate(range(min = 1, max = 720, message = "out_of_range"))]
    pub duration_minutes: Option<u32>,
}

// POST /api/appointments/{id}/reschedule
#[utoipa::path(
    post,
    path = "/api/appointments/{id}/reschedule",
    tag = "Appointments",
    request_body = ReschedulePayload,
    responses(
        (status = 200, description = "Turno movido"),
        (status = 422, description = "Regra de negócio falhou"),
        (status = 403, description = "Permissão negada"),
        (status = 409, description = "Contexto ou estado inconsistente"),
        (status = 503, description = "Contexto a sincronizar, tentar de novo")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do turno"),
        ("x-tenant-id" = Option<Uuid>, Header, description = "ID da Loja")
    ),
    security(("api_jwt" = []))
)]
pub async fn reschedule_appointment(
    State(app_state): State<AppState>,
    locale: Locale,
    principal: AuthenticatedPrincipal,
    client: ClientContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReschedulePayload>,
) -> Result<Response, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let request = RescheduleRequest {
        entry_id: id,
        starts_at: payload.starts_at,
        staff_id: payload.staff_id,
        duration_minutes: payload.duration_minutes,
    };

    let _guard = write_guard(&app_state, &principal, entry_location(&app_state, id)).await;

    let session = app_state.session_for(&principal.0);
    let reference = app_state.reference.current();
    let schedule = app_state.schedule.snapshot();

    let result = OperationValidator::new(&session, &reference, &schedule)
        .validate_reschedule_appointment(&request, &client.0, &principal.0);

    let (snapshot, permission, appointment) = match result {
        OperationResult::Valid { snapshot, permission, appointment } => (snapshot, permission, appointment),
        rejected => return Ok(operation_response(rejected, StatusCode::OK, &locale, &app_state.i18n_store)),
    };

    let entry = app_state
        .backend
        .reschedule(
            appointment.tenant_id,
            id,
            appointment.staff_id,
            appointment.starts_at,
            appointment.duration_minutes,
        )
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    app_state.schedule.upsert(entry.clone());

    let moved: OperationResult<ScheduleEntry> = OperationResult::Valid {
        snapshot,
        permission,
        appointment: entry,
    };
    Ok(operation_response(moved, StatusCode::OK, &locale, &app_state.i18n_store))
}

// =============================================================================
//  4. CANCELAR / MUDAR ESTADO
// =============================================================================

// POST /api/appointments/{id}/cancel
#[utoipa::path(
    post,
    path = "/api/appointments/{id}/cancel",
    tag = "Appointments",
    responses(
        (status = 200, description = "Turno cancelado"),
        (status = 422, description = "Turno inexistente ou já fechado"),
        (status = 403, description = "Permissão negada"),
        (status = 409, description = "Contexto ou estado inconsistente"),
        (status = 503, description = "Contexto a sincronizar, tentar de novo")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do turno"),
        ("x-tenant-id" = Option<Uuid>, Header, description = "ID da Loja")
    ),
    security(("api_jwt" = []))
)]
pub async fn cancel_appointment(
    State(app_state): State<AppState>,
    locale: Locale,
    principal: AuthenticatedPrincipal,
    client: ClientContext,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let _guard = write_guard(&app_state, &principal, entry_location(&app_state, id)).await;

    let session = app_state.session_for(&principal.0);
    let reference = app_state.reference.current();
    let schedule = app_state.schedule.snapshot();

    let result = OperationValidator::new(&session, &reference, &schedule)
        .validate_cancel_appointment(id, &client.0, &principal.0);

    apply_status(&app_state, &locale, result, AppointmentStatus::Cancelled).await
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusPayload {
    #[schema(example = "confirmed")]
    pub status: AppointmentStatus,
}

// PATCH /api/appointments/{id}/status
#[utoipa::path(
    patch,
    path = "/api/appointments/{id}/status",
    tag = "Appointments",
    request_body = UpdateStatusPayload,
    responses(
        (status = 200, description = "Estado atualizado"),
        (status = 422, description = "Transição inválida ou turno fechado"),
        (status = 403, description = "Permissão negada"),
        (status = 409, description = "Contexto ou estado inconsistente"),
        (status = 503, description = "Contexto a sincronizar, tentar de novo")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do turno"),
        ("x-tenant-id" = Option<Uuid>, Header, description = "ID da Loja")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_appointment_status(
    State(app_state): State<AppState>,
    locale: Locale,
    principal: AuthenticatedPrincipal,
    client: ClientContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusPayload>,
) -> Result<Response, ApiError> {
    let _guard = write_guard(&app_state, &principal, entry_location(&app_state, id)).await;

    let session = app_state.session_for(&principal.0);
    let reference = app_state.reference.current();
    let schedule = app_state.schedule.snapshot();

    let result = OperationValidator::new(&session, &reference, &schedule)
        .validate_status_change(id, payload.status, &client.0, &principal.0);

    apply_status(&app_state, &locale, result, payload.status).await
}

async fn apply_status(
    app_state: &AppState,
    locale: &Locale,
    result: OperationResult<ScheduleEntry>,
    status: AppointmentStatus,
) -> Result<Response, ApiError> {
    let (snapshot, permission, appointment) = match result {
        OperationResult::Valid { snapshot, permission, appointment } => (snapshot, permission, appointment),
        rejected => return Ok(operation_response(rejected, StatusCode::OK, locale, &app_state.i18n_store)),
    };

    let entry = app_state
        .backend
        .update_status(appointment.tenant_id, appointment.id, status)
        .await
        .map_err(|e| e.to_api_error(locale, &app_state.i18n_store))?;
    app_state.schedule.upsert(entry.clone());

    let updated: OperationResult<ScheduleEntry> = OperationResult::Valid {
        snapshot,
        permission,
        appointment: entry,
    };
    Ok(operation_response(updated, StatusCode::OK, locale, &app_state.i18n_store))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::validation::{ErrorCode, RecoveryHint};

    #[test]
    fn pipeline_outcomes_map_to_http_statuses() {
        let invalid: OperationResult<()> = OperationResult::Invalid {
            rule_failed: ErrorCode::StaffConflict,
            message: String::new(),
            suggestions: vec![],
        };
        let temporary: OperationResult<()> = OperationResult::InconsistentTemporary {
            error_code: ErrorCode::StateUpdating,
            message: String::new(),
            pending_resources: vec![],
            recovery: RecoveryHint::Wait,
        };

        assert_eq!(status_for(&invalid, StatusCode::OK), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(status_for(&temporary, StatusCode::OK), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn body_keeps_the_status_tag_and_adds_the_localized_message() {
        let result: OperationResult<()> = OperationResult::Invalid {
            rule_failed: ErrorCode::LocationClosed,
            message: "Fechado".into(),
            suggestions: vec![],
        };
        let body = OperationResponse {
            localized_message: Some(I18nStore::new().message("es", "LOCATION_CLOSED").to_string()),
            result,
        };

        let json = serde_json::to_value(&body).expect("serializa");
        assert_eq!(json["status"], "invalid");
        assert_eq!(json["ruleFailed"], "LOCATION_CLOSED");
        assert_eq!(json["localizedMessage"], "La sucursal está cerrada en este horario.");
    }
}
