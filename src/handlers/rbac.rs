// src/handlers/rbac.rs

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedPrincipal, i18n::Locale},
    models::rbac::{Operation, PermissionDecision, Role, RolePermissions},
    services::rbac_service::PermissionResolver,
};

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct CheckPermissionQuery {
    /// Slug da operação, ex: `appointment.create.own_location`
    pub operation: String,
    /// Unidade do recurso alvo (para operações `.own_location`)
    pub location_id: Option<Uuid>,
}

// GET /api/permissions/check
#[utoipa::path(
    get,
    path = "/api/permissions/check",
    tag = "RBAC",
    params(CheckPermissionQuery),
    responses(
        (status = 200, description = "Veredito para o utilizador autenticado", body = PermissionDecision),
        (status = 400, description = "Operação desconhecida")
    ),
    security(("api_jwt" = []))
)]
pub async fn check_permission(
    State(app_state): State<AppState>,
    locale: Locale,
    principal: AuthenticatedPrincipal,
    Query(query): Query<CheckPermissionQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let operation = Operation::parse(&query.operation).ok_or_else(|| {
        AppError::UnknownOperation(query.operation.clone()).to_api_error(&locale, &app_state.i18n_store)
    })?;

    let principal_id = principal
        .require_id()
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    let tenant_id = principal
        .0
        .server_tenant_id
        .ok_or_else(|| AppError::InvalidToken.to_api_error(&locale, &app_state.i18n_store))?;

    let decision = PermissionResolver::new().check_permission(
        principal_id,
        principal.0.role,
        operation,
        tenant_id,
        principal.0.server_location_id,
        query.location_id,
    );

    Ok((StatusCode::OK, Json(decision)))
}

// GET /api/permissions (Para o frontend saber o que mostrar em cada cargo)
#[utoipa::path(
    get,
    path = "/api/permissions",
    tag = "RBAC",
    responses(
        (status = 200, description = "Tabela de operações por cargo", body = Vec<RolePermissions>)
    )
)]
pub async fn list_permissions() -> impl IntoResponse {
    let resolver = PermissionResolver::new();
    let table: Vec<RolePermissions> = Role::ALL
        .iter()
        .map(|role| resolver.permissions_for(*role))
        .collect();

    Json(table)
}
