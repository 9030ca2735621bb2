// src/handlers/context.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedPrincipal, i18n::Locale},
    models::sync::{OperateCheck, SyncResource, SyncStatus},
    services::sync_state::ContextStateManager,
};

// O estado da sessão visto de fora
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContextStateResponse {
    pub status: SyncStatus,
    pub current_location_id: Option<Uuid>,
    pub previous_location_id: Option<Uuid>,
    pub synced_resources: Vec<SyncResource>,
    pub pending_resources: Vec<SyncResource>,
    pub operate: OperateCheck,
}

impl ContextStateResponse {
    fn from_manager(manager: &ContextStateManager) -> Self {
        // `can_operate` primeiro: pode mudar o estado (timeout)
        let operate = manager.can_operate();
        let state = manager.snapshot();

        Self {
            status: state.status,
            current_location_id: state.current_location_id,
            previous_location_id: state.previous_location_id,
            synced_resources: state.synced_resources.iter().copied().collect(),
            pending_resources: state.pending_resources(),
            operate,
        }
    }
}

fn session(
    app_state: &AppState,
    principal: &AuthenticatedPrincipal,
    locale: &Locale,
) -> Result<std::sync::Arc<ContextStateManager>, ApiError> {
    principal
        .require_id()
        .map_err(|e| e.to_api_error(locale, &app_state.i18n_store))?;
    Ok(app_state.session_for(&principal.0))
}

// GET /api/context/state
#[utoipa::path(
    get,
    path = "/api/context/state",
    tag = "Context",
    responses(
        (status = 200, description = "Estado de sincronização da sessão", body = ContextStateResponse)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_context_state(
    State(app_state): State<AppState>,
    locale: Locale,
    principal: AuthenticatedPrincipal,
) -> Result<impl IntoResponse, ApiError> {
    let manager = session(&app_state, &principal, &locale)?;
    Ok((StatusCode::OK, Json(ContextStateResponse::from_manager(&manager))))
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangeLocationPayload {
    pub location_id: Uuid,
}

// POST /api/context/location
#[utoipa::path(
    post,
    path = "/api/context/location",
    tag = "Context",
    request_body = ChangeLocationPayload,
    responses(
        (status = 200, description = "Troca de unidade registada", body = ContextStateResponse),
        (status = 404, description = "Unidade desconhecida nesta loja")
    ),
    security(("api_jwt" = []))
)]
pub async fn change_location(
    State(app_state): State<AppState>,
    locale: Locale,
    principal: AuthenticatedPrincipal,
    Json(payload): Json<ChangeLocationPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let manager = session(&app_state, &principal, &locale)?;

    // Só unidades da loja do token
    let known = app_state
        .reference
        .current()
        .location(payload.location_id)
        .is_some_and(|l| Some(l.tenant_id) == principal.0.server_tenant_id);
    if !known {
        return Err(AppError::ResourceNotFound(format!("Unidade {}", payload.location_id))
            .to_api_error(&locale, &app_state.i18n_store));
    }

    manager.notify_location_changed(payload.location_id);
    Ok((StatusCode::OK, Json(ContextStateResponse::from_manager(&manager))))
}

// POST /api/context/resources/{resource}/synced
#[utoipa::path(
    post,
    path = "/api/context/resources/{resource}/synced",
    tag = "Context",
    params(
        ("resource" = String, Path, description = "appointments | clients | staff | location-services")
    ),
    responses(
        (status = 200, description = "Recurso marcado como sincronizado", body = ContextStateResponse),
        (status = 400, description = "Recurso desconhecido")
    ),
    security(("api_jwt" = []))
)]
pub async fn resource_synced(
    State(app_state): State<AppState>,
    locale: Locale,
    principal: AuthenticatedPrincipal,
    Path(resource): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let manager = session(&app_state, &principal, &locale)?;

    let resource = SyncResource::parse(&resource)
        .ok_or_else(|| AppError::UnknownResource(resource.clone()).to_api_error(&locale, &app_state.i18n_store))?;

    manager.notify_resource_synced(resource);
    Ok((StatusCode::OK, Json(ContextStateResponse::from_manager(&manager))))
}

// POST /api/context/error
#[utoipa::path(
    post,
    path = "/api/context/error",
    tag = "Context",
    responses(
        (status = 200, description = "Sessão marcada em erro", body = ContextStateResponse)
    ),
    security(("api_jwt" = []))
)]
pub async fn report_error(
    State(app_state): State<AppState>,
    locale: Locale,
    principal: AuthenticatedPrincipal,
) -> Result<impl IntoResponse, ApiError> {
    let manager = session(&app_state, &principal, &locale)?;
    manager.notify_error();
    Ok((StatusCode::OK, Json(ContextStateResponse::from_manager(&manager))))
}

// POST /api/context/reset
#[utoipa::path(
    post,
    path = "/api/context/reset",
    tag = "Context",
    responses(
        (status = 200, description = "Sessão de volta a idle", body = ContextStateResponse)
    ),
    security(("api_jwt" = []))
)]
pub async fn reset_context(
    State(app_state): State<AppState>,
    locale: Locale,
    principal: AuthenticatedPrincipal,
) -> Result<impl IntoResponse, ApiError> {
    let manager = session(&app_state, &principal, &locale)?;
    manager.reset();
    Ok((StatusCode::OK, Json(ContextStateResponse::from_manager(&manager))))
}
