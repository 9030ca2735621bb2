// src/handlers/reference.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    db::ReferenceData,
    middleware::{
        i18n::Locale,
        rbac::{PermLocationManage, RequireOperation},
    },
};

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceSummary {
    pub locations: usize,
    pub services: usize,
    pub location_services: usize,
    pub staff: usize,
    pub location_staff: usize,
}

// PUT /api/reference-data
// Os dados chegam já carregados pela camada CRUD; substitui a fatia do tenant.
#[utoipa::path(
    put,
    path = "/api/reference-data",
    tag = "Reference",
    request_body(content = Object, description = "Locais, serviços, profissionais e vínculos"),
    responses(
        (status = 200, description = "Dados substituídos", body = ReferenceSummary),
        (status = 403, description = "Cargo sem `location.manage.all`")
    ),
    security(("api_jwt" = []))
)]
pub async fn replace_reference_data(
    State(app_state): State<AppState>,
    locale: Locale,
    RequireOperation(principal, _): RequireOperation<PermLocationManage>,
    Json(data): Json<ReferenceData>,
) -> Result<impl IntoResponse, ApiError> {
    let tenant_id = principal
        .0
        .server_tenant_id
        .ok_or_else(|| AppError::InvalidToken.to_api_error(&locale, &app_state.i18n_store))?;

    // Só entra (e só sai) o que pertence à loja de quem envia
    let next = app_state.reference.replace_tenant(tenant_id, data);

    let own_location = |location_id| next.location(location_id).is_some_and(|l| l.tenant_id == tenant_id);
    let summary = ReferenceSummary {
        locations: next.locations.iter().filter(|l| l.tenant_id == tenant_id).count(),
        services: next.services.iter().filter(|s| s.tenant_id == tenant_id).count(),
        location_services: next.location_services.iter().filter(|ls| own_location(ls.location_id)).count(),
        staff: next.staff.iter().filter(|s| s.tenant_id == tenant_id).count(),
        location_staff: next.location_staff.iter().filter(|ls| own_location(ls.location_id)).count(),
    };

    Ok((StatusCode::OK, Json(summary)))
}
