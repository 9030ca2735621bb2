// src/routes.rs

use axum::{
    routing::{get, patch, post, put},
    Router,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{config::AppState, docs::ApiDoc, handlers};

/// Monta o router completo da aplicação.
pub fn app(app_state: AppState) -> Router {
    // Turnos: tudo passa pelo OperationValidator
    let appointment_routes = Router::new()
        .route(
            "/api/appointments",
            post(handlers::appointments::create_appointment).get(handlers::appointments::list_appointments),
        )
        .route("/api/appointments/validate", post(handlers::appointments::validate_appointment))
        .route("/api/appointments/{id}/reschedule", post(handlers::appointments::reschedule_appointment))
        .route("/api/appointments/{id}/cancel", post(handlers::appointments::cancel_appointment))
        .route("/api/appointments/{id}/status", patch(handlers::appointments::update_appointment_status));

    // Estado de sincronização da sessão
    let context_routes = Router::new()
        .route("/api/context/state", get(handlers::context::get_context_state))
        .route("/api/context/location", post(handlers::context::change_location))
        .route("/api/context/resources/{resource}/synced", post(handlers::context::resource_synced))
        .route("/api/context/error", post(handlers::context::report_error))
        .route("/api/context/reset", post(handlers::context::reset_context));

    let permission_routes = Router::new()
        .route("/api/permissions", get(handlers::rbac::list_permissions))
        .route("/api/permissions/check", get(handlers::rbac::check_permission));

    // Combina tudo no router principal
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/reference-data", put(handlers::reference::replace_reference_data))
        .merge(appointment_routes)
        .merge(context_routes)
        .merge(permission_routes)
        .with_state(app_state)
}
