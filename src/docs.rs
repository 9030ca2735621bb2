// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Appointments ---
        handlers::appointments::validate_appointment,
        handlers::appointments::create_appointment,
        handlers::appointments::list_appointments,
        handlers::appointments::reschedule_appointment,
        handlers::appointments::cancel_appointment,
        handlers::appointments::update_appointment_status,

        // --- Context ---
        handlers::context::get_context_state,
        handlers::context::change_location,
        handlers::context::resource_synced,
        handlers::context::report_error,
        handlers::context::reset_context,

        // --- RBAC ---
        handlers::rbac::check_permission,
        handlers::rbac::list_permissions,

        // --- Reference ---
        handlers::reference::replace_reference_data,
    ),
    components(
        schemas(
            // --- Scheduling ---
            models::scheduling::AppointmentStatus,
            models::scheduling::AppointmentIntent,
            models::scheduling::ScheduleEntry,
            models::scheduling::NormalizedAppointment,

            // --- Validation ---
            models::validation::ErrorCode,
            models::validation::RecoveryHint,
            models::validation::ContextState,

            // --- Sync ---
            models::sync::SyncResource,
            models::sync::SyncStatus,
            models::sync::OperateCheck,

            // --- RBAC ---
            models::rbac::Role,
            models::rbac::Operation,
            models::rbac::PermissionReason,
            models::rbac::PermissionDecision,
            models::rbac::RolePermissions,

            // --- Payloads ---
            handlers::appointments::ReschedulePayload,
            handlers::appointments::UpdateStatusPayload,
            handlers::context::ChangeLocationPayload,
            handlers::context::ContextStateResponse,
            handlers::reference::ReferenceSummary,
        )
    ),
    tags(
        (name = "Appointments", description = "Validação e gestão de turnos"),
        (name = "Context", description = "Estado de sincronização da sessão"),
        (name = "RBAC", description = "Controle de Acesso (Cargos e Operações)"),
        (name = "Reference", description = "Locais, serviços e profissionais")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
