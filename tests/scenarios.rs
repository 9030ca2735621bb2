//! End-to-end scenarios for the operation-validation pipeline.
//!
//! Each test wires the real components together (reference data, schedule
//! store, session state) and drives them through `OperationValidator`, the
//! same way the HTTP handlers do.

use anyhow::Context;
use async_trait::async_trait;
use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, NaiveTime, Utc, Weekday};
use std::{sync::Arc, time::Duration};
use uuid::Uuid;

use salon_booking::{
    common::error::AppError,
    config::{AppState, Settings},
    db::{BookingBackend, DemoBookingBackend, ReferenceData},
    handlers::appointments::create_appointment,
    middleware::{auth::AuthenticatedPrincipal, i18n::Locale, tenancy::ClientContext},
    models::{
        catalog::{LocationService, LocationStaff, Service, Staff},
        rbac::Role,
        scheduling::{AppointmentIntent, AppointmentStatus, NormalizedAppointment, ScheduleEntry},
        sync::{SyncResource, SyncStatus},
        tenancy::{ClientAssertedContext, Location, OpeningWindow, Principal},
        validation::{ErrorCode, OperationResult, RecoveryHint},
    },
    services::{operation_service::OperationValidator, sync_state::ContextStateManager},
};

struct Salon {
    tenant: Uuid,
    location: Uuid,
    cut: Uuid,
    colour: Uuid,
    ana: Uuid,
    bruno: Uuid,
    reference: ReferenceData,
}

fn time(raw: &str) -> NaiveTime {
    NaiveTime::parse_from_str(raw, "%H:%M").expect("hora válida")
}

/// One tenant, one location open Tue 09:00-18:00 (UTC), two services and two
/// staff members. Bruno only does colour.
fn salon() -> Salon {
    let tenant = Uuid::new_v4();
    let location = Uuid::new_v4();
    let cut = Uuid::new_v4();
    let colour = Uuid::new_v4();
    let ana = Uuid::new_v4();
    let bruno = Uuid::new_v4();

    let service = |id, name: &str, minutes| Service {
        id,
        tenant_id: tenant,
        name: name.into(),
        duration_minutes: Some(minutes),
        price: None,
        is_active: true,
    };
    let offered = |service_id| LocationService {
        location_id: location,
        service_id,
        is_active: true,
        price_override: None,
        duration_override: None,
    };
    let works_here = |staff_id| LocationStaff {
        location_id: location,
        staff_id,
        is_active: true,
    };

    let reference = ReferenceData {
        locations: vec![Location {
            id: location,
            tenant_id: tenant,
            name: "Centro".into(),
            is_active: true,
            utc_offset_minutes: 0,
            opening_hours: Some(vec![OpeningWindow {
                weekday: Weekday::Tue,
                opens_at: time("09:00"),
                closes_at: time("18:00"),
            }]),
        }],
        services: vec![service(cut, "Corte", 30), service(colour, "Coloração", 90)],
        location_services: vec![offered(cut), offered(colour)],
        staff: vec![
            Staff {
                id: ana,
                tenant_id: tenant,
                full_name: "Ana".into(),
                is_active: true,
                service_ids: None,
            },
            Staff {
                id: bruno,
                tenant_id: tenant,
                full_name: "Bruno".into(),
                is_active: true,
                service_ids: Some(vec![colour]),
            },
        ],
        location_staff: vec![works_here(ana), works_here(bruno)],
    };

    Salon {
        tenant,
        location,
        cut,
        colour,
        ana,
        bruno,
        reference,
    }
}

fn staff_member(s: &Salon) -> Principal {
    Principal {
        principal_id: Some(Uuid::new_v4()),
        role: Role::Staff,
        server_tenant_id: Some(s.tenant),
        server_location_id: Some(s.location),
    }
}

fn intent(s: &Salon, staff_id: Uuid, service_id: Uuid, starts_at: &str) -> AppointmentIntent {
    AppointmentIntent {
        tenant_id: Some(s.tenant),
        location_id: Some(s.location),
        client_id: Some(Uuid::new_v4()),
        staff_id: Some(staff_id),
        service_id: Some(service_id),
        starts_at: Some(starts_at.into()),
        ..Default::default()
    }
}

fn settings() -> Settings {
    Settings {
        bind_addr: "127.0.0.1:0".into(),
        jwt_secret: "segredo".into(),
        reference_data_path: None,
        sync_timeout: None,
    }
}

// 2026-03-10 is a Tuesday
const TEN_AM: &str = "2026-03-10T10:00:00Z";

#[test]
fn scenario_a_valid_intent_is_accepted() {
    let s = salon();
    let state = ContextStateManager::with_location(s.location, None);
    let validator = OperationValidator::new(&state, &s.reference, &[]);

    let result = validator.validate_create_appointment(&intent(&s, s.ana, s.cut, TEN_AM), &staff_member(&s));

    assert_eq!(result.status(), "valid");
    let OperationResult::Valid { appointment, permission, .. } = result else {
        panic!("esperava valid");
    };
    assert!(permission.permitted);
    assert_eq!(appointment.duration_minutes, 30);
    assert!(appointment.client_name.starts_with("Cliente "));
}

#[test]
fn scenario_b_divergent_tenant_is_inconsistent() {
    let s = salon();
    let state = ContextStateManager::with_location(s.location, None);
    let validator = OperationValidator::new(&state, &s.reference, &[]);

    let mut divergent = intent(&s, s.ana, s.cut, TEN_AM);
    let stale_tenant = Uuid::new_v4();
    divergent.tenant_id = Some(stale_tenant);

    match validator.validate_create_appointment(&divergent, &staff_member(&s)) {
        OperationResult::Inconsistent {
            error_code,
            recovery,
            expected,
            actual,
            ..
        } => {
            assert_eq!(error_code, ErrorCode::TenantDivergence);
            assert_eq!(recovery, RecoveryHint::ResyncTenant);
            assert_eq!(expected, Some(s.tenant));
            assert_eq!(actual, Some(stale_tenant));
        }
        other => panic!("resultado inesperado: {:?}", other),
    }
}

#[test]
fn scenario_c_capability_list_excludes_the_service() {
    let s = salon();
    let state = ContextStateManager::with_location(s.location, None);
    let validator = OperationValidator::new(&state, &s.reference, &[]);

    let result = validator.validate_create_appointment(&intent(&s, s.bruno, s.cut, TEN_AM), &staff_member(&s));

    assert_eq!(result.status(), "invalid");
    match result {
        OperationResult::Invalid { rule_failed, suggestions, .. } => {
            assert_eq!(rule_failed, ErrorCode::StaffCantDoService);
            // Ana faz todos os serviços: é a alternativa sugerida
            assert!(suggestions.iter().any(|s| s.contains("Ana")), "{suggestions:?}");
        }
        other => panic!("resultado inesperado: {:?}", other),
    }

    // O mesmo profissional com o serviço que faz passa
    let colour = intent(&s, s.bruno, s.colour, TEN_AM);
    assert!(validator.validate_create_appointment(&colour, &staff_member(&s)).is_valid());
}

#[tokio::test]
async fn scenario_d_overlap_conflicts_until_the_first_entry_is_cancelled() -> anyhow::Result<()> {
    let s = salon();
    let app = AppState::with_parts(settings(), s.reference.clone(), Arc::new(DemoBookingBackend::new()));
    let who = staff_member(&s);
    let session = app.session_for(&who);

    // O primeiro turno fica gravado e confirmado
    let first = intent(&s, s.ana, s.cut, TEN_AM);
    let appointment = match OperationValidator::new(&session, &app.reference.current(), &app.schedule.snapshot())
        .validate_create_appointment(&first, &who)
    {
        OperationResult::Valid { appointment, .. } => appointment,
        other => anyhow::bail!("primeiro turno rejeitado: {:?}", other),
    };
    let entry = app.backend.persist_appointment(&appointment).await?;
    let entry = app
        .backend
        .update_status(s.tenant, entry.id, AppointmentStatus::Confirmed)
        .await?;
    app.schedule.upsert(entry.clone());

    // 10:15 sobrepõe [10:00, 10:30)
    let second = intent(&s, s.ana, s.cut, "2026-03-10T10:15:00Z");
    let reference = app.reference.current();
    let result = OperationValidator::new(&session, &reference, &app.schedule.snapshot())
        .validate_create_appointment(&second, &who);
    assert_eq!(result.error_code(), Some(ErrorCode::StaffConflict));

    // Cancelado, deixa de contar
    let cancelled = app
        .backend
        .update_status(s.tenant, entry.id, AppointmentStatus::Cancelled)
        .await
        .context("cancelamento")?;
    app.schedule.upsert(cancelled);

    let result = OperationValidator::new(&session, &reference, &app.schedule.snapshot())
        .validate_create_appointment(&second, &who);
    assert_eq!(result.status(), "valid");

    Ok(())
}

#[test]
fn scenario_e_location_switch_blocks_until_every_resource_syncs() {
    let s = salon();
    let state = ContextStateManager::with_location(s.location, None);
    state.notify_location_changed(Uuid::new_v4());

    let check = state.can_operate();
    assert!(!check.can_operate);
    assert_eq!(check.state, SyncStatus::Updating);
    assert_eq!(check.pending_resources, Some(SyncResource::REQUIRED.to_vec()));

    // Enquanto espera, o pipeline devolve o resultado temporário
    let validator = OperationValidator::new(&state, &s.reference, &[]);
    let result = validator.validate_create_appointment(&intent(&s, s.ana, s.cut, TEN_AM), &staff_member(&s));
    assert_eq!(result.status(), "inconsistent_temporary");

    for resource in SyncResource::REQUIRED {
        assert!(!state.can_operate().can_operate);
        state.notify_resource_synced(resource);
    }

    assert!(state.can_operate().can_operate);
}

#[test]
fn context_failure_wins_over_every_later_stage() {
    let s = salon();
    let state = ContextStateManager::with_location(s.location, None);
    state.notify_error();
    let validator = OperationValidator::new(&state, &s.reference, &[]);

    // Sem principal, em estado de erro, com um cargo sem permissão e um
    // pedido inválido: só o primeiro estágio fala
    let anonymous = Principal {
        principal_id: None,
        role: Role::Viewer,
        server_tenant_id: Some(s.tenant),
        server_location_id: None,
    };
    let mut broken = intent(&s, s.bruno, s.cut, "amanhã");
    broken.tenant_id = Some(Uuid::new_v4());

    let result = validator.validate_create_appointment(&broken, &anonymous);
    assert_eq!(result.error_code(), Some(ErrorCode::MissingPrincipal));
}

#[tokio::test]
async fn created_entries_are_visible_per_location() -> anyhow::Result<()> {
    let s = salon();
    let app = AppState::with_parts(settings(), s.reference.clone(), Arc::new(DemoBookingBackend::new()));
    let who = staff_member(&s);
    let session = app.session_for(&who);

    let reference = app.reference.current();
    let result = OperationValidator::new(&session, &reference, &app.schedule.snapshot())
        .validate_create_appointment(&intent(&s, s.ana, s.cut, TEN_AM), &who);
    let OperationResult::Valid { appointment, .. } = result else {
        anyhow::bail!("turno rejeitado");
    };

    let entry = app.backend.persist_appointment(&appointment).await?;
    app.schedule.upsert(entry.clone());

    let listed: Vec<ScheduleEntry> = app.schedule.entries_for_location(s.tenant, Some(s.location));
    assert_eq!(listed, vec![entry]);
    assert!(app.schedule.entries_for_location(s.tenant, Some(Uuid::new_v4())).is_empty());

    let starts_at: DateTime<Utc> = listed[0].starts_at;
    assert_eq!(starts_at.to_rfc3339(), "2026-03-10T10:00:00+00:00");

    Ok(())
}

/// Backend em memória que demora a gravar, para abrir a janela entre validar
/// e publicar no store.
#[derive(Default)]
struct SlowBackend {
    inner: DemoBookingBackend,
}

#[async_trait]
impl BookingBackend for SlowBackend {
    async fn persist_appointment(&self, appointment: &NormalizedAppointment) -> Result<ScheduleEntry, AppError> {
        tokio::time::sleep(Duration::from_millis(50)).await;
        self.inner.persist_appointment(appointment).await
    }

    async fn update_status(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        status: AppointmentStatus,
    ) -> Result<ScheduleEntry, AppError> {
        self.inner.update_status(tenant_id, id, status).await
    }

    async fn reschedule(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        staff_id: Uuid,
        starts_at: DateTime<Utc>,
        duration_minutes: u32,
    ) -> Result<ScheduleEntry, AppError> {
        self.inner
            .reschedule(tenant_id, id, staff_id, starts_at, duration_minutes)
            .await
    }

    async fn list_appointments(&self, tenant_id: Uuid) -> Result<Vec<ScheduleEntry>, AppError> {
        self.inner.list_appointments(tenant_id).await
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_creates_for_one_slot_book_it_once() -> anyhow::Result<()> {
    let s = salon();
    let app = AppState::with_parts(settings(), s.reference.clone(), Arc::new(SlowBackend::default()));
    let who = staff_member(&s);

    let attempts: Vec<_> = (0..2)
        .map(|_| {
            let app = app.clone();
            let body = intent(&s, s.ana, s.cut, TEN_AM);
            tokio::spawn(async move {
                create_appointment(
                    State(app),
                    Locale::default(),
                    AuthenticatedPrincipal(who),
                    ClientContext(ClientAssertedContext::default()),
                    Json(body),
                )
                .await
            })
        })
        .collect();

    let mut statuses = Vec::new();
    for attempt in attempts {
        match attempt.await? {
            Ok(response) => statuses.push(response.status()),
            Err(e) => anyhow::bail!("pedido falhou: {} {}", e.status, e.error),
        }
    }

    // Um grava, o outro esbarra no primeiro
    let created = statuses.iter().filter(|s| **s == StatusCode::CREATED).count();
    let rejected = statuses.iter().filter(|s| **s == StatusCode::UNPROCESSABLE_ENTITY).count();
    assert_eq!((created, rejected), (1, 1), "{statuses:?}");
    assert_eq!(app.schedule.snapshot().len(), 1);

    Ok(())
}

#[tokio::test]
async fn warm_up_loads_what_the_backend_already_holds() -> anyhow::Result<()> {
    let s = salon();
    let backend = Arc::new(DemoBookingBackend::new());

    // Gravado antes do arranque (ex: noutra instância)
    let appointment = match OperationValidator::new(&ContextStateManager::with_location(s.location, None), &s.reference, &[])
        .validate_create_appointment(&intent(&s, s.ana, s.cut, TEN_AM), &staff_member(&s))
    {
        OperationResult::Valid { appointment, .. } => appointment,
        other => anyhow::bail!("turno rejeitado: {:?}", other),
    };
    let stored = backend.persist_appointment(&appointment).await?;

    let app = AppState::with_parts(settings(), s.reference.clone(), backend);
    assert!(app.schedule.snapshot().is_empty());

    assert_eq!(app.warm_schedule().await?, 1);
    assert_eq!(app.schedule.entries_for(s.ana, s.location), vec![stored]);

    // O mesmo horário já não passa
    let who = staff_member(&s);
    let session = app.session_for(&who);
    let reference = app.reference.current();
    let result = OperationValidator::new(&session, &reference, &app.schedule.snapshot())
        .validate_create_appointment(&intent(&s, s.ana, s.cut, TEN_AM), &who);
    assert_eq!(result.error_code(), Some(ErrorCode::StaffConflict));

    Ok(())
}
