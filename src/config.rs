// src/config.rs

use std::{collections::BTreeSet, env, sync::Arc};

use anyhow::Context;
use uuid::Uuid;

use crate::{
    common::{error::AppError, i18n::I18nStore},
    db::{BookingBackend, DemoBookingBackend, ReferenceData, ReferenceRepository},
    models::tenancy::Principal,
    services::{
        schedule_store::{BookingLocks, ScheduleStore},
        sync_state::{ContextStateManager, SessionStates},
    },
};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

// Configuração lida do ambiente (.env incluído)
#[derive(Debug, Clone)]
pub struct Settings {
    pub bind_addr: String,
    pub jwt_secret: String,
    pub reference_data_path: Option<String>,
    pub sync_timeout: Option<chrono::Duration>,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        // Sem .env tudo bem: as variáveis podem vir do próprio ambiente
        dotenvy::dotenv().ok();

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?;
        let reference_data_path = env::var("REFERENCE_DATA_PATH").ok().filter(|p| !p.is_empty());

        let sync_timeout = match env::var("SYNC_TIMEOUT_SECS") {
            Ok(raw) => {
                let secs: i64 = raw
                    .trim()
                    .parse()
                    .with_context(|| format!("SYNC_TIMEOUT_SECS inválido: {raw}"))?;
                anyhow::ensure!(secs > 0, "SYNC_TIMEOUT_SECS deve ser positivo");
                Some(chrono::Duration::seconds(secs))
            }
            Err(_) => None,
        };

        Ok(Self {
            bind_addr,
            jwt_secret,
            reference_data_path,
            sync_timeout,
        })
    }
}

// O estado compartilhado que será acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub reference: ReferenceRepository,
    pub schedule: ScheduleStore,
    pub booking_locks: BookingLocks,
    pub sessions: SessionStates,
    pub backend: Arc<dyn BookingBackend>,
    pub i18n_store: I18nStore,
}

impl AppState {
    pub fn new(settings: Settings) -> anyhow::Result<Self> {
        let reference_data = match &settings.reference_data_path {
            Some(path) => {
                let data = ReferenceData::from_json_file(path)
                    .with_context(|| format!("Falha ao carregar dados de referência de {path}"))?;
                tracing::info!(
                    "✅ Dados de referência carregados: {} unidades, {} serviços, {} profissionais",
                    data.locations.len(),
                    data.services.len(),
                    data.staff.len()
                );
                data
            }
            None => {
                tracing::warn!("REFERENCE_DATA_PATH não definido, a arrancar sem dados de referência");
                ReferenceData::default()
            }
        };

        Ok(Self::with_parts(
            settings,
            reference_data,
            Arc::new(DemoBookingBackend::new()),
        ))
    }

    /// Monta o gráfico de dependências sem tocar no ambiente.
    pub fn with_parts(
        settings: Settings,
        reference_data: ReferenceData,
        backend: Arc<dyn BookingBackend>,
    ) -> Self {
        let sessions = SessionStates::new(settings.sync_timeout);

        Self {
            settings: Arc::new(settings),
            reference: ReferenceRepository::new(reference_data),
            schedule: ScheduleStore::new(),
            booking_locks: BookingLocks::new(),
            sessions,
            backend,
            i18n_store: I18nStore::new(),
        }
    }

    /// Enche o ScheduleStore com o que o backend já tem gravado para cada loja
    /// conhecida nos dados de referência. Devolve quantos turnos carregou.
    pub async fn warm_schedule(&self) -> Result<usize, AppError> {
        let reference = self.reference.current();
        let tenant_ids: BTreeSet<Uuid> = reference
            .locations
            .iter()
            .map(|l| l.tenant_id)
            .chain(reference.services.iter().map(|s| s.tenant_id))
            .collect();

        let mut entries = Vec::new();
        for tenant_id in tenant_ids {
            entries.extend(self.backend.list_appointments(tenant_id).await?);
        }

        let loaded = entries.len();
        self.schedule.set_all(entries);
        Ok(loaded)
    }

    /// O gestor de estado da sessão. Sem id de utilizador não há sessão: devolve
    /// um gestor avulso e o pipeline responde MISSING_PRINCIPAL.
    pub fn session_for(&self, principal: &Principal) -> Arc<ContextStateManager> {
        match principal.principal_id {
            Some(id) => self.sessions.for_principal(id, principal.server_location_id),
            None => Arc::new(ContextStateManager::new(self.settings.sync_timeout)),
        }
    }
}
