// src/services/sync_state.rs

use std::{
    collections::{BTreeSet, HashMap},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::sync::{OperateCheck, SyncResource, SyncStatus};

// O "retrato" interno do gestor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncState {
    pub status: SyncStatus,
    pub current_location_id: Option<Uuid>,
    pub previous_location_id: Option<Uuid>,
    pub synced_resources: BTreeSet<SyncResource>,
    pub updating_since: Option<DateTime<Utc>>,
    pub timed_out: bool,
}

impl SyncState {
    fn idle(location_id: Option<Uuid>) -> Self {
        Self {
            status: SyncStatus::Idle,
            current_location_id: location_id,
            previous_location_id: None,
            synced_resources: BTreeSet::new(),
            updating_since: None,
            timed_out: false,
        }
    }

    pub fn pending_resources(&self) -> Vec<SyncResource> {
        SyncResource::REQUIRED
            .iter()
            .copied()
            .filter(|r| !self.synced_resources.contains(r))
            .collect()
    }
}

/// Máquina de estados da troca de local ativo.
///
/// `idle -> updating -> idle` quando todos os recursos dependentes foram
/// recarregados, `updating -> error` em falha (ou timeout). `error` só sai com
/// `reset()`. Enquanto não estiver `idle`, nenhuma escrita é permitida, para
/// não gravar contra dados do local anterior.
#[derive(Debug)]
pub struct ContextStateManager {
    inner: Mutex<SyncState>,
    sync_timeout: Option<Duration>,
}

impl Default for ContextStateManager {
    fn default() -> Self {
        Self::new(None)
    }
}

impl ContextStateManager {
    /// `sync_timeout = None` desliga o limite de tempo do estado `updating`.
    pub fn new(sync_timeout: Option<Duration>) -> Self {
        Self {
            inner: Mutex::new(SyncState::idle(None)),
            sync_timeout,
        }
    }

    /// Começa já `idle` num local conhecido (ex: depois do login).
    pub fn with_location(location_id: Uuid, sync_timeout: Option<Duration>) -> Self {
        Self {
            inner: Mutex::new(SyncState::idle(Some(location_id))),
            sync_timeout,
        }
    }

    fn lock(&self) -> MutexGuard<'_, SyncState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> SyncState {
        self.lock().clone()
    }

    pub fn notify_location_changed(&self, new_location_id: Uuid) {
        self.notify_location_changed_at(new_location_id, Utc::now());
    }

    pub fn notify_location_changed_at(&self, new_location_id: Uuid, now: DateTime<Utc>) {
        let mut state = self.lock();

        if state.current_location_id == Some(new_location_id) {
            return;
        }

        if state.status == SyncStatus::Error {
            tracing::warn!(
                location_id = %new_location_id,
                "Troca de local ignorada: o contexto está em erro e precisa de reset"
            );
            return;
        }

        tracing::info!(
            from = ?state.current_location_id,
            to = %new_location_id,
            "Local ativo alterado, aguardando ressincronização"
        );

        state.previous_location_id = state.current_location_id;
        state.current_location_id = Some(new_location_id);
        state.synced_resources.clear();
        state.status = SyncStatus::Updating;
        state.updating_since = Some(now);
        state.timed_out = false;
    }

    pub fn notify_resource_synced(&self, resource: SyncResource) {
        let mut state = self.lock();

        if state.status != SyncStatus::Updating {
            tracing::debug!(resource = resource.as_str(), status = ?state.status, "Sincronização fora de uma troca de local");
            return;
        }

        state.synced_resources.insert(resource);

        if state.pending_resources().is_empty() {
            state.status = SyncStatus::Idle;
            state.updating_since = None;
            tracing::info!(location_id = ?state.current_location_id, "✅ Contexto ressincronizado");
        }
    }

    pub fn notify_error(&self) {
        let mut state = self.lock();
        tracing::error!(location_id = ?state.current_location_id, "🔥 Falha na ressincronização do contexto");
        state.status = SyncStatus::Error;
        state.updating_since = None;
    }

    pub fn reset(&self) {
        let mut state = self.lock();
        let location_id = state.current_location_id;
        *state = SyncState::idle(location_id);
    }

    pub fn can_operate(&self) -> OperateCheck {
        self.can_operate_at(Utc::now())
    }

    pub fn can_operate_at(&self, now: DateTime<Utc>) -> OperateCheck {
        let mut state = self.lock();

        // [TIMEOUT] Um recurso que nunca confirma não pode bloquear para sempre
        if let (SyncStatus::Updating, Some(since), Some(timeout)) =
            (state.status, state.updating_since, self.sync_timeout)
        {
            if now - since > timeout {
                tracing::error!(
                    pending = ?state.pending_resources(),
                    "🔥 Timeout aguardando ressincronização do contexto"
                );
                state.status = SyncStatus::Error;
                state.updating_since = None;
                state.timed_out = true;
            }
        }

        match state.status {
            SyncStatus::Idle => OperateCheck {
                can_operate: true,
                state: SyncStatus::Idle,
                reason: None,
                pending_resources: None,
                timed_out: false,
            },
            SyncStatus::Updating => {
                let pending = state.pending_resources();
                let names: Vec<&str> = pending.iter().map(SyncResource::as_str).collect();
                OperateCheck {
                    can_operate: false,
                    state: SyncStatus::Updating,
                    reason: Some(format!("Aguardando sincronização de: {}", names.join(", "))),
                    pending_resources: Some(pending),
                    timed_out: false,
                }
            }
            SyncStatus::Error => OperateCheck {
                can_operate: false,
                state: SyncStatus::Error,
                reason: Some(if state.timed_out {
                    "A sincronização do local excedeu o tempo limite.".to_string()
                } else {
                    "A sincronização do local falhou.".to_string()
                }),
                pending_resources: None,
                timed_out: state.timed_out,
            },
        }
    }
}

// ---
// SessionStates: um gestor por utilizador autenticado
// ---
// Cada sessão troca de local de forma independente. Gestores sem uso há mais
// de `SESSION_IDLE_HOURS` saem do mapa; quem voltar recomeça `idle`.
pub const SESSION_IDLE_HOURS: i64 = 12;

struct SessionSlot {
    manager: Arc<ContextStateManager>,
    last_seen: DateTime<Utc>,
}

#[derive(Clone, Default)]
pub struct SessionStates {
    slots: Arc<Mutex<HashMap<Uuid, SessionSlot>>>,
    sync_timeout: Option<Duration>,
}

impl SessionStates {
    pub fn new(sync_timeout: Option<Duration>) -> Self {
        Self {
            slots: Arc::default(),
            sync_timeout,
        }
    }

    /// Devolve (ou cria) o gestor da sessão. Sessões novas nascem `idle` no
    /// local que o servidor conhece para o utilizador.
    pub fn for_principal(&self, principal_id: Uuid, location_id: Option<Uuid>) -> Arc<ContextStateManager> {
        self.for_principal_at(principal_id, location_id, Utc::now())
    }

    pub fn for_principal_at(
        &self,
        principal_id: Uuid,
        location_id: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Arc<ContextStateManager> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);

        // Um gestor ainda emprestado a um pedido nunca sai
        let idle_limit = Duration::hours(SESSION_IDLE_HOURS);
        let before = slots.len();
        slots.retain(|_, slot| now - slot.last_seen <= idle_limit || Arc::strong_count(&slot.manager) > 1);
        if slots.len() < before {
            tracing::debug!(evicted = before - slots.len(), "Sessões inativas descartadas");
        }

        let slot = slots.entry(principal_id).or_insert_with(|| SessionSlot {
            manager: Arc::new(match location_id {
                Some(id) => ContextStateManager::with_location(id, self.sync_timeout),
                None => ContextStateManager::new(self.sync_timeout),
            }),
            last_seen: now,
        });
        slot.last_seen = now;
        slot.manager.clone()
    }

    pub fn len(&self) -> usize {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
