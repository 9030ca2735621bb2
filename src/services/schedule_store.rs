// src/services/schedule_store.rs

use std::{
    collections::{BTreeMap, HashMap},
    sync::{Arc, Mutex, PoisonError, RwLock, Weak},
};

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::models::scheduling::{AppointmentStatus, ScheduleEntry};

type Listener = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct Listeners {
    next_id: u64,
    callbacks: BTreeMap<u64, Listener>,
}

/// Cache em memória dos turnos.
///
/// Um escritor, vários leitores: cada mutação monta uma coleção nova e troca-a
/// inteira, por isso um leitor nunca vê um estado pela metade. Os observadores
/// só são avisados depois da troca, fora do lock. Escritas concorrentes no
/// mesmo turno: vence a última.
#[derive(Clone, Default)]
pub struct ScheduleStore {
    entries: Arc<RwLock<Arc<Vec<ScheduleEntry>>>>,
    listeners: Arc<Mutex<Listeners>>,
}

/// Mantém um observador registado. Ao ser descartada, cancela a inscrição.
pub struct Subscription {
    id: u64,
    listeners: Weak<Mutex<Listeners>>,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .callbacks
                .remove(&self.id);
        }
    }
}

impl ScheduleStore {
    pub fn new() -> Self {
        Self::default()
    }

    // --- LEITURA ---

    pub fn snapshot(&self) -> Arc<Vec<ScheduleEntry>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn get(&self, id: Uuid) -> Option<ScheduleEntry> {
        self.snapshot().iter().find(|e| e.id == id).cloned()
    }

    pub fn entries_for(&self, staff_id: Uuid, location_id: Uuid) -> Vec<ScheduleEntry> {
        self.snapshot()
            .iter()
            .filter(|e| e.staff_id == staff_id && e.location_id == location_id)
            .cloned()
            .collect()
    }

    pub fn entries_for_location(&self, tenant_id: Uuid, location_id: Option<Uuid>) -> Vec<ScheduleEntry> {
        let mut entries: Vec<ScheduleEntry> = self
            .snapshot()
            .iter()
            .filter(|e| e.tenant_id == tenant_id)
            .filter(|e| location_id.is_none_or(|id| e.location_id == id))
            .cloned()
            .collect();
        entries.sort_by_key(|e| e.starts_at);
        entries
    }

    // --- ESCRITA ---

    pub fn set_all(&self, entries: Vec<ScheduleEntry>) {
        self.mutate(|current| {
            *current = entries;
            ((), true)
        })
    }

    pub fn upsert(&self, entry: ScheduleEntry) {
        self.mutate(|current| {
            match current.iter_mut().find(|e| e.id == entry.id) {
                Some(existing) => *existing = entry,
                None => current.push(entry),
            }
            ((), true)
        })
    }

    pub fn remove(&self, id: Uuid) -> Option<ScheduleEntry> {
        self.mutate(|current| match current.iter().position(|e| e.id == id) {
            Some(index) => (Some(current.remove(index)), true),
            None => (None, false),
        })
    }

    pub fn update_status(&self, id: Uuid, status: AppointmentStatus) -> Option<ScheduleEntry> {
        self.mutate(|current| match current.iter_mut().find(|e| e.id == id) {
            Some(entry) => {
                entry.status = status;
                entry.updated_at = Utc::now();
                (Some(entry.clone()), true)
            }
            None => (None, false),
        })
    }

    pub fn reschedule(
        &self,
        id: Uuid,
        staff_id: Uuid,
        starts_at: DateTime<Utc>,
        duration_minutes: u32,
    ) -> Option<ScheduleEntry> {
        self.mutate(|current| match current.iter_mut().find(|e| e.id == id) {
            Some(entry) => {
                entry.staff_id = staff_id;
                entry.starts_at = starts_at;
                entry.duration_minutes = Some(duration_minutes);
                entry.updated_at = Utc::now();
                (Some(entry.clone()), true)
            }
            None => (None, false),
        })
    }

    // --- OBSERVADORES ---

    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        let id = listeners.next_id;
        listeners.next_id += 1;
        listeners.callbacks.insert(id, Arc::new(callback));

        Subscription {
            id,
            listeners: Arc::downgrade(&self.listeners),
        }
    }

    fn mutate<R>(&self, change: impl FnOnce(&mut Vec<ScheduleEntry>) -> (R, bool)) -> R {
        let (result, changed) = {
            let mut guard = self.entries.write().unwrap_or_else(PoisonError::into_inner);
            let mut next = Vec::clone(&guard);
            let (result, changed) = change(&mut next);
            if changed {
                *guard = Arc::new(next);
            }
            (result, changed)
        };

        if changed {
            self.notify();
        }
        result
    }

    fn notify(&self) {
        // Copia a lista para que um observador possa (des)inscrever-se sem deadlock
        let callbacks: Vec<Listener> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .callbacks
            .values()
            .cloned()
            .collect();

        for callback in callbacks {
            callback();
        }
    }
}

// ---
// BookingLocks: uma escrita de cada vez por unidade
// ---
// Validar contra o snapshot, gravar no backend e publicar no store é uma só
// janela. Duas janelas na mesma (loja, unidade) nunca se intercalam, senão
// ambas validariam contra um snapshot sem a outra.
#[derive(Clone, Default)]
pub struct BookingLocks {
    locks: Arc<Mutex<HashMap<(Uuid, Uuid), Arc<AsyncMutex<()>>>>>,
}

impl BookingLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, tenant_id: Uuid, location_id: Uuid) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            locks.entry((tenant_id, location_id)).or_default().clone()
        };
        lock.lock_owned().await
    }
}
