// src/common/i18n.rs

use std::{collections::HashMap, sync::Arc};

const FALLBACK_LANG: &str = "en";

// (chave, pt, es, en)
const MESSAGES: &[(&str, &str, &str, &str)] = &[
    // --- Contexto ---
    (
        "TENANT_DIVERGENCE",
        "A loja selecionada não corresponde à sua sessão. Recarregue a loja.",
        "La tienda seleccionada no coincide con su sesión. Recargue la tienda.",
        "The selected tenant does not match your session. Please resync.",
    ),
    (
        "MISSING_TENANT",
        "Nenhuma loja selecionada. Entre novamente.",
        "Ninguna tienda seleccionada. Inicie sesión de nuevo.",
        "No tenant selected. Please sign in again.",
    ),
    (
        "MISSING_PRINCIPAL",
        "Sessão sem utilizador. Entre novamente.",
        "Sesión sin usuario. Inicie sesión de nuevo.",
        "Session has no user. Please sign in again.",
    ),
    // --- Estado ---
    (
        "STATE_UPDATING",
        "Os dados estão a ser sincronizados. Tente novamente em instantes.",
        "Los datos se están sincronizando. Inténtelo de nuevo en breve.",
        "Data is still syncing. Try again in a moment.",
    ),
    (
        "STATE_ERROR",
        "A sincronização falhou. Recarregue a página.",
        "La sincronización falló. Recargue la página.",
        "Synchronization failed. Please reload.",
    ),
    (
        "STATE_TIMEOUT",
        "A sincronização demorou demasiado. Recarregue a página.",
        "La sincronización tardó demasiado. Recargue la página.",
        "Synchronization timed out. Please reload.",
    ),
    // --- Permissão ---
    (
        "ROLE_NOT_AUTHORIZED",
        "O seu cargo não permite esta operação.",
        "Su rol no permite esta operación.",
        "Your role does not allow this operation.",
    ),
    (
        "SCOPE_VIOLATION",
        "Só pode operar na sua própria unidade.",
        "Solo puede operar en su propia sucursal.",
        "You can only operate on your own location.",
    ),
    // --- Regras de negócio ---
    (
        "MISSING_REQUIRED_FIELD",
        "Falta um campo obrigatório.",
        "Falta un campo obligatorio.",
        "A required field is missing.",
    ),
    (
        "INVALID_TIME_FORMAT",
        "A data/hora informada é inválida.",
        "La fecha/hora indicada no es válida.",
        "The given date/time is invalid.",
    ),
    (
        "LOCATION_NOT_IN_TENANT",
        "A unidade não pertence a esta loja ou está inativa.",
        "La sucursal no pertenece a esta tienda o está inactiva.",
        "The location does not belong to this tenant or is inactive.",
    ),
    (
        "SERVICE_NOT_IN_LOCATION",
        "O serviço não é oferecido nesta unidade.",
        "El servicio no se ofrece en esta sucursal.",
        "The service is not offered at this location.",
    ),
    (
        "STAFF_NOT_IN_LOCATION",
        "O profissional não trabalha nesta unidade.",
        "El profesional no trabaja en esta sucursal.",
        "The staff member does not work at this location.",
    ),
    (
        "STAFF_CANT_DO_SERVICE",
        "O profissional não realiza este serviço.",
        "El profesional no realiza este servicio.",
        "The staff member does not perform this service.",
    ),
    (
        "LOCATION_CLOSED",
        "A unidade está fechada neste horário.",
        "La sucursal está cerrada en este horario.",
        "The location is closed at this time.",
    ),
    (
        "STAFF_CONFLICT",
        "O profissional já tem um turno neste horário.",
        "El profesional ya tiene un turno en este horario.",
        "The staff member already has an appointment at this time.",
    ),
    (
        "APPOINTMENT_NOT_FOUND",
        "Turno não encontrado.",
        "Turno no encontrado.",
        "Appointment not found.",
    ),
    (
        "APPOINTMENT_CLOSED",
        "Este turno já foi concluído ou cancelado.",
        "Este turno ya fue completado o cancelado.",
        "This appointment is already completed or cancelled.",
    ),
    (
        "INVALID_STATUS_TRANSITION",
        "Esta mudança de estado não é permitida.",
        "Este cambio de estado no está permitido.",
        "This status change is not allowed.",
    ),
    // --- Infraestrutura ---
    (
        "VALIDATION_ERROR",
        "Os dados enviados são inválidos.",
        "Los datos enviados no son válidos.",
        "The submitted data is invalid.",
    ),
    (
        "INVALID_TOKEN",
        "Token de acesso inválido ou expirado.",
        "Token de acceso inválido o caducado.",
        "Invalid or expired access token.",
    ),
    (
        "INVALID_HEADER",
        "Cabeçalho inválido.",
        "Cabecera no válida.",
        "Invalid header.",
    ),
    (
        "RESOURCE_NOT_FOUND",
        "Recurso não encontrado.",
        "Recurso no encontrado.",
        "Resource not found.",
    ),
    (
        "UNKNOWN_RESOURCE",
        "Recurso de sincronização desconhecido.",
        "Recurso de sincronización desconocido.",
        "Unknown sync resource.",
    ),
    (
        "UNKNOWN_OPERATION",
        "Operação desconhecida.",
        "Operación desconocida.",
        "Unknown operation.",
    ),
    (
        "FORBIDDEN",
        "Acesso negado.",
        "Acceso denegado.",
        "Access denied.",
    ),
    (
        "INVALID_REFERENCE_DATA",
        "Os dados de referência são inválidos.",
        "Los datos de referencia no son válidos.",
        "The reference data is invalid.",
    ),
    (
        "INTERNAL_ERROR",
        "Erro interno do servidor.",
        "Error interno del servidor.",
        "Internal server error.",
    ),
];

/// Catálogo de mensagens por idioma (`pt`, `es`, `en`).
#[derive(Clone)]
pub struct I18nStore {
    // idioma -> (chave -> mensagem)
    messages: Arc<HashMap<&'static str, HashMap<&'static str, &'static str>>>,
}

impl Default for I18nStore {
    fn default() -> Self {
        Self::new()
    }
}

impl I18nStore {
    pub fn new() -> Self {
        let mut pt = HashMap::new();
        let mut es = HashMap::new();
        let mut en = HashMap::new();

        for &(key, pt_msg, es_msg, en_msg) in MESSAGES {
            pt.insert(key, pt_msg);
            es.insert(key, es_msg);
            en.insert(key, en_msg);
        }

        let messages = HashMap::from([("pt", pt), ("es", es), ("en", en)]);
        Self {
            messages: Arc::new(messages),
        }
    }

    /// Procura a mensagem no idioma pedido, depois em inglês, depois devolve a própria chave.
    pub fn message<'a>(&self, lang: &str, key: &'a str) -> &'a str {
        self.lookup(lang, key)
            .or_else(|| self.lookup(FALLBACK_LANG, key))
            .unwrap_or(key)
    }

    fn lookup(&self, lang: &str, key: &str) -> Option<&'static str> {
        self.messages.get(lang)?.get(key).copied()
    }
}
