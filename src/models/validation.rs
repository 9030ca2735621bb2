// src/models/validation.rs

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use utoipa::ToSchema;

use crate::models::{
    rbac::PermissionDecision,
    scheduling::NormalizedAppointment,
    sync::SyncResource,
    tenancy::ContextSnapshot,
};

// --- Códigos de erro ---
// Agrupados pelo estágio do pipeline que os produz. Quem consome o resultado
// deve ramificar por código, nunca pelo texto da mensagem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Contexto
    TenantDivergence,
    MissingTenant,
    MissingPrincipal,

    // Estado
    StateUpdating,
    StateError,
    StateTimeout,

    // Permissão
    RoleNotAuthorized,
    ScopeViolation,

    // Negócio
    MissingRequiredField,
    InvalidTimeFormat,
    LocationNotInTenant,
    ServiceNotInLocation,
    StaffNotInLocation,
    StaffCantDoService,
    LocationClosed,
    StaffConflict,
    AppointmentNotFound,
    AppointmentClosed,
    InvalidStatusTransition,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::TenantDivergence => "TENANT_DIVERGENCE",
            ErrorCode::MissingTenant => "MISSING_TENANT",
            ErrorCode::MissingPrincipal => "MISSING_PRINCIPAL",
            ErrorCode::StateUpdating => "STATE_UPDATING",
            ErrorCode::StateError => "STATE_ERROR",
            ErrorCode::StateTimeout => "STATE_TIMEOUT",
            ErrorCode::RoleNotAuthorized => "ROLE_NOT_AUTHORIZED",
            ErrorCode::ScopeViolation => "SCOPE_VIOLATION",
            ErrorCode::MissingRequiredField => "MISSING_REQUIRED_FIELD",
            ErrorCode::InvalidTimeFormat => "INVALID_TIME_FORMAT",
            ErrorCode::LocationNotInTenant => "LOCATION_NOT_IN_TENANT",
            ErrorCode::ServiceNotInLocation => "SERVICE_NOT_IN_LOCATION",
            ErrorCode::StaffNotInLocation => "STAFF_NOT_IN_LOCATION",
            ErrorCode::StaffCantDoService => "STAFF_CANT_DO_SERVICE",
            ErrorCode::LocationClosed => "LOCATION_CLOSED",
            ErrorCode::StaffConflict => "STAFF_CONFLICT",
            ErrorCode::AppointmentNotFound => "APPOINTMENT_NOT_FOUND",
            ErrorCode::AppointmentClosed => "APPOINTMENT_CLOSED",
            ErrorCode::InvalidStatusTransition => "INVALID_STATUS_TRANSITION",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// O que o chamador deve fazer para se recuperar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryHint {
    RefreshCredentials,
    ResyncTenant,
    Wait,
    Reload,
}

// --- Contexto ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ContextState {
    Clean,
    Divergent,
    MissingData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextError {
    pub code: ErrorCode,
    pub message: String,
    pub recovery: RecoveryHint,
    pub expected: Option<Uuid>,
    pub actual: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextValidation {
    pub valid: bool,
    pub state: ContextState,
    pub snapshot: Option<ContextSnapshot>,
    pub error: Option<ContextError>,
}

// --- Regras de negócio ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleViolation {
    pub rule_failed: ErrorCode,
    pub message: String,
    pub suggestions: Vec<String>,
}

impl RuleViolation {
    pub fn new(rule_failed: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            rule_failed,
            message: message.into(),
            suggestions: Vec::new(),
        }
    }

    pub fn with_suggestions(mut self, suggestions: Vec<String>) -> Self {
        self.suggestions = suggestions;
        self
    }
}

// ---
// OperationResult (O resultado final do pipeline)
// ---
// Um variant por remediação: corrigir o formulário (Invalid), pedir acesso
// (PermissionDenied), ressincronizar/recarregar (Inconsistent) ou esperar e
// tentar de novo (InconsistentTemporary).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum OperationResult<T = NormalizedAppointment> {
    Valid {
        snapshot: ContextSnapshot,
        permission: PermissionDecision,
        appointment: T,
    },
    Invalid {
        rule_failed: ErrorCode,
        message: String,
        suggestions: Vec<String>,
    },
    Inconsistent {
        error_code: ErrorCode,
        message: String,
        recovery: RecoveryHint,
        #[serde(skip_serializing_if = "Option::is_none")]
        expected: Option<Uuid>,
        #[serde(skip_serializing_if = "Option::is_none")]
        actual: Option<Uuid>,
    },
    InconsistentTemporary {
        error_code: ErrorCode,
        message: String,
        pending_resources: Vec<SyncResource>,
        recovery: RecoveryHint,
    },
    PermissionDenied {
        decision: PermissionDecision,
        message: String,
    },
}

impl<T> OperationResult<T> {
    pub fn status(&self) -> &'static str {
        match self {
            OperationResult::Valid { .. } => "valid",
            OperationResult::Invalid { .. } => "invalid",
            OperationResult::Inconsistent { .. } => "inconsistent",
            OperationResult::InconsistentTemporary { .. } => "inconsistent_temporary",
            OperationResult::PermissionDenied { .. } => "permission_denied",
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, OperationResult::Valid { .. })
    }

    /// O código que explica a falha (`None` quando é válido).
    pub fn error_code(&self) -> Option<ErrorCode> {
        match self {
            OperationResult::Valid { .. } => None,
            OperationResult::Invalid { rule_failed, .. } => Some(*rule_failed),
            OperationResult::Inconsistent { error_code, .. } => Some(*error_code),
            OperationResult::InconsistentTemporary { error_code, .. } => Some(*error_code),
            OperationResult::PermissionDenied { decision, .. } => match decision.reason {
                crate::models::rbac::PermissionReason::ScopeViolation => Some(ErrorCode::ScopeViolation),
                _ => Some(ErrorCode::RoleNotAuthorized),
            },
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            OperationResult::Valid { .. } => None,
            OperationResult::Invalid { message, .. }
            | OperationResult::Inconsistent { message, .. }
            | OperationResult::InconsistentTemporary { message, .. }
            | OperationResult::PermissionDenied { message, .. } => Some(message),
        }
    }
}

impl<T> From<RuleViolation> for OperationResult<T> {
    fn from(violation: RuleViolation) -> Self {
        OperationResult::Invalid {
            rule_failed: violation.rule_failed,
            message: violation.message,
            suggestions: violation.suggestions,
        }
    }
}

impl<T> From<ContextError> for OperationResult<T> {
    fn from(error: ContextError) -> Self {
        OperationResult::Inconsistent {
            error_code: error.code,
            message: error.message,
            recovery: error.recovery,
            expected: error.expected,
            actual: error.actual,
        }
    }
}
