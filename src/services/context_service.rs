// src/services/context_service.rs

use chrono::Utc;

use crate::models::{
    tenancy::{ClientAssertedContext, ContextSnapshot, TenantContext},
    validation::{ContextError, ContextState, ContextValidation, ErrorCode, RecoveryHint},
};

/// Compara o tenant que o cliente afirma com o que o servidor sabe ser
/// verdade para o utilizador autenticado.
///
/// Serve para apanhar a corrida entre uma troca de tenant e um valor antigo
/// em cache no cliente, antes de qualquer escrita. É chamado de novo em cada
/// operação e nunca guarda estado.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextValidator;

impl ContextValidator {
    pub fn new() -> Self {
        Self
    }

    pub fn validate_context(
        &self,
        asserted: &ClientAssertedContext,
        truth: &TenantContext,
    ) -> ContextValidation {
        // 1. O servidor precisa saber quem é o utilizador e de que tenant ele é
        let Some(principal_id) = truth.principal_id else {
            return Self::missing(
                ErrorCode::MissingPrincipal,
                "Utilizador autenticado não identificado.",
                None,
            );
        };

        let Some(server_tenant_id) = truth.server_tenant_id else {
            return Self::missing(
                ErrorCode::MissingTenant,
                "O servidor não conhece o estabelecimento deste utilizador.",
                None,
            );
        };

        // 2. O cliente tem de afirmar algum tenant
        let Some(asserted_tenant_id) = asserted.tenant_id else {
            return Self::missing(
                ErrorCode::MissingTenant,
                "O pedido não informa o estabelecimento.",
                Some(server_tenant_id),
            );
        };

        // 3. E tem de ser o mesmo
        if asserted_tenant_id != server_tenant_id {
            tracing::warn!(
                principal_id = %principal_id,
                expected = %server_tenant_id,
                actual = %asserted_tenant_id,
                "Divergência de tenant entre cliente e servidor"
            );

            return ContextValidation {
                valid: false,
                state: ContextState::Divergent,
                snapshot: None,
                error: Some(ContextError {
                    code: ErrorCode::TenantDivergence,
                    message: format!(
                        "O estabelecimento do pedido ({}) não corresponde ao da sessão ({}).",
                        asserted_tenant_id, server_tenant_id
                    ),
                    recovery: RecoveryHint::ResyncTenant,
                    expected: Some(server_tenant_id),
                    actual: Some(asserted_tenant_id),
                }),
            };
        }

        ContextValidation {
            valid: true,
            state: ContextState::Clean,
            snapshot: Some(ContextSnapshot {
                principal_id,
                server_tenant_id,
                asserted_tenant_id,
                asserted_location_id: asserted.location_id,
                timestamp: Utc::now(),
            }),
            error: None,
        }
    }

    fn missing(code: ErrorCode, message: &str, expected: Option<uuid::Uuid>) -> ContextValidation {
        tracing::warn!(code = code.as_str(), "Contexto incompleto: {}", message);

        ContextValidation {
            valid: false,
            state: ContextState::MissingData,
            snapshot: None,
            error: Some(ContextError {
                code,
                message: message.to_string(),
                recovery: RecoveryHint::RefreshCredentials,
                expected,
                actual: None,
            }),
        }
    }
}
