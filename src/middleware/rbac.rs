// src/middleware/rbac.rs

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use std::marker::PhantomData;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedPrincipal,
    models::rbac::Operation,
    services::rbac_service::PermissionResolver,
};

/// 1. O Trait que liga um tipo a uma operação
pub trait OperationDef: Send + Sync + 'static {
    fn operation() -> Operation;
}

/// 2. O Extractor (Guardião) para rotas fora do pipeline de validação.
///
/// Só olha para o cargo: o escopo de local fica a cargo do handler (ou do
/// `OperationValidator`, nas rotas de turnos).
pub struct RequireOperation<T>(pub AuthenticatedPrincipal, pub PhantomData<T>);

impl<T, S> FromRequestParts<S> for RequireOperation<T>
where
    T: OperationDef,
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let principal = AuthenticatedPrincipal::from_request_parts(parts, state).await?;
        let resolver = PermissionResolver::new();

        let required = T::operation();
        let operation = resolver.effective_operation(principal.0.role, required);

        if !resolver.role_has(principal.0.role, operation) {
            tracing::warn!(
                role = principal.0.role.as_str(),
                operation = required.as_str(),
                "Acesso negado"
            );
            return Err(AppError::Forbidden);
        }

        Ok(RequireOperation(principal, PhantomData))
    }
}

// ---
// DEFINIÇÃO DAS OPERAÇÕES (TIPOS)
// ---

pub struct PermAppointmentRead;
impl OperationDef for PermAppointmentRead {
    fn operation() -> Operation { Operation::AppointmentReadOwnLocation }
}

pub struct PermLocationManage;
impl OperationDef for PermLocationManage {
    fn operation() -> Operation { Operation::LocationManageAll }
}
