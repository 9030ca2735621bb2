// src/middleware/auth.rs

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AppState,
    models::{rbac::Role, tenancy::Principal},
};

// O conteúdo do token. A emissão acontece noutro serviço: aqui só verificamos.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default)]
    pub sub: Option<Uuid>,
    pub role: Role,
    #[serde(default)]
    pub tenant_id: Option<Uuid>,
    #[serde(default)]
    pub location_id: Option<Uuid>,
    pub exp: usize,
    pub iat: usize,
}

impl Claims {
    pub fn into_principal(self) -> Principal {
        Principal {
            principal_id: self.sub,
            role: self.role,
            server_tenant_id: self.tenant_id,
            server_location_id: self.location_id,
        }
    }
}

/// Verifica a assinatura e a validade de um token Bearer.
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, AppError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}

// Extrator para obter o utilizador autenticado diretamente nos handlers.
// A ausência de `sub`/`tenant_id` no token NÃO é rejeitada aqui: o
// ContextValidator responde com MISSING_PRINCIPAL / MISSING_TENANT.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedPrincipal(pub Principal);

impl AuthenticatedPrincipal {
    /// O id da sessão, exigido pelas rotas que mexem no estado do contexto.
    pub fn require_id(&self) -> Result<Uuid, AppError> {
        self.0.principal_id.ok_or(AppError::InvalidToken)
    }
}

impl<S> FromRequestParts<S> for AuthenticatedPrincipal
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or(AppError::InvalidToken)?;

        let claims = verify_token(token, &app_state.settings.jwt_secret).map_err(|e| {
            tracing::warn!("Token rejeitado: {}", e);
            e
        })?;

        Ok(AuthenticatedPrincipal(claims.into_principal()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "segredo-de-teste";

    fn token(claims: &Claims, secret: &str) -> String {
        encode(&Header::default(), claims, &EncodingKey::from_secret(secret.as_bytes()))
            .expect("assina")
    }

    fn claims() -> Claims {
        let now = chrono::Utc::now().timestamp() as usize;
        Claims {
            sub: Some(Uuid::new_v4()),
            role: Role::Staff,
            tenant_id: Some(Uuid::new_v4()),
            location_id: None,
            exp: now + 3600,
            iat: now,
        }
    }

    #[test]
    fn valid_token_becomes_a_principal() {
        let original = claims();
        let verified = verify_token(&token(&original, SECRET), SECRET).expect("válido");
        let principal = verified.into_principal();

        assert_eq!(principal.principal_id, original.sub);
        assert_eq!(principal.role, Role::Staff);
        assert_eq!(principal.server_tenant_id, original.tenant_id);
        assert_eq!(principal.server_location_id, None);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let result = verify_token(&token(&claims(), "outro"), SECRET);
        assert!(matches!(result, Err(AppError::JwtError(_))));
    }
}
