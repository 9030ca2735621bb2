// src/middleware/tenancy.rs

use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::{common::error::AppError, models::tenancy::ClientAssertedContext};

// Os cabeçalhos com o contexto que o cliente acha que tem
const TENANT_ID_HEADER: &str = "x-tenant-id";
const LOCATION_ID_HEADER: &str = "x-location-id";

// O extrator. Os dois cabeçalhos são opcionais: a falta do tenant é um
// resultado do pipeline (MISSING_TENANT), não um erro HTTP.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClientContext(pub ClientAssertedContext);

fn header_uuid(parts: &Parts, name: &'static str) -> Result<Option<Uuid>, AppError> {
    let Some(value) = parts.headers.get(name) else {
        return Ok(None);
    };

    let raw = value.to_str().map_err(|_| AppError::InvalidHeader(name))?.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    Uuid::parse_str(raw)
        .map(Some)
        .map_err(|_| AppError::InvalidHeader(name))
}

impl<S> FromRequestParts<S> for ClientContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(ClientContext(ClientAssertedContext {
            tenant_id: header_uuid(parts, TENANT_ID_HEADER)?,
            location_id: header_uuid(parts, LOCATION_ID_HEADER)?,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(headers: &[(&str, &str)]) -> Parts {
        let mut builder = Request::builder();
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(()).expect("request").into_parts().0
    }

    #[tokio::test]
    async fn reads_both_headers() {
        let tenant = Uuid::new_v4();
        let location = Uuid::new_v4();
        let mut parts = parts(&[
            ("x-tenant-id", &tenant.to_string()),
            ("x-location-id", &location.to_string()),
        ]);

        let ClientContext(ctx) = ClientContext::from_request_parts(&mut parts, &()).await.expect("ok");

        assert_eq!(ctx.tenant_id, Some(tenant));
        assert_eq!(ctx.location_id, Some(location));
    }

    #[tokio::test]
    async fn missing_headers_are_not_an_error() {
        let mut parts = parts(&[]);
        let ClientContext(ctx) = ClientContext::from_request_parts(&mut parts, &()).await.expect("ok");
        assert_eq!(ctx, ClientAssertedContext::default());
    }

    #[tokio::test]
    async fn malformed_uuid_is_rejected() {
        let mut parts = parts(&[("x-tenant-id", "loja-1")]);
        let result = ClientContext::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(AppError::InvalidHeader("x-tenant-id"))));
    }
}
