// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::{common::i18n::I18nStore, middleware::i18n::Locale};

// Erros de infraestrutura. Os resultados do pipeline de validação NÃO passam
// por aqui: viram um `OperationResult`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Token inválido")]
    InvalidToken,

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("Cabeçalho inválido: {0}")]
    InvalidHeader(&'static str),

    #[error("Recurso não encontrado: {0}")]
    ResourceNotFound(String),

    #[error("Recurso de sincronização desconhecido: {0}")]
    UnknownResource(String),

    #[error("Operação desconhecida: {0}")]
    UnknownOperation(String),

    #[error("Acesso negado")]
    Forbidden,

    #[error("Dados de referência inválidos: {0}")]
    ReferenceDataLoad(#[from] serde_json::Error),

    #[error("Erro de I/O: {0}")]
    Io(#[from] std::io::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),
}

impl AppError {
    /// A chave usada no catálogo de mensagens
    pub fn i18n_key(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::InvalidToken | AppError::JwtError(_) => "INVALID_TOKEN",
            AppError::InvalidHeader(_) => "INVALID_HEADER",
            AppError::ResourceNotFound(_) => "RESOURCE_NOT_FOUND",
            AppError::UnknownResource(_) => "UNKNOWN_RESOURCE",
            AppError::UnknownOperation(_) => "UNKNOWN_OPERATION",
            AppError::Forbidden => "FORBIDDEN",
            AppError::ReferenceDataLoad(_) => "INVALID_REFERENCE_DATA",
            AppError::Io(_) | AppError::InternalServerError(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::InvalidHeader(_)
            | AppError::UnknownResource(_)
            | AppError::UnknownOperation(_)
            | AppError::ReferenceDataLoad(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidToken | AppError::JwtError(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::ResourceNotFound(_) => StatusCode::NOT_FOUND,
            AppError::Io(_) | AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Converte o erro numa resposta traduzida para o idioma do pedido.
    pub fn to_api_error(&self, locale: &Locale, store: &I18nStore) -> ApiError {
        let status = self.status();

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            // O detalhe vai só para o log
            tracing::error!("Erro Interno do Servidor: {:?}", self);
        }

        let details = match self {
            // Retorna todos os detalhes da validação
            AppError::ValidationError(errors) => {
                let mut details = serde_json::Map::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                        .collect();
                    details.insert(field.to_string(), json!(messages));
                }
                Some(Value::Object(details))
            }
            AppError::ResourceNotFound(what)
            | AppError::UnknownResource(what)
            | AppError::UnknownOperation(what) => Some(json!({ "value": what })),
            AppError::InvalidHeader(header) => Some(json!({ "header": header })),
            _ => None,
        };

        ApiError {
            status,
            error: store.message(&locale.0, self.i18n_key()).to_string(),
            details,
        }
    }
}

// O erro já pronto para ir para o cliente
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

// Sem contexto de idioma (ex: middleware), usamos o catálogo padrão
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.to_api_error(&Locale::default(), &I18nStore::default())
            .into_response()
    }
}
