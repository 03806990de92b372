use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::common::i18n::I18nStore;
use crate::middleware::i18n::Locale;
use crate::models::order::OrderStatus;

// Nosso tipo de erro de domínio. Os handlers nunca devolvem isto diretamente:
// tudo passa por `to_api_error` para ganhar status HTTP e mensagem traduzida.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Pedido sem itens")]
    EmptyOrder,

    #[error("Status inválido: {0}")]
    InvalidStatus(String),

    #[error("Transição inválida: {from} -> {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("Requisição inválida: {0}")]
    BadRequest(String),

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Acesso negado")]
    Forbidden,

    #[error("Recurso não encontrado: {0}")]
    ResourceNotFound(String),

    #[error("Conflito: {0}")]
    Conflict(String),

    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("Falha no serviço externo: {0}")]
    Upstream(String),
}

/// Erro pronto para sair pela API: status + mensagem já traduzida.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into(), details: None }
    }
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::EmptyOrder
            | AppError::InvalidStatus(_)
            | AppError::InvalidTransition { .. }
            | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::ResourceNotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_)
            | AppError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Converte o erro de domínio em resposta da API no idioma do cliente.
    ///
    /// Erros 5xx são logados aqui com o detalhe completo; o cliente recebe
    /// apenas a mensagem genérica.
    pub fn to_api_error(&self, locale: &Locale, i18n: &I18nStore) -> ApiError {
        let lang = locale.0.as_str();
        let status = self.status_code();

        let (message, details) = match self {
            AppError::ValidationError(errors) => {
                let mut details = serde_json::Map::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| {
                            let key = e.message.as_deref().unwrap_or(&e.code);
                            i18n.translate(lang, &format!("validation.{key}"))
                        })
                        .collect();
                    details.insert(field.to_string(), json!(messages));
                }
                (i18n.translate(lang, "validation.failed"), Some(serde_json::Value::Object(details)))
            }
            AppError::EmptyOrder => (i18n.translate(lang, "order.empty"), None),
            AppError::InvalidStatus(value) => (
                i18n.translate_with(lang, "order.invalid_status", &[("status", value)]),
                None,
            ),
            AppError::InvalidTransition { from, to } => (
                i18n.translate_with(
                    lang,
                    "order.invalid_transition",
                    &[("from", from.as_str()), ("to", to.as_str())],
                ),
                None,
            ),
            AppError::BadRequest(reason) => (
                i18n.translate_with(lang, "request.bad", &[("reason", reason)]),
                None,
            ),
            AppError::InvalidCredentials => (i18n.translate(lang, "auth.invalid_credentials"), None),
            AppError::InvalidToken => (i18n.translate(lang, "auth.invalid_token"), None),
            AppError::Forbidden => (i18n.translate(lang, "auth.forbidden"), None),
            AppError::ResourceNotFound(what) => (
                i18n.translate_with(lang, "resource.not_found", &[("resource", what)]),
                None,
            ),
            AppError::Conflict(what) => (
                i18n.translate_with(lang, "resource.conflict", &[("resource", what)]),
                None,
            ),
            e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                (i18n.translate(lang, "server.internal"), None)
            }
        };

        ApiError { status, message, details }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = json!({
            "success": false,
            "message": self.message,
        });
        if let Some(details) = self.details {
            body["details"] = details;
        }
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::{ValidationError, ValidationErrors};

    fn italian() -> Locale {
        Locale("it".to_string())
    }

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(AppError::EmptyOrder.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::InvalidStatus("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::InvalidToken.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::ResourceNotFound("Order".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::Upstream("twilio".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn internal_errors_hide_details() {
        let store = I18nStore::new();
        let err = AppError::InternalServerError(anyhow::anyhow!("connection reset by peer"));
        let api = err.to_api_error(&Locale("en".into()), &store);

        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!api.message.contains("connection reset"));
    }

    #[test]
    fn invalid_status_message_mentions_value() {
        let store = I18nStore::new();
        let api = AppError::InvalidStatus("shipped".into()).to_api_error(&italian(), &store);
        assert!(api.message.contains("shipped"));
    }

    #[test]
    fn validation_errors_are_grouped_by_field() {
        let store = I18nStore::new();
        let mut errors = ValidationErrors::new();
        let mut err = ValidationError::new("length");
        err.message = Some("required".into());
        errors.add("customerName", err);

        let api = AppError::ValidationError(errors).to_api_error(&italian(), &store);
        let details = api.details.expect("details");
        assert_eq!(details["customerName"].as_array().map(|a| a.len()), Some(1));
    }
}
