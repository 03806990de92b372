// src/middleware/extract.rs
//
// Extratores que devolvem o envelope `{success:false,message}` quando o
// axum recusa a entrada. Id malformado é tratado como inexistente.

use axum::{
    extract::{FromRef, FromRequest, FromRequestParts, Path, Query, Request},
    http::{header, request::Parts, HeaderMap},
    Json,
};
use serde::de::DeserializeOwned;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
};

fn reject<S>(headers: &HeaderMap, state: &S, error: AppError) -> ApiError
where
    AppState: FromRef<S>,
{
    let app_state = AppState::from_ref(state);
    let locale = Locale::from_header(
        headers
            .get(header::ACCEPT_LANGUAGE)
            .and_then(|value| value.to_str().ok()),
    );
    error.to_api_error(&locale, &app_state.i18n_store)
}

/// Corpo JSON. Erro de sintaxe, campo faltando ou tipo errado viram 400.
#[derive(Debug)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let headers = req.headers().clone();
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => {
                tracing::debug!("Corpo JSON recusado: {}", rejection.body_text());
                Err(reject(&headers, state, AppError::BadRequest(rejection.body_text())))
            }
        }
    }
}

/// Parâmetro de rota. Um id que não parseia não pode existir: 404.
#[derive(Debug)]
pub struct ApiPath<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(ApiPath(value)),
            Err(rejection) => {
                tracing::debug!(path = %parts.uri.path(), "Parâmetro de rota recusado: {}", rejection.body_text());
                Err(reject(&parts.headers, state, AppError::ResourceNotFound("Resource".into())))
            }
        }
    }
}

/// Query string.
#[derive(Debug)]
pub struct ApiQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Query::<T>::from_request_parts(parts, state)
            .await
            .map(|Query(value)| ApiQuery(value))
            .map_err(|rejection| reject(&parts.headers, state, AppError::BadRequest(rejection.body_text())))
    }
}
