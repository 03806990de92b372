// src/handlers/auth.rs

use axum::{extract::State, response::IntoResponse};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use validator::Validate;

use crate::{
    common::{
        error::{ApiError, AppError},
        response::ApiResponse,
    },
    config::AppState,
    middleware::{
        auth::{AuthenticatedAdmin, SESSION_COOKIE},
        extract::ApiJson,
        i18n::Locale,
    },
    models::auth::{AdminProfile, LoginPayload},
    services::auth::SESSION_DAYS,
};

/// Cookie de sessão: HTTP-only, SameSite=Lax, 7 dias.
pub fn session_cookie(token: &str, secure: bool) -> Result<Cookie<'static>, AppError> {
    let max_age = SESSION_DAYS * 24 * 60 * 60;
    let secure = if secure { "; Secure" } else { "" };
    let raw = format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}{secure}");

    Cookie::parse(raw).map_err(|e| AppError::InternalServerError(anyhow::anyhow!("Cookie inválido: {}", e)))
}

// Handler de login
#[utoipa::path(
    post,
    path = "/api/admin/auth/login",
    tag = "Auth",
    request_body = LoginPayload,
    responses(
        (status = 200, description = "Sessão criada (cookie admin_token)", body = AdminProfile),
        (status = 401, description = "Usuário ou senha inválidos")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    locale: Locale,
    jar: CookieJar,
    ApiJson(payload): ApiJson<LoginPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let (admin, token) = app_state
        .auth_service
        .login(&payload.username, &payload.password)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let cookie = session_cookie(&token, app_state.settings.cookie_secure)
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((jar.add(cookie), ApiResponse::ok(AdminProfile::from(&admin))))
}

// Handler de logout: só apaga o cookie, o JWT expira sozinho
#[utoipa::path(
    post,
    path = "/api/admin/auth/logout",
    tag = "Auth",
    responses((status = 200, description = "Cookie removido"))
)]
pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    (
        jar.remove(Cookie::build(SESSION_COOKIE).path("/")),
        ApiResponse::ok(serde_json::json!({ "loggedOut": true })),
    )
}

// Handler da rota protegida /me
#[utoipa::path(
    get,
    path = "/api/admin/auth/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Admin da sessão atual", body = AdminProfile),
        (status = 401, description = "Sessão ausente ou expirada")
    ),
    security(("admin_cookie" = []), ("api_jwt" = []))
)]
pub async fn get_me(AuthenticatedAdmin(admin): AuthenticatedAdmin) -> impl IntoResponse {
    ApiResponse::ok(AdminProfile::from(&admin))
}
