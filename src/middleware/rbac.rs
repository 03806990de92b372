// src/middleware/rbac.rs

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use std::marker::PhantomData;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedAdmin, i18n::Locale},
    models::auth::AdminRole,
};

/// O trait que define qual papel uma rota exige
pub trait RoleDef: Send + Sync + 'static {
    fn allows(role: AdminRole) -> bool;
    fn name() -> &'static str;
}

/// O extractor (guardião). Depende do `auth_guard` ter rodado antes.
pub struct RequireRole<T>(pub PhantomData<T>);

impl<T, S> FromRequestParts<S> for RequireRole<T>
where
    T: RoleDef,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let locale = Locale::from_header(
            parts
                .headers
                .get(header::ACCEPT_LANGUAGE)
                .and_then(|value| value.to_str().ok()),
        );

        let admin = parts
            .extensions
            .get::<AuthenticatedAdmin>()
            .ok_or_else(|| AppError::InvalidToken.to_api_error(&locale, &app_state.i18n_store))?;

        if !T::allows(admin.0.role) {
            tracing::warn!(
                username = %admin.0.username,
                required = T::name(),
                "Acesso negado por papel"
            );
            return Err(AppError::Forbidden.to_api_error(&locale, &app_state.i18n_store));
        }

        Ok(RequireRole(PhantomData))
    }
}

// ---
// DEFINIÇÃO DOS PAPÉIS (TIPOS)
// ---

pub struct SuperAdmin;
impl RoleDef for SuperAdmin {
    fn allows(role: AdminRole) -> bool {
        role == AdminRole::SuperAdmin
    }
    fn name() -> &'static str { "super-admin" }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_super_admin_passes_super_admin_guard() {
        assert!(SuperAdmin::allows(AdminRole::SuperAdmin));
        assert!(!SuperAdmin::allows(AdminRole::Admin));
    }
}
