// src/services/auth.rs

use bcrypt::verify;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::AdminRepository,
    models::auth::{Admin, Claims, OrderActionClaims},
};

pub const SESSION_DAYS: i64 = 7;
pub const ORDER_ACTION_HOURS: i64 = 48;
pub const COMPLETE_ORDER_ACTION: &str = "complete_order";

/// Assina e valida os JWTs (sessão do staff e links de ação por pedido).
#[derive(Clone)]
pub struct TokenService {
    secret: String,
}

impl TokenService {
    pub fn new(secret: String) -> Self {
        Self { secret }
    }

    pub fn create_session_token(&self, admin: &Admin) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + Duration::days(SESSION_DAYS);

        let claims = Claims {
            sub: admin.id,
            role: admin.role,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_ref()),
        )?)
    }

    pub fn decode_session(&self, token: &str) -> Result<Claims, AppError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_ref()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|_| AppError::InvalidToken)
    }

    pub fn create_order_action_token(&self, order_id: Uuid) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = OrderActionClaims {
            order_id,
            action: COMPLETE_ORDER_ACTION.to_string(),
            exp: (now + Duration::hours(ORDER_ACTION_HOURS)).timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_ref()),
        )?)
    }

    /// O token só vale para o pedido e a ação para os quais foi emitido.
    pub fn verify_order_action(&self, token: &str, order_id: Uuid) -> Result<(), AppError> {
        let claims = decode::<OrderActionClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::InvalidToken)?
        .claims;

        if claims.order_id != order_id || claims.action != COMPLETE_ORDER_ACTION {
            return Err(AppError::InvalidToken);
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct AuthService {
    admin_repo: AdminRepository,
    tokens: TokenService,
}

impl AuthService {
    pub fn new(admin_repo: AdminRepository, tokens: TokenService) -> Self {
        Self { admin_repo, tokens }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<(Admin, String), AppError> {
        let username = username.trim().to_lowercase();
        let admin = self.admin_repo
            .find_by_username(&username)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let password_clone = password.to_owned();
        let password_hash_clone = admin.password_hash.clone();

        // Executa a verificação em um thread separado
        let is_password_valid = tokio::task::spawn_blocking(move || {
            verify(&password_clone, &password_hash_clone)
        })
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))?
        ?;

        if !is_password_valid {
            tracing::warn!(username = %username, "Tentativa de login com senha inválida");
            return Err(AppError::InvalidCredentials);
        }

        let token = self.tokens.create_session_token(&admin)?;
        tracing::info!(username = %admin.username, "Login de staff");
        Ok((admin, token))
    }

    pub async fn validate_token(&self, token: &str) -> Result<Admin, AppError> {
        let claims = self.tokens.decode_session(token)?;

        // Conta removida depois do login = sessão inválida
        self.admin_repo
            .find_by_id(claims.sub)
            .await?
            .ok_or(AppError::InvalidToken)
    }
}
