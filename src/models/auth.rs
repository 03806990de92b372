// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "admin_role", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum AdminRole {
    Admin,
    SuperAdmin,
}

// Conta de staff vinda do banco
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Admin {
    pub id: Uuid,
    #[schema(example = "reception")]
    pub username: String,

    #[serde(skip_serializing)] // nunca sai pela API
    #[schema(ignore)]
    pub password_hash: String,

    #[schema(example = "Reception Desk")]
    pub name: String,
    pub role: AdminRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Dados para login
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginPayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "reception")]
    pub username: String,
    #[validate(length(min = 1, message = "required"))]
    pub password: String,
}

/// Perfil devolvido no login e em `/me`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminProfile {
    pub id: Uuid,
    pub username: String,
    pub name: String,
    pub role: AdminRole,
}

impl From<&Admin> for AdminProfile {
    fn from(admin: &Admin) -> Self {
        Self {
            id: admin.id,
            username: admin.username.clone(),
            name: admin.name.clone(),
            role: admin.role,
        }
    }
}

// Estrutura de dados ("claims") dentro do JWT de sessão
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,       // ID do admin
    pub role: AdminRole,
    pub exp: usize,
    pub iat: usize,
}

// Claims do link "marcar como concluído" enviado ao staff: vale só para um pedido
#[derive(Debug, Serialize, Deserialize)]
pub struct OrderActionClaims {
    pub order_id: Uuid,
    pub action: String,
    pub exp: usize,
    pub iat: usize,
}
