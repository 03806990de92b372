use sqlx::PgPool;
use uuid::Uuid;
use crate::{common::error::AppError, models::auth::Admin};

const ADMIN_COLUMNS: &str = "id, username, password_hash, name, role, created_at, updated_at";

// O repositório de contas de staff, responsável pela tabela 'admins'.
// As contas são criadas fora da aplicação; aqui só há leitura.
#[derive(Clone)]
pub struct AdminRepository {
    pool: PgPool,
}

impl AdminRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Busca pelo username já normalizado (minúsculas)
    pub async fn find_by_username(&self, username: &str) -> Result<Option<Admin>, AppError> {
        let sql = format!("SELECT {ADMIN_COLUMNS} FROM admins WHERE username = $1");
        sqlx::query_as::<_, Admin>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::DatabaseError)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Admin>, AppError> {
        let sql = format!("SELECT {ADMIN_COLUMNS} FROM admins WHERE id = $1");
        sqlx::query_as::<_, Admin>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::DatabaseError)
    }
}
