// src/db/catalog_repo.rs

use rust_decimal::Decimal;
use sqlx::{types::Json, Executor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::catalog::{Category, Location, LocationType, Product, ProductTranslations, Translations},
};

const LOCATION_COLUMNS: &str =
    "id, location_type, name, translations, available, sort_order, created_at, updated_at";
const CATEGORY_COLUMNS: &str =
    "id, name, translations, sort_order, order_deadline, available_days, created_at, updated_at";
const PRODUCT_COLUMNS: &str =
    "id, name, price, category_id, available, translations, pickup_required, created_at, updated_at";

// Campos opcionais de atualização: `None` mantém o valor atual.
#[derive(Debug, Default)]
pub struct LocationChanges {
    pub location_type: Option<LocationType>,
    pub name: Option<String>,
    pub translations: Option<Translations>,
    pub available: Option<bool>,
    pub order: Option<i32>,
}

#[derive(Debug, Default)]
pub struct CategoryChanges {
    pub name: Option<String>,
    pub translations: Option<Translations>,
    pub order: Option<i32>,
    // Option<Option<_>>: Some(None) limpa o campo
    pub order_deadline: Option<Option<String>>,
    pub available_days: Option<Option<Vec<String>>>,
}

#[derive(Debug, Default)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub category_id: Option<Uuid>,
    pub available: Option<bool>,
    pub translations: Option<ProductTranslations>,
    pub pickup_required: Option<bool>,
}

#[derive(Debug, Default)]
pub struct ProductFilter {
    pub category_id: Option<Uuid>,
    pub category_name: Option<String>,
    pub available: Option<bool>,
}

#[derive(Clone)]
pub struct CatalogRepository {
    pool: PgPool,
}

fn map_unique(e: sqlx::Error, resource: &str) -> AppError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            return AppError::Conflict(resource.to_string());
        }
        if db_err.is_foreign_key_violation() {
            return AppError::ResourceNotFound("Category".into());
        }
    }
    AppError::DatabaseError(e)
}

impl CatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // =========================================================================
    //  LOCAIS
    // =========================================================================

    pub async fn list_locations(&self, only_available: Option<bool>) -> Result<Vec<Location>, AppError> {
        let mut query = QueryBuilder::<Postgres>::new(format!("SELECT {LOCATION_COLUMNS} FROM locations"));
        if let Some(available) = only_available {
            query.push(" WHERE available = ").push_bind(available);
        }
        query.push(" ORDER BY sort_order ASC, name ASC");

        let locations = query.build_query_as::<Location>().fetch_all(&self.pool).await?;
        Ok(locations)
    }

    pub async fn create_location(
        &self,
        location_type: LocationType,
        name: &str,
        translations: &Translations,
        available: bool,
        order: i32,
    ) -> Result<Location, AppError> {
        let sql = format!(
            r#"
            INSERT INTO locations (location_type, name, translations, available, sort_order)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {LOCATION_COLUMNS}
            "#
        );
        sqlx::query_as::<_, Location>(&sql)
            .bind(location_type)
            .bind(name)
            .bind(Json(translations))
            .bind(available)
            .bind(order)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_unique(e, "Location"))
    }

    pub async fn update_location(&self, id: Uuid, changes: LocationChanges) -> Result<Location, AppError> {
        let sql = format!(
            r#"
            UPDATE locations SET
                location_type = COALESCE($2, location_type),
                name          = COALESCE($3, name),
                translations  = COALESCE($4, translations),
                available     = COALESCE($5, available),
                sort_order    = COALESCE($6, sort_order),
                updated_at    = NOW()
            WHERE id = $1
            RETURNING {LOCATION_COLUMNS}
            "#
        );
        sqlx::query_as::<_, Location>(&sql)
            .bind(id)
            .bind(changes.location_type)
            .bind(changes.name)
            .bind(changes.translations.map(Json))
            .bind(changes.available)
            .bind(changes.order)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_unique(e, "Location"))?
            .ok_or_else(|| AppError::ResourceNotFound("Location".into()))
    }

    // =========================================================================
    //  CATEGORIAS
    // =========================================================================

    pub async fn list_categories(&self) -> Result<Vec<Category>, AppError> {
        let sql = format!("SELECT {CATEGORY_COLUMNS} FROM categories ORDER BY sort_order ASC, name ASC");
        let categories = sqlx::query_as::<_, Category>(&sql).fetch_all(&self.pool).await?;
        Ok(categories)
    }

    pub async fn find_category<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Category>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = $1");
        let category = sqlx::query_as::<_, Category>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(category)
    }

    pub async fn find_categories_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Category>, AppError> {
        let sql = format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = ANY($1)");
        let categories = sqlx::query_as::<_, Category>(&sql)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(categories)
    }

    pub async fn create_category(
        &self,
        name: &str,
        translations: &Translations,
        order: i32,
        order_deadline: Option<&str>,
        available_days: Option<&[String]>,
    ) -> Result<Category, AppError> {
        let sql = format!(
            r#"
            INSERT INTO categories (name, translations, sort_order, order_deadline, available_days)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {CATEGORY_COLUMNS}
            "#
        );
        sqlx::query_as::<_, Category>(&sql)
            .bind(name)
            .bind(Json(translations))
            .bind(order)
            .bind(order_deadline)
            .bind(available_days)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_unique(e, "Category"))
    }

    pub async fn update_category(&self, id: Uuid, changes: CategoryChanges) -> Result<Category, AppError> {
        // $5/$7 dizem se o campo anulável foi enviado; sem isso não há como limpar
        let sql = format!(
            r#"
            UPDATE categories SET
                name           = COALESCE($2, name),
                translations   = COALESCE($3, translations),
                sort_order     = COALESCE($4, sort_order),
                order_deadline = CASE WHEN $5 THEN $6 ELSE order_deadline END,
                available_days = CASE WHEN $7 THEN $8 ELSE available_days END,
                updated_at     = NOW()
            WHERE id = $1
            RETURNING {CATEGORY_COLUMNS}
            "#
        );
        let deadline_sent = changes.order_deadline.is_some();
        let days_sent = changes.available_days.is_some();

        sqlx::query_as::<_, Category>(&sql)
            .bind(id)
            .bind(changes.name)
            .bind(changes.translations.map(Json))
            .bind(changes.order)
            .bind(deadline_sent)
            .bind(changes.order_deadline.flatten())
            .bind(days_sent)
            .bind(changes.available_days.flatten())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_unique(e, "Category"))?
            .ok_or_else(|| AppError::ResourceNotFound("Category".into()))
    }

    // =========================================================================
    //  PRODUTOS
    // =========================================================================

    pub async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, AppError> {
        let columns = PRODUCT_COLUMNS
            .split(", ")
            .map(|c| format!("p.{c}"))
            .collect::<Vec<_>>()
            .join(", ");
        let mut query = QueryBuilder::<Postgres>::new(format!(
            "SELECT {columns} FROM products p JOIN categories c ON c.id = p.category_id WHERE TRUE"
        ));

        if let Some(category_id) = filter.category_id {
            query.push(" AND p.category_id = ").push_bind(category_id);
        }
        if let Some(name) = &filter.category_name {
            query.push(" AND c.name = ").push_bind(name.clone());
        }
        if let Some(available) = filter.available {
            query.push(" AND p.available = ").push_bind(available);
        }
        query.push(" ORDER BY c.sort_order ASC, p.name ASC");

        let products = query.build_query_as::<Product>().fetch_all(&self.pool).await?;
        Ok(products)
    }

    pub async fn find_products_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Product>, AppError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ANY($1)");
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(products)
    }

    pub async fn create_product(
        &self,
        name: &str,
        price: Decimal,
        category_id: Uuid,
        available: bool,
        translations: &ProductTranslations,
        pickup_required: bool,
    ) -> Result<Product, AppError> {
        let sql = format!(
            r#"
            INSERT INTO products (name, price, category_id, available, translations, pickup_required)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {PRODUCT_COLUMNS}
            "#
        );
        sqlx::query_as::<_, Product>(&sql)
            .bind(name)
            .bind(price)
            .bind(category_id)
            .bind(available)
            .bind(Json(translations))
            .bind(pickup_required)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_unique(e, "Product"))
    }

    pub async fn update_product(&self, id: Uuid, changes: ProductChanges) -> Result<Product, AppError> {
        let sql = format!(
            r#"
            UPDATE products SET
                name            = COALESCE($2, name),
                price           = COALESCE($3, price),
                category_id     = COALESCE($4, category_id),
                available       = COALESCE($5, available),
                translations    = COALESCE($6, translations),
                pickup_required = COALESCE($7, pickup_required),
                updated_at      = NOW()
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "#
        );
        sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .bind(changes.name)
            .bind(changes.price)
            .bind(changes.category_id)
            .bind(changes.available)
            .bind(changes.translations.map(Json))
            .bind(changes.pickup_required)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_unique(e, "Product"))?
            .ok_or_else(|| AppError::ResourceNotFound("Product".into()))
    }
}
