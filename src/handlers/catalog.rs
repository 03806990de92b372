// src/handlers/catalog.rs

use axum::{extract::State, response::IntoResponse};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::{ApiError, AppError},
        response::{ApiResponse, Created},
    },
    config::AppState,
    db::catalog_repo::{CategoryChanges, LocationChanges, ProductChanges, ProductFilter},
    handlers::orders::validate_amount,
    middleware::{
        auth::AuthenticatedAdmin,
        extract::{ApiJson, ApiPath, ApiQuery},
        i18n::Locale,
        rbac::{RequireRole, SuperAdmin},
    },
    models::catalog::{Category, Location, LocationType, Product, ProductTranslations, Translations},
    services::eligibility::Decision,
};

// `null` explícito vira Some(None); campo ausente continua None
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// ---
// Payloads: Locais
// ---
#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateLocationPayload {
    #[serde(rename = "type")]
    pub location_type: LocationType,
    #[serde(default)]
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "pool")]
    pub name: String,
    #[serde(default)]
    pub translations: Translations,
    #[serde(default = "default_true")]
    pub available: bool,
    #[serde(default)]
    pub order: i32,
}

#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLocationPayload {
    #[serde(rename = "type")]
    pub location_type: Option<LocationType>,
    #[validate(length(min = 1, message = "required"))]
    pub name: Option<String>,
    pub translations: Option<Translations>,
    pub available: Option<bool>,
    pub order: Option<i32>,
}

fn default_true() -> bool {
    true
}

// ---
// Payloads: Categorias
// ---
#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryPayload {
    #[serde(default)]
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "light-lunch")]
    pub name: String,
    #[serde(default)]
    pub translations: Translations,
    #[serde(default)]
    pub order: i32,
    #[serde(alias = "order_deadline")]
    #[schema(example = "12:00")]
    pub order_deadline: Option<String>,
    #[serde(alias = "available_days")]
    pub available_days: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategoryPayload {
    #[validate(length(min = 1, message = "required"))]
    pub name: Option<String>,
    pub translations: Option<Translations>,
    pub order: Option<i32>,
    /// `null` remove o prazo.
    #[serde(default, alias = "order_deadline", deserialize_with = "double_option")]
    #[schema(value_type = Option<String>, example = "11:30")]
    pub order_deadline: Option<Option<String>>,
    /// `null` ou `[]` liberam todos os dias.
    #[serde(default, alias = "available_days", deserialize_with = "double_option")]
    #[schema(value_type = Option<Vec<String>>)]
    pub available_days: Option<Option<Vec<String>>>,
}

// ---
// Payloads: Produtos
// ---
#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductPayload {
    #[serde(default)]
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Spritz")]
    pub name: String,
    #[validate(custom(function = "validate_amount"))]
    #[schema(value_type = String, example = "7.00")]
    pub price: Decimal,
    pub category_id: Uuid,
    #[serde(default = "default_true")]
    pub available: bool,
    #[serde(default)]
    pub translations: ProductTranslations,
    #[serde(default)]
    pub pickup_required: bool,
}

#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductPayload {
    #[validate(length(min = 1, message = "required"))]
    pub name: Option<String>,
    #[validate(custom(function = "validate_amount"))]
    #[schema(value_type = Option<String>)]
    pub price: Option<Decimal>,
    pub category_id: Option<Uuid>,
    pub available: Option<bool>,
    pub translations: Option<ProductTranslations>,
    pub pickup_required: Option<bool>,
}

// ---
// Queries e respostas
// ---
#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AvailabilityQuery {
    pub available: Option<bool>,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductQuery {
    /// ID ou nome (slug) da categoria
    pub category: Option<String>,
    pub available: Option<bool>,
}

impl ProductQuery {
    pub fn to_filter(&self) -> ProductFilter {
        let mut filter = ProductFilter { available: self.available, ..Default::default() };
        if let Some(raw) = self.category.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            match raw.parse::<Uuid>() {
                Ok(id) => filter.category_id = Some(id),
                Err(_) => filter.category_name = Some(raw.to_lowercase()),
            }
        }
        filter
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryEligibilityResponse {
    pub category_id: Uuid,
    pub gated: bool,
    /// Vale para adicionar ao carrinho e para o checkout.
    pub checkout: Decision,
    /// Aviso exibido na vitrine (categorias com prazo também fecham antes das 09:00).
    pub display: Decision,
}

// =========================================================================
//  ROTAS PÚBLICAS
// =========================================================================

#[utoipa::path(
    get,
    path = "/api/locations",
    tag = "Catalog",
    params(AvailabilityQuery),
    responses((status = 200, description = "Locais de entrega", body = [Location]))
)]
pub async fn list_locations(
    State(app_state): State<AppState>,
    locale: Locale,
    ApiQuery(query): ApiQuery<AvailabilityQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let locations = app_state
        .catalog_service
        .list_locations(query.available)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(ApiResponse::ok(locations))
}

#[utoipa::path(
    get,
    path = "/api/categories",
    tag = "Catalog",
    responses((status = 200, description = "Categorias ordenadas", body = [Category]))
)]
pub async fn list_categories(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let categories = app_state
        .catalog_service
        .list_categories()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(ApiResponse::ok(categories))
}

#[utoipa::path(
    get,
    path = "/api/categories/{id}/eligibility",
    tag = "Catalog",
    params(("id" = Uuid, Path, description = "ID da categoria")),
    responses(
        (status = 200, description = "Pode pedir agora?", body = CategoryEligibilityResponse),
        (status = 404, description = "Categoria não encontrada")
    )
)]
pub async fn category_eligibility(
    State(app_state): State<AppState>,
    locale: Locale,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let result = app_state
        .catalog_service
        .category_eligibility(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let i18n = &app_state.i18n_store;
    Ok(ApiResponse::ok(CategoryEligibilityResponse {
        category_id: result.category.id,
        gated: result.gated,
        checkout: Decision::from_result(result.checkout, &locale.0, i18n),
        display: Decision::from_result(result.display, &locale.0, i18n),
    }))
}

#[utoipa::path(
    get,
    path = "/api/products",
    tag = "Catalog",
    params(ProductQuery),
    responses((status = 200, description = "Produtos", body = [Product]))
)]
pub async fn list_products(
    State(app_state): State<AppState>,
    locale: Locale,
    ApiQuery(query): ApiQuery<ProductQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let products = app_state
        .catalog_service
        .list_products(&query.to_filter())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(ApiResponse::ok(products))
}

// =========================================================================
//  ROTAS DO PAINEL
// =========================================================================

#[utoipa::path(
    post,
    path = "/api/admin/locations",
    tag = "Admin Catalog",
    request_body = CreateLocationPayload,
    responses(
        (status = 201, description = "Local criado", body = Location),
        (status = 403, description = "Exige super-admin"),
        (status = 409, description = "Nome já existe")
    ),
    security(("admin_cookie" = []), ("api_jwt" = []))
)]
pub async fn create_location(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<SuperAdmin>,
    ApiJson(payload): ApiJson<CreateLocationPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let location = app_state
        .catalog_service
        .create_location(
            payload.location_type,
            &payload.name,
            &payload.translations,
            payload.available,
            payload.order,
        )
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Created(location))
}

#[utoipa::path(
    patch,
    path = "/api/admin/locations/{id}",
    tag = "Admin Catalog",
    params(("id" = Uuid, Path, description = "ID do local")),
    request_body = UpdateLocationPayload,
    responses((status = 200, description = "Local atualizado", body = Location)),
    security(("admin_cookie" = []), ("api_jwt" = []))
)]
pub async fn update_location(
    State(app_state): State<AppState>,
    locale: Locale,
    _admin: AuthenticatedAdmin,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateLocationPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let changes = LocationChanges {
        location_type: payload.location_type,
        name: payload.name,
        translations: payload.translations,
        available: payload.available,
        order: payload.order,
    };
    let location = app_state
        .catalog_service
        .update_location(id, changes)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(ApiResponse::ok(location))
}

#[utoipa::path(
    post,
    path = "/api/admin/categories",
    tag = "Admin Catalog",
    request_body = CreateCategoryPayload,
    responses(
        (status = 201, description = "Categoria criada", body = Category),
        (status = 400, description = "Prazo ou dias inválidos"),
        (status = 403, description = "Exige super-admin")
    ),
    security(("admin_cookie" = []), ("api_jwt" = []))
)]
pub async fn create_category(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<SuperAdmin>,
    ApiJson(payload): ApiJson<CreateCategoryPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let category = app_state
        .catalog_service
        .create_category(
            &payload.name,
            &payload.translations,
            payload.order,
            payload.order_deadline.as_deref(),
            payload.available_days.as_deref(),
        )
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Created(category))
}

#[utoipa::path(
    patch,
    path = "/api/admin/categories/{id}",
    tag = "Admin Catalog",
    params(("id" = Uuid, Path, description = "ID da categoria")),
    request_body = UpdateCategoryPayload,
    responses(
        (status = 200, description = "Categoria atualizada", body = Category),
        (status = 400, description = "Prazo ou dias inválidos")
    ),
    security(("admin_cookie" = []), ("api_jwt" = []))
)]
pub async fn update_category(
    State(app_state): State<AppState>,
    locale: Locale,
    _admin: AuthenticatedAdmin,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateCategoryPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let changes = CategoryChanges {
        name: payload.name,
        translations: payload.translations,
        order: payload.order,
        order_deadline: payload.order_deadline,
        available_days: payload.available_days,
    };
    let category = app_state
        .catalog_service
        .update_category(id, changes)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(ApiResponse::ok(category))
}

#[utoipa::path(
    post,
    path = "/api/admin/products",
    tag = "Admin Catalog",
    request_body = CreateProductPayload,
    responses(
        (status = 201, description = "Produto criado", body = Product),
        (status = 403, description = "Exige super-admin"),
        (status = 404, description = "Categoria inexistente")
    ),
    security(("admin_cookie" = []), ("api_jwt" = []))
)]
pub async fn create_product(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<SuperAdmin>,
    ApiJson(payload): ApiJson<CreateProductPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let product = app_state
        .catalog_service
        .create_product(
            &payload.name,
            payload.price,
            payload.category_id,
            payload.available,
            &payload.translations,
            payload.pickup_required,
        )
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Created(product))
}

#[utoipa::path(
    patch,
    path = "/api/admin/products/{id}",
    tag = "Admin Catalog",
    params(("id" = Uuid, Path, description = "ID do produto")),
    request_body = UpdateProductPayload,
    responses((status = 200, description = "Produto atualizado", body = Product)),
    security(("admin_cookie" = []), ("api_jwt" = []))
)]
pub async fn update_product(
    State(app_state): State<AppState>,
    locale: Locale,
    _admin: AuthenticatedAdmin,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateProductPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let changes = ProductChanges {
        name: payload.name,
        price: payload.price,
        category_id: payload.category_id,
        available: payload.available,
        translations: payload.translations,
        pickup_required: payload.pickup_required,
    };
    let product = app_state
        .catalog_service
        .update_product(id, changes)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(ApiResponse::ok(product))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn category_patch_distinguishes_null_from_absent() {
        let cleared: UpdateCategoryPayload =
            serde_json::from_value(json!({ "orderDeadline": null })).expect("payload");
        assert_eq!(cleared.order_deadline, Some(None));
        assert_eq!(cleared.available_days, None);

        let untouched: UpdateCategoryPayload =
            serde_json::from_value(json!({ "name": "light-lunch" })).expect("payload");
        assert_eq!(untouched.order_deadline, None);
    }

    #[test]
    fn category_patch_accepts_snake_case_fields() {
        let payload: UpdateCategoryPayload = serde_json::from_value(json!({
            "order_deadline": "11:30",
            "available_days": ["monday", "friday"]
        }))
        .expect("payload");

        assert_eq!(payload.order_deadline, Some(Some("11:30".to_string())));
        assert_eq!(
            payload.available_days,
            Some(Some(vec!["monday".to_string(), "friday".to_string()]))
        );
    }

    #[test]
    fn product_query_accepts_id_or_slug() {
        let id = Uuid::new_v4();
        let by_id = ProductQuery { category: Some(id.to_string()), available: None }.to_filter();
        assert_eq!(by_id.category_id, Some(id));

        let by_name = ProductQuery { category: Some("Light-Lunch".into()), available: Some(true) }.to_filter();
        assert_eq!(by_name.category_name.as_deref(), Some("light-lunch"));
        assert_eq!(by_name.available, Some(true));
    }

    #[test]
    fn negative_product_price_fails_validation() {
        let payload: CreateProductPayload = serde_json::from_value(json!({
            "name": "Spritz",
            "price": -1.0,
            "categoryId": Uuid::new_v4()
        }))
        .expect("payload");
        assert!(payload.validate().is_err());
        assert!(payload.available);
    }
}
