// src/handlers/orders.rs
//
// Rotas públicas de pedido: o cliente cria e acompanha, o staff conclui pelo link.

use axum::{extract::State, response::IntoResponse};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    common::{
        error::{ApiError, AppError},
        response::{ApiResponse, Created},
        time::parse_hhmm,
    },
    config::AppState,
    middleware::{
        extract::{ApiJson, ApiPath, ApiQuery},
        i18n::Locale,
    },
    models::order::{check_amount, NewOrder, OrderLine, OrderSummary},
    services::eligibility::Decision,
};

// ---
// Validação Customizada
// ---
/// Preço em euro: não negativo, até centavos, dentro de `NUMERIC(10, 2)`.
pub(crate) fn validate_amount(val: &Decimal) -> Result<(), ValidationError> {
    check_amount(*val).map_err(|issue| {
        let mut err = ValidationError::new("range");
        err.message = Some(issue.code().into());
        err
    })
}

pub(crate) fn validate_pickup_time(val: &str) -> Result<(), ValidationError> {
    if parse_hhmm(val.trim()).is_none() {
        let mut err = ValidationError::new("pickup_time");
        err.message = Some("deadline_format".into());
        return Err(err);
    }
    Ok(())
}

// ---
// Payloads
// ---
#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderLinePayload {
    #[serde(default)]
    #[validate(length(min = 1, message = "required"))]
    pub product_id: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Spritz")]
    pub name: String,

    #[validate(custom(function = "validate_amount"))]
    #[schema(value_type = String, example = "7.00")]
    pub price: Decimal,

    #[validate(range(min = 1, message = "range"))]
    #[schema(example = 2)]
    pub quantity: u32,
}

#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderPayload {
    #[serde(default)]
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Mario Rossi")]
    pub customer_name: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "pool")]
    pub location: String,

    #[schema(example = "Ombrellone 12")]
    pub location_detail: Option<String>,

    // Lista vazia vira `EmptyOrder` no serviço
    #[serde(default)]
    #[validate(nested)]
    pub items: Vec<OrderLinePayload>,

    /// Ignorado: o total é sempre recalculado no servidor.
    #[schema(value_type = Option<String>)]
    pub total: Option<Decimal>,

    pub notes: Option<String>,

    #[validate(custom(function = "validate_pickup_time"))]
    #[schema(example = "12:30")]
    pub pickup_time: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl From<CreateOrderPayload> for NewOrder {
    fn from(payload: CreateOrderPayload) -> Self {
        NewOrder {
            customer_name: payload.customer_name,
            location: payload.location,
            location_detail: non_blank(payload.location_detail),
            items: payload
                .items
                .into_iter()
                .map(|line| OrderLine {
                    product_id: line.product_id,
                    name: line.name,
                    price: line.price,
                    quantity: line.quantity,
                })
                .collect(),
            notes: non_blank(payload.notes),
            pickup_time: non_blank(payload.pickup_time),
        }
    }
}

#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutEligibilityPayload {
    #[serde(default)]
    #[validate(length(min = 1, message = "required"))]
    pub product_ids: Vec<Uuid>,
    pub pickup_time: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct CompleteLinkQuery {
    #[serde(default)]
    pub token: String,
}

// ---
// Handlers
// ---

#[utoipa::path(
    post,
    path = "/api/orders",
    tag = "Orders",
    request_body = CreateOrderPayload,
    responses(
        (status = 201, description = "Pedido criado em 'waiting'", body = OrderSummary),
        (status = 400, description = "Dados inválidos ou pedido vazio")
    )
)]
pub async fn create_order(
    State(app_state): State<AppState>,
    locale: Locale,
    ApiJson(payload): ApiJson<CreateOrderPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let order = app_state
        .order_service
        .create_order(payload.into())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Created(OrderSummary::from(&order)))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    tag = "Orders",
    params(("id" = Uuid, Path, description = "ID do pedido")),
    responses(
        (status = 200, description = "Status atual do pedido", body = OrderSummary),
        (status = 404, description = "Pedido não encontrado")
    )
)]
pub async fn get_order_status(
    State(app_state): State<AppState>,
    locale: Locale,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let order = app_state
        .order_service
        .get_order(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(ApiResponse::ok(OrderSummary::from(&order)))
}

#[utoipa::path(
    post,
    path = "/api/orders/eligibility",
    tag = "Orders",
    request_body = CheckoutEligibilityPayload,
    responses(
        (status = 200, description = "Decisão de checkout no horário do servidor", body = Decision),
        (status = 404, description = "Produto inexistente")
    )
)]
pub async fn check_eligibility(
    State(app_state): State<AppState>,
    locale: Locale,
    ApiJson(payload): ApiJson<CheckoutEligibilityPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let result = app_state
        .order_service
        .precheck_checkout(&payload.product_ids, payload.pickup_time.as_deref())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(ApiResponse::ok(Decision::from_result(result, &locale.0, &app_state.i18n_store)))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}/complete",
    tag = "Orders",
    params(
        ("id" = Uuid, Path, description = "ID do pedido"),
        CompleteLinkQuery
    ),
    responses(
        (status = 200, description = "Pedido concluído", body = OrderSummary),
        (status = 400, description = "Pedido já encerrado"),
        (status = 401, description = "Link inválido ou expirado")
    )
)]
pub async fn complete_via_link(
    State(app_state): State<AppState>,
    locale: Locale,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<CompleteLinkQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let order = app_state
        .order_service
        .complete_via_link(id, &query.token)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(ApiResponse::ok(OrderSummary::from(&order)))
}
