// src/handlers/admin_orders.rs

use axum::{extract::State, response::IntoResponse};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    common::{
        error::{ApiError, AppError},
        response::ApiResponse,
        time::parse_date,
    },
    config::AppState,
    middleware::{
        auth::AuthenticatedAdmin,
        extract::{ApiJson, ApiPath, ApiQuery},
        i18n::Locale,
    },
    models::order::{Order, StatusFilter},
};

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct OrderListQuery {
    /// waiting | processing | completed | cancelled | all
    pub status: Option<String>,
    /// YYYY-MM-DD, inclusivo
    pub start_date: Option<String>,
    /// YYYY-MM-DD, inclusivo
    pub end_date: Option<String>,
}

pub struct ParsedListQuery {
    pub status: StatusFilter,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

fn parse_optional_date(value: Option<&str>, field: &str) -> Result<Option<NaiveDate>, AppError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(raw) => parse_date(raw)
            .map(Some)
            .ok_or_else(|| AppError::BadRequest(format!("{field}={raw}"))),
        None => Ok(None),
    }
}

impl OrderListQuery {
    pub fn parse(&self) -> Result<ParsedListQuery, AppError> {
        Ok(ParsedListQuery {
            status: self.status.as_deref().unwrap_or_default().trim().parse()?,
            start_date: parse_optional_date(self.start_date.as_deref(), "startDate")?,
            end_date: parse_optional_date(self.end_date.as_deref(), "endDate")?,
        })
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateStatusPayload {
    #[serde(default)]
    #[schema(example = "processing")]
    pub status: String,
}

#[utoipa::path(
    get,
    path = "/api/admin/orders",
    tag = "Admin Orders",
    params(OrderListQuery),
    responses(
        (status = 200, description = "Pedidos, mais recentes primeiro", body = [Order]),
        (status = 400, description = "Filtro inválido"),
        (status = 401, description = "Sessão ausente ou expirada")
    ),
    security(("admin_cookie" = []), ("api_jwt" = []))
)]
pub async fn list_orders(
    State(app_state): State<AppState>,
    locale: Locale,
    _admin: AuthenticatedAdmin,
    ApiQuery(query): ApiQuery<OrderListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let parsed = query
        .parse()
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let orders = app_state
        .order_service
        .list_orders(parsed.status, parsed.start_date, parsed.end_date)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(ApiResponse::ok(orders))
}

#[utoipa::path(
    get,
    path = "/api/admin/orders/{id}",
    tag = "Admin Orders",
    params(("id" = Uuid, Path, description = "ID do pedido")),
    responses(
        (status = 200, description = "Pedido completo", body = Order),
        (status = 404, description = "Pedido não encontrado")
    ),
    security(("admin_cookie" = []), ("api_jwt" = []))
)]
pub async fn get_order(
    State(app_state): State<AppState>,
    locale: Locale,
    _admin: AuthenticatedAdmin,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let order = app_state
        .order_service
        .get_order(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(ApiResponse::ok(order))
}

// PATCH /api/admin/orders/{id} e PUT /api/admin/orders/{id}/status
#[utoipa::path(
    put,
    path = "/api/admin/orders/{id}/status",
    tag = "Admin Orders",
    params(("id" = Uuid, Path, description = "ID do pedido")),
    request_body = UpdateStatusPayload,
    responses(
        (status = 200, description = "Status atualizado", body = Order),
        (status = 400, description = "Status desconhecido ou transição não permitida"),
        (status = 404, description = "Pedido não encontrado")
    ),
    security(("admin_cookie" = []), ("api_jwt" = []))
)]
pub async fn update_order_status(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedAdmin(admin): AuthenticatedAdmin,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateStatusPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let order = app_state
        .order_service
        .update_status(id, payload.status.trim())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    tracing::debug!(username = %admin.username, order_number = %order.order_number, "Status alterado pelo painel");
    Ok(ApiResponse::ok(order))
}
