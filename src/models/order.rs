// src/models/order.rs

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use uuid::Uuid;
use utoipa::ToSchema;

use crate::common::error::AppError;

// --- Status do pedido ---
//
// waiting -> processing -> completed
//    \            \
//     +------------+-> cancelled
//
// completed e cancelled são terminais.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "order_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Waiting,
    Processing,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Waiting,
        OrderStatus::Processing,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Waiting => "waiting",
            OrderStatus::Processing => "processing",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    /// Destinos permitidos a partir deste status.
    pub fn allowed_next(&self) -> &'static [OrderStatus] {
        match self {
            OrderStatus::Waiting => &[OrderStatus::Processing, OrderStatus::Cancelled],
            OrderStatus::Processing => &[OrderStatus::Completed, OrderStatus::Cancelled],
            OrderStatus::Completed | OrderStatus::Cancelled => &[],
        }
    }

    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        self.allowed_next().contains(&next)
    }

    /// Valida a transição, devolvendo o erro de domínio quando ilegal.
    pub fn transition_to(self, next: OrderStatus) -> Result<OrderStatus, AppError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(AppError::InvalidTransition { from: self, to: next })
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|s| s.as_str() == value)
            .ok_or_else(|| AppError::InvalidStatus(value.to_string()))
    }
}

/// Filtro da lista do painel: um status específico ou todos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(OrderStatus),
}

impl StatusFilter {
    pub fn as_status(&self) -> Option<OrderStatus> {
        match self {
            StatusFilter::All => None,
            StatusFilter::Only(s) => Some(*s),
        }
    }
}

impl FromStr for StatusFilter {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "" | "all" => Ok(StatusFilter::All),
            other => other.parse().map(StatusFilter::Only),
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusFilter::All => f.write_str("all"),
            StatusFilter::Only(s) => f.write_str(s.as_str()),
        }
    }
}

// --- Pedido ---

/// Linha do pedido, guardada como snapshot (nome e preço do momento da compra).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: String,
    #[schema(example = "Spritz")]
    pub name: String,
    #[schema(example = "7.00")]
    pub price: Decimal,
    #[schema(example = 2)]
    pub quantity: u32,
}

// --- Valores monetários ---

/// Problema de um valor frente às colunas `NUMERIC(10, 2)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountIssue {
    Negative,
    TooPrecise,
    TooLarge,
}

impl AmountIssue {
    /// Chave de mensagem em `validation.*`.
    pub fn code(&self) -> &'static str {
        match self {
            AmountIssue::Negative => "not_negative",
            AmountIssue::TooPrecise => "amount_scale",
            AmountIssue::TooLarge => "amount_too_large",
        }
    }
}

/// Maior valor que cabe em `NUMERIC(10, 2)`.
pub fn max_amount() -> Decimal {
    Decimal::new(9_999_999_999, 2)
}

pub fn check_amount(value: Decimal) -> Result<(), AmountIssue> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(AmountIssue::Negative);
    }
    // "7.00000" é aceito, "7.005" não
    if value.normalize().scale() > 2 {
        return Err(AmountIssue::TooPrecise);
    }
    if value > max_amount() {
        return Err(AmountIssue::TooLarge);
    }
    Ok(())
}

impl OrderLine {
    /// `None` em overflow.
    pub fn subtotal(&self) -> Option<Decimal> {
        self.price.checked_mul(Decimal::from(self.quantity))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    #[schema(example = "20250617003")]
    pub order_number: String,
    #[schema(example = "Mario Rossi")]
    pub customer_name: String,
    #[schema(example = "pool")]
    pub location: String,
    #[schema(example = "Ombrellone 12")]
    pub location_detail: Option<String>,
    #[schema(value_type = Vec<OrderLine>)]
    pub items: Json<Vec<OrderLine>>,
    #[schema(example = "14.00")]
    pub total: Decimal,
    pub status: OrderStatus,
    pub notes: Option<String>,
    #[schema(example = "12:30")]
    pub pickup_time: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Projeção pública usada no acompanhamento do pedido pelo cliente.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub id: Uuid,
    pub order_number: String,
    pub status: OrderStatus,
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Order> for OrderSummary {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id,
            order_number: order.order_number.clone(),
            status: order.status,
            total: order.total,
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

/// Dados validados para gravar um pedido novo. O total é sempre recalculado.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer_name: String,
    pub location: String,
    pub location_detail: Option<String>,
    pub items: Vec<OrderLine>,
    pub notes: Option<String>,
    pub pickup_time: Option<String>,
}

impl NewOrder {
    /// Σ preço × quantidade. Falha se estoura o Decimal ou a coluna do total.
    pub fn total(&self) -> Result<Decimal, AppError> {
        let total = self
            .items
            .iter()
            .try_fold(Decimal::ZERO, |acc, line| line.subtotal().and_then(|s| acc.checked_add(s)))
            .ok_or_else(|| AppError::BadRequest("total".into()))?;

        if total > max_amount() {
            return Err(AppError::BadRequest("total".into()));
        }
        Ok(total)
    }
}
