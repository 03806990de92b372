//! Lado cliente da API: carrinho do hóspede e painel do staff.
//!
//! O carrinho reavalia a elegibilidade no momento de cada escrita (adicionar,
//! fechar o pedido). O painel mantém a lista de pedidos atualizada por polling
//! e trava o botão de status de cada pedido enquanto a mudança está em voo.

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::order::{Order, OrderStatus, StatusFilter};

pub mod admin_sync;
pub mod cart;
pub mod http;

pub use admin_sync::{AdminBoard, AdminSync};
pub use cart::{Cart, CheckoutDetails, CreateOrderRequest};
pub use http::ApiClient;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Sessão ausente ou expirada (HTTP 401).
    #[error("Sessão inválida")]
    Unauthorized,

    #[error("Pedido {0} já está sendo atualizado")]
    AlreadyUpdating(Uuid),

    #[error("Requisição recusada ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Falha de rede: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Resposta inesperada: {0}")]
    Decode(String),
}

/// Abas do painel de pedidos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Waiting,
    Processing,
    All,
}

impl Tab {
    pub fn filter(&self) -> StatusFilter {
        match self {
            Tab::Waiting => StatusFilter::Only(OrderStatus::Waiting),
            Tab::Processing => StatusFilter::Only(OrderStatus::Processing),
            Tab::All => StatusFilter::All,
        }
    }
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.filter())
    }
}

/// Fonte dos pedidos do painel. `ApiClient` fala com o servidor; os testes
/// usam implementações em memória.
#[async_trait]
pub trait OrderFeed: Send + Sync + 'static {
    async fn fetch_orders(&self, tab: Tab) -> Result<Vec<Order>, ClientError>;

    async fn update_status(&self, id: Uuid, status: OrderStatus) -> Result<Order, ClientError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tabs_map_to_list_filters() {
        assert_eq!(Tab::Waiting.to_string(), "waiting");
        assert_eq!(Tab::Processing.to_string(), "processing");
        assert_eq!(Tab::All.to_string(), "all");
        assert_eq!(Tab::All.filter().as_status(), None);
    }
}
