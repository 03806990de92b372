// src/client/cart.rs

use std::collections::HashMap;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    models::{
        catalog::{Category, Product},
        order::{max_amount, OrderLine},
    },
    services::eligibility::{self, Rejection},
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    #[error("Carrinho vazio")]
    EmptyCart,
    #[error("Pedido recusado: {0:?}")]
    Rejected(Rejection),
    #[error("Total acima do permitido")]
    TotalTooLarge,
}

impl From<Rejection> for CheckoutError {
    fn from(rejection: Rejection) -> Self {
        CheckoutError::Rejected(rejection)
    }
}

#[derive(Debug, Clone)]
pub struct CartLine {
    pub product: Product,
    pub quantity: u32,
}

/// Dados do hóspede digitados no checkout.
#[derive(Debug, Clone, Default)]
pub struct CheckoutDetails {
    pub customer_name: String,
    pub location: String,
    pub location_detail: Option<String>,
    pub notes: Option<String>,
    pub pickup_time: Option<String>,
}

/// Corpo do `POST /api/orders`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub customer_name: String,
    pub location: String,
    pub location_detail: Option<String>,
    pub items: Vec<OrderLine>,
    pub total: Decimal,
    pub notes: Option<String>,
    pub pickup_time: Option<String>,
}

/// Carrinho da sessão do hóspede. As categorias ficam em cache depois da
/// primeira busca; a decisão de horário é refeita a cada escrita.
#[derive(Debug, Default)]
pub struct Cart {
    lines: Vec<CartLine>,
    categories: HashMap<Uuid, Category>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_categories(categories: impl IntoIterator<Item = Category>) -> Self {
        Self {
            lines: Vec::new(),
            categories: categories.into_iter().map(|c| (c.id, c)).collect(),
        }
    }

    pub fn category(&self, id: Uuid) -> Option<&Category> {
        self.categories.get(&id)
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// `None` se a soma estoura ou não cabe no total do pedido.
    pub fn total(&self) -> Option<Decimal> {
        self.lines
            .iter()
            .try_fold(Decimal::ZERO, |acc, l| {
                l.product.price.checked_mul(Decimal::from(l.quantity)).and_then(|s| acc.checked_add(s))
            })
            .filter(|total| *total <= max_amount())
    }

    /// Recusa deixa o carrinho como estava.
    pub fn add(
        &mut self,
        product: &Product,
        category: &Category,
        quantity: u32,
        now: NaiveDateTime,
    ) -> Result<(), Rejection> {
        eligibility::check_product(now, product, category)?;

        self.categories.entry(category.id).or_insert_with(|| category.clone());
        match self.lines.iter_mut().find(|l| l.product.id == product.id) {
            Some(line) => line.quantity += quantity.max(1),
            None => self.lines.push(CartLine { product: product.clone(), quantity: quantity.max(1) }),
        }
        Ok(())
    }

    /// Quantidade zero remove a linha.
    pub fn set_quantity(&mut self, product_id: Uuid, quantity: u32) {
        if quantity == 0 {
            self.remove(product_id);
        } else if let Some(line) = self.lines.iter_mut().find(|l| l.product.id == product_id) {
            line.quantity = quantity;
        }
    }

    pub fn remove(&mut self, product_id: Uuid) {
        self.lines.retain(|l| l.product.id != product_id);
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Reavalia todas as linhas agora e monta o pedido.
    pub fn checkout(
        &self,
        now: NaiveDateTime,
        details: CheckoutDetails,
    ) -> Result<CreateOrderRequest, CheckoutError> {
        if self.lines.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let mut evaluated = Vec::with_capacity(self.lines.len());
        for line in &self.lines {
            // Categoria some do cache só se o catálogo mudou: trata como indisponível
            let category = self
                .categories
                .get(&line.product.category_id)
                .ok_or(Rejection::ProductUnavailable)?;
            evaluated.push((&line.product, category));
        }
        eligibility::check_checkout(now, &evaluated, details.pickup_time.as_deref())?;
        let total = self.total().ok_or(CheckoutError::TotalTooLarge)?;

        let items = self
            .lines
            .iter()
            .map(|l| OrderLine {
                product_id: l.product.id.to_string(),
                name: l.product.name.clone(),
                price: l.product.price,
                quantity: l.quantity,
            })
            .collect();

        Ok(CreateOrderRequest {
            customer_name: details.customer_name.trim().to_string(),
            location: details.location.trim().to_string(),
            location_detail: details.location_detail,
            items,
            total,
            notes: details.notes,
            pickup_time: details.pickup_time,
        })
    }
}
