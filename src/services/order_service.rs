// src/services/order_service.rs

use std::collections::HashMap;

use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{error::AppError, time::BusinessClock},
    db::{order_repo::OrderListFilter, CatalogRepository, OrderRepository},
    models::order::{check_amount, NewOrder, Order, OrderStatus, StatusFilter},
    services::{
        auth::TokenService,
        eligibility::{self, Rejection},
        notification::{Notifier, OrderEvent, OrderNotice},
        numbering,
    },
};

/// Regras de entrada do pedido que o `validator` não cobre (depois do trim).
pub fn validate_new_order(order: &NewOrder) -> Result<(), AppError> {
    if order.items.is_empty() {
        return Err(AppError::EmptyOrder);
    }
    if order.customer_name.trim().is_empty() {
        return Err(AppError::BadRequest("customerName".into()));
    }
    if order.location.trim().is_empty() {
        return Err(AppError::BadRequest("location".into()));
    }
    for line in &order.items {
        if line.quantity < 1 {
            return Err(AppError::BadRequest(format!("quantity of '{}'", line.name)));
        }
        if let Err(issue) = check_amount(line.price) {
            return Err(AppError::BadRequest(format!("price of '{}' ({})", line.name, issue.code())));
        }
    }
    order.total().map(|_| ())
}

/// Passos para levar um pedido até `completed` respeitando a tabela de transições.
pub fn completion_path(from: OrderStatus) -> Result<Vec<OrderStatus>, AppError> {
    match from {
        OrderStatus::Waiting => Ok(vec![OrderStatus::Processing, OrderStatus::Completed]),
        OrderStatus::Processing => Ok(vec![OrderStatus::Completed]),
        other => Err(AppError::InvalidTransition { from: other, to: OrderStatus::Completed }),
    }
}

/// Aplica os passos em ordem; o primeiro passo ilegal aborta tudo.
pub fn walk_transitions(from: OrderStatus, steps: Vec<OrderStatus>) -> Result<OrderStatus, AppError> {
    steps.into_iter().try_fold(from, |current, step| current.transition_to(step))
}

#[derive(Clone)]
pub struct OrderService {
    pool: PgPool,
    repo: OrderRepository,
    catalog_repo: CatalogRepository,
    notifier: Notifier,
    tokens: TokenService,
    clock: BusinessClock,
    public_base_url: String,
}

impl OrderService {
    pub fn new(
        pool: PgPool,
        repo: OrderRepository,
        catalog_repo: CatalogRepository,
        notifier: Notifier,
        tokens: TokenService,
        clock: BusinessClock,
        public_base_url: String,
    ) -> Self {
        Self { pool, repo, catalog_repo, notifier, tokens, clock, public_base_url }
    }

    // --- CRIAÇÃO ---

    pub async fn create_order(&self, mut new_order: NewOrder) -> Result<Order, AppError> {
        new_order.customer_name = new_order.customer_name.trim().to_string();
        new_order.location = new_order.location.trim().to_string();
        validate_new_order(&new_order)?;

        let prefix = numbering::date_prefix(self.clock.today());

        // Número e inserção na mesma transação, com o dia travado
        let mut tx = self.pool.begin().await?;
        self.repo.lock_day(&mut *tx, &prefix).await?;
        let last = self.repo.find_last_order_number(&mut *tx, &prefix).await?;
        let order_number = numbering::next_order_number(&prefix, last.as_deref());
        let order = self.repo.insert_order(&mut *tx, &order_number, &new_order).await?;
        tx.commit().await?;

        tracing::info!(
            order_number = %order.order_number,
            location = %order.location,
            total = %order.total,
            "Pedido criado"
        );

        self.spawn_notification(&order, OrderEvent::Created);
        Ok(order)
    }

    // --- LEITURA ---

    pub async fn get_order(&self, id: Uuid) -> Result<Order, AppError> {
        self.repo
            .find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Order".into()))
    }

    /// Datas inclusivas, no dia local do estabelecimento.
    pub async fn list_orders(
        &self,
        status: StatusFilter,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<Order>, AppError> {
        if let (Some(start), Some(end)) = (start_date, end_date) {
            if start > end {
                return Err(AppError::BadRequest("startDate > endDate".into()));
            }
        }
        let (created_from, created_to) = self.clock.day_range_utc(start_date, end_date);
        let filter = OrderListFilter { status: status.as_status(), created_from, created_to };

        self.repo.list_orders(&self.pool, &filter).await
    }

    // --- TRANSIÇÃO ---

    pub async fn update_status(&self, id: Uuid, raw_status: &str) -> Result<Order, AppError> {
        // Status inválido não chega a tocar no banco
        let target: OrderStatus = raw_status.parse()?;
        self.apply_transitions(id, |_| Ok(vec![target])).await
    }

    /// Link "completar" da mensagem do staff: passa por `processing` se preciso,
    /// tudo sob a mesma trava da linha.
    pub async fn complete_via_link(&self, id: Uuid, token: &str) -> Result<Order, AppError> {
        self.tokens.verify_order_action(token, id)?;
        self.apply_transitions(id, completion_path).await
    }

    /// Trava o pedido, valida cada passo contra a tabela e grava só o status final.
    async fn apply_transitions<P>(&self, id: Uuid, plan: P) -> Result<Order, AppError>
    where
        P: FnOnce(OrderStatus) -> Result<Vec<OrderStatus>, AppError>,
    {
        let mut tx = self.pool.begin().await?;
        let current = self.repo
            .find_for_update(&mut *tx, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Order".into()))?;

        let next = walk_transitions(current.status, plan(current.status)?)?;
        let updated = self.repo.update_status(&mut *tx, id, next).await?;
        tx.commit().await?;

        tracing::info!(
            order_number = %updated.order_number,
            from = %current.status,
            to = %updated.status,
            "Status do pedido atualizado"
        );

        if updated.status == OrderStatus::Completed {
            self.spawn_notification(&updated, OrderEvent::Completed);
        }
        Ok(updated)
    }

    // --- ELEGIBILIDADE ---

    /// Reavalia o carrinho com o relógio do servidor. `Ok(Err(_))` é uma recusa
    /// de horário, não um erro da API.
    pub async fn precheck_checkout(
        &self,
        product_ids: &[Uuid],
        pickup_time: Option<&str>,
    ) -> Result<Result<(), Rejection>, AppError> {
        let products = self.catalog_repo.find_products_by_ids(product_ids).await?;
        if products.len() != dedup_count(product_ids) {
            return Err(AppError::ResourceNotFound("Product".into()));
        }

        let category_ids: Vec<Uuid> = products.iter().map(|p| p.category_id).collect();
        let categories: HashMap<Uuid, _> = self.catalog_repo
            .find_categories_by_ids(&category_ids)
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();

        let mut lines = Vec::with_capacity(products.len());
        for product in &products {
            let category = categories
                .get(&product.category_id)
                .ok_or_else(|| AppError::ResourceNotFound("Category".into()))?;
            lines.push((product, category));
        }

        Ok(eligibility::check_checkout(self.clock.now_local(), &lines, pickup_time))
    }

    // --- NOTIFICAÇÃO ---

    fn complete_link(&self, order: &Order) -> Option<String> {
        match self.tokens.create_order_action_token(order.id) {
            Ok(token) => Some(format!(
                "{}/api/orders/{}/complete?token={}",
                self.public_base_url.trim_end_matches('/'),
                order.id,
                token
            )),
            Err(e) => {
                tracing::error!(order_number = %order.order_number, "Falha ao gerar link de conclusão: {}", e);
                None
            }
        }
    }

    // Fire-and-forget: o pedido já foi commitado
    fn spawn_notification(&self, order: &Order, event: OrderEvent) {
        let link = match event {
            OrderEvent::Created => self.complete_link(order),
            OrderEvent::Completed => None,
        };
        let notice = OrderNotice::from_order(order, event, link);
        let notifier = self.notifier.clone();

        tokio::spawn(async move {
            let outcome = notifier.notify(&notice).await;
            if outcome.success {
                tracing::debug!(order_number = %notice.order_number, sent = outcome.sent, "Staff notificado");
            } else {
                tracing::warn!(
                    order_number = %notice.order_number,
                    sent = outcome.sent,
                    failed = outcome.failed,
                    "Notificação do staff não entregue"
                );
            }
        });
    }
}

fn dedup_count(ids: &[Uuid]) -> usize {
    let mut unique = ids.to_vec();
    unique.sort();
    unique.dedup();
    unique.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::order::OrderLine;
    use rust_decimal::Decimal;

    fn new_order(items: Vec<OrderLine>) -> NewOrder {
        NewOrder {
            customer_name: "Mario Rossi".into(),
            location: "pool".into(),
            location_detail: None,
            items,
            notes: None,
            pickup_time: None,
        }
    }

    fn spritz(quantity: u32) -> OrderLine {
        OrderLine { product_id: "p1".into(), name: "Spritz".into(), price: Decimal::from(7), quantity }
    }

    #[test]
    fn mario_rossi_order_totals_fourteen() {
        let order = new_order(vec![spritz(2)]);
        assert!(validate_new_order(&order).is_ok());
        assert_eq!(order.total().ok(), Some(Decimal::from(14)));
    }

    #[test]
    fn empty_cart_is_rejected() {
        assert!(matches!(validate_new_order(&new_order(vec![])), Err(AppError::EmptyOrder)));
    }

    #[test]
    fn blank_names_and_zero_quantity_are_rejected() {
        let mut order = new_order(vec![spritz(1)]);
        order.customer_name = "   ".into();
        assert!(matches!(validate_new_order(&order), Err(AppError::BadRequest(_))));

        let mut order = new_order(vec![spritz(1)]);
        order.location = String::new();
        assert!(validate_new_order(&order).is_err());

        assert!(validate_new_order(&new_order(vec![spritz(0)])).is_err());
    }

    #[test]
    fn negative_price_is_rejected() {
        let mut line = spritz(1);
        line.price = Decimal::new(-100, 2);
        assert!(validate_new_order(&new_order(vec![line])).is_err());
    }

    #[test]
    fn oversized_or_sub_cent_prices_are_rejected() {
        let mut line = spritz(2);
        line.price = Decimal::MAX;
        assert!(matches!(validate_new_order(&new_order(vec![line])), Err(AppError::BadRequest(_))));

        let mut line = spritz(1);
        line.price = Decimal::new(7005, 3);
        assert!(validate_new_order(&new_order(vec![line])).is_err());

        // Cada linha cabe, a soma não
        let mut line = spritz(u32::MAX);
        line.price = Decimal::new(9_999_999_999, 2);
        assert!(validate_new_order(&new_order(vec![line])).is_err());
    }

    #[test]
    fn completion_path_walks_the_transition_table() {
        let path = completion_path(OrderStatus::Waiting).expect("path");
        let mut current = OrderStatus::Waiting;
        for step in &path {
            current = current.transition_to(*step).expect("legal step");
        }
        assert_eq!(current, OrderStatus::Completed);

        assert_eq!(completion_path(OrderStatus::Processing).ok(), Some(vec![OrderStatus::Completed]));
        assert!(completion_path(OrderStatus::Cancelled).is_err());
        assert!(completion_path(OrderStatus::Completed).is_err());
    }

    #[test]
    fn completion_plan_lands_on_completed_in_one_write() {
        let waiting = walk_transitions(OrderStatus::Waiting, completion_path(OrderStatus::Waiting).expect("path"));
        assert_eq!(waiting.ok(), Some(OrderStatus::Completed));

        // Cancelado entre a leitura e a escrita: o plano recalculado não existe
        assert!(matches!(
            completion_path(OrderStatus::Cancelled),
            Err(AppError::InvalidTransition { from: OrderStatus::Cancelled, .. })
        ));
        assert!(matches!(
            walk_transitions(OrderStatus::Cancelled, vec![OrderStatus::Processing, OrderStatus::Completed]),
            Err(AppError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn duplicate_product_ids_count_once() {
        let id = Uuid::new_v4();
        assert_eq!(dedup_count(&[id, id, Uuid::new_v4()]), 2);
    }

    #[tokio::test]
    async fn unknown_status_fails_before_opening_a_transaction() {
        // Pool preguiçoso sem banco: qualquer acesso falharia com Database
        let state = crate::config::testing::lazy_state();
        let result = state.order_service.update_status(Uuid::new_v4(), "shipped").await;
        assert!(matches!(result, Err(AppError::InvalidStatus(s)) if s == "shipped"));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn mario_rossi_order_is_numbered_and_waiting(pool: PgPool) {
        let state = crate::config::testing::state_with(pool);
        let prefix = numbering::date_prefix(state.clock.today());

        let order = state.order_service.create_order(new_order(vec![spritz(2)])).await.expect("created");
        assert_eq!(order.order_number, format!("{prefix}001"));
        assert_eq!(order.total, Decimal::from(14));
        assert_eq!(order.status, OrderStatus::Waiting);

        let next = state.order_service.create_order(new_order(vec![spritz(1)])).await.expect("created");
        assert_eq!(next.order_number, format!("{prefix}002"));

        let waiting = state
            .order_service
            .list_orders(StatusFilter::Only(OrderStatus::Waiting), None, None)
            .await
            .expect("list");
        assert_eq!(waiting.len(), 2);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn strict_table_rejects_completed_back_to_waiting(pool: PgPool) {
        let state = crate::config::testing::state_with(pool);
        let service = &state.order_service;
        let order = service.create_order(new_order(vec![spritz(2)])).await.expect("created");

        assert!(matches!(
            service.update_status(order.id, "completed").await,
            Err(AppError::InvalidTransition { from: OrderStatus::Waiting, .. })
        ));
        service.update_status(order.id, "processing").await.expect("processing");
        service.update_status(order.id, "completed").await.expect("completed");
        assert!(matches!(
            service.update_status(order.id, "waiting").await,
            Err(AppError::InvalidTransition { .. })
        ));
        assert_eq!(service.get_order(order.id).await.expect("order").status, OrderStatus::Completed);
        assert!(matches!(
            service.update_status(Uuid::new_v4(), "processing").await,
            Err(AppError::ResourceNotFound(_))
        ));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn completion_link_completes_waiting_order_in_one_step(pool: PgPool) {
        let state = crate::config::testing::state_with(pool);
        let service = &state.order_service;
        let order = service.create_order(new_order(vec![spritz(2)])).await.expect("created");
        let token = state.auth_service.tokens().create_order_action_token(order.id).expect("token");

        let completed = service.complete_via_link(order.id, &token).await.expect("completed");
        assert_eq!(completed.status, OrderStatus::Completed);

        // Segundo clique no mesmo link
        assert!(matches!(
            service.complete_via_link(order.id, &token).await,
            Err(AppError::InvalidTransition { .. })
        ));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn completion_link_leaves_cancelled_order_untouched(pool: PgPool) {
        let state = crate::config::testing::state_with(pool);
        let service = &state.order_service;
        let order = service.create_order(new_order(vec![spritz(2)])).await.expect("created");
        service.update_status(order.id, "cancelled").await.expect("cancelled");
        let token = state.auth_service.tokens().create_order_action_token(order.id).expect("token");

        assert!(matches!(
            service.complete_via_link(order.id, &token).await,
            Err(AppError::InvalidTransition { from: OrderStatus::Cancelled, .. })
        ));
        assert_eq!(service.get_order(order.id).await.expect("order").status, OrderStatus::Cancelled);

        let other = service.create_order(new_order(vec![spritz(1)])).await.expect("created");
        assert!(matches!(
            service.complete_via_link(other.id, &token).await,
            Err(AppError::InvalidToken)
        ));
    }
}
