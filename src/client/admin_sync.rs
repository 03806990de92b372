// src/client/admin_sync.rs
//
// Painel do staff: lista de pedidos renovada por polling e a trava por pedido
// enquanto uma mudança de status está em voo.

use std::{collections::HashSet, sync::Arc, time::Duration};

use tokio::{
    sync::{Mutex, Notify},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::{ClientError, OrderFeed, Tab};
use crate::models::order::{Order, OrderStatus};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(20);

#[derive(Debug, Default)]
struct BoardState {
    tab: Tab,
    orders: Vec<Order>,
    updating: HashSet<Uuid>,
}

/// Estado do painel. A lista é sempre substituída inteira, sem diff.
pub struct AdminBoard<F: OrderFeed> {
    feed: Arc<F>,
    state: Mutex<BoardState>,
}

impl<F: OrderFeed> AdminBoard<F> {
    pub fn new(feed: Arc<F>) -> Self {
        Self { feed, state: Mutex::new(BoardState::default()) }
    }

    pub async fn tab(&self) -> Tab {
        self.state.lock().await.tab
    }

    pub async fn orders(&self) -> Vec<Order> {
        self.state.lock().await.orders.clone()
    }

    /// O botão de status desse pedido deve ficar desabilitado.
    pub async fn is_updating(&self, id: Uuid) -> bool {
        self.state.lock().await.updating.contains(&id)
    }

    /// Busca a aba atual. Em caso de falha a lista anterior continua na tela.
    pub async fn refresh(&self) -> Result<(), ClientError> {
        let tab = self.tab().await;
        match self.feed.fetch_orders(tab).await {
            Ok(orders) => {
                let mut state = self.state.lock().await;
                // A aba pode ter mudado durante a busca
                if state.tab == tab {
                    state.orders = orders;
                }
                Ok(())
            }
            Err(e) => {
                tracing::warn!(tab = %tab, "Falha ao atualizar pedidos: {}", e);
                Err(e)
            }
        }
    }

    pub async fn select_tab(&self, tab: Tab) -> Result<(), ClientError> {
        {
            let mut state = self.state.lock().await;
            if state.tab == tab {
                return Ok(());
            }
            state.tab = tab;
            state.orders.clear();
        }
        self.refresh().await
    }

    /// Uma mudança por pedido de cada vez; a trava sai com sucesso ou erro.
    pub async fn set_status(&self, id: Uuid, status: OrderStatus) -> Result<Order, ClientError> {
        {
            let mut state = self.state.lock().await;
            if !state.updating.insert(id) {
                return Err(ClientError::AlreadyUpdating(id));
            }
        }

        let result = self.feed.update_status(id, status).await;
        self.state.lock().await.updating.remove(&id);

        let order = result?;
        tracing::info!(order_number = %order.order_number, status = %order.status, "Status alterado");

        // Falha aqui não desfaz a mudança: o próximo ciclo corrige a lista
        let _ = self.refresh().await;
        Ok(order)
    }
}

/// Task de polling do painel. Para com `stop()` (logout, painel fechado) ou
/// quando o servidor recusa a sessão.
pub struct AdminSync {
    shutdown: CancellationToken,
    wake: Arc<Notify>,
    handle: JoinHandle<()>,
}

impl AdminSync {
    pub fn spawn<F: OrderFeed>(board: Arc<AdminBoard<F>>, interval: Duration) -> Self {
        let shutdown = CancellationToken::new();
        let wake = Arc::new(Notify::new());

        let handle = tokio::spawn(run(board, interval, shutdown.clone(), wake.clone()));
        Self { shutdown, wake, handle }
    }

    /// Busca imediata, fora do ciclo.
    pub fn refresh_now(&self) {
        self.wake.notify_one();
    }

    pub fn stop(&self) {
        self.shutdown.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    pub async fn join(self) {
        if let Err(e) = self.handle.await {
            tracing::error!("Task de sincronização do painel falhou: {}", e);
        }
    }
}

async fn run<F: OrderFeed>(
    board: Arc<AdminBoard<F>>,
    interval: Duration,
    shutdown: CancellationToken,
    wake: Arc<Notify>,
) {
    tracing::debug!(interval_secs = interval.as_secs(), "Sincronização do painel iniciada");

    // O primeiro tick é imediato: carga inicial
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {}
            _ = wake.notified() => {}
        }

        if let Err(ClientError::Unauthorized) = board.refresh().await {
            tracing::warn!("Sessão recusada pelo servidor, sincronização encerrada");
            shutdown.cancel();
            break;
        }
    }

    tracing::debug!("Sincronização do painel encerrada");
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use sqlx::types::Json;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    fn order(number: &str, status: OrderStatus) -> Order {
        Order {
            id: Uuid::new_v4(),
            order_number: number.into(),
            customer_name: "Mario Rossi".into(),
            location: "pool".into(),
            location_detail: None,
            items: Json(Vec::new()),
            total: Decimal::from(14),
            status,
            notes: None,
            pickup_time: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[derive(Default)]
    struct MemoryFeed {
        orders: std::sync::Mutex<Vec<Order>>,
        fetches: AtomicUsize,
        failing: AtomicBool,
        unauthorized: AtomicBool,
        // Segura o update_status até ser liberado
        gate: Option<Arc<Notify>>,
    }

    impl MemoryFeed {
        fn with(orders: Vec<Order>) -> Self {
            Self { orders: std::sync::Mutex::new(orders), ..Default::default() }
        }

        fn fetches(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl OrderFeed for MemoryFeed {
        async fn fetch_orders(&self, tab: Tab) -> Result<Vec<Order>, ClientError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.unauthorized.load(Ordering::SeqCst) {
                return Err(ClientError::Unauthorized);
            }
            if self.failing.load(Ordering::SeqCst) {
                return Err(ClientError::Decode("boom".into()));
            }
            let orders = self.orders.lock().expect("lock").clone();
            Ok(orders
                .into_iter()
                .filter(|o| tab.filter().as_status().is_none_or(|s| s == o.status))
                .collect())
        }

        async fn update_status(&self, id: Uuid, status: OrderStatus) -> Result<Order, ClientError> {
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            let mut orders = self.orders.lock().expect("lock");
            let order = orders
                .iter_mut()
                .find(|o| o.id == id)
                .ok_or(ClientError::Rejected { status: 404, message: "not found".into() })?;
            order.status = order
                .status
                .transition_to(status)
                .map_err(|e| ClientError::Rejected { status: 400, message: e.to_string() })?;
            Ok(order.clone())
        }
    }

    #[tokio::test]
    async fn refresh_replaces_list_for_current_tab() {
        let feed = Arc::new(MemoryFeed::with(vec![
            order("20250617001", OrderStatus::Waiting),
            order("20250617002", OrderStatus::Processing),
        ]));
        let board = AdminBoard::new(feed.clone());

        board.refresh().await.expect("refresh");
        assert_eq!(board.orders().await.len(), 1);

        board.select_tab(Tab::All).await.expect("refresh");
        assert_eq!(board.orders().await.len(), 2);
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_list() {
        let feed = Arc::new(MemoryFeed::with(vec![order("20250617001", OrderStatus::Waiting)]));
        let board = AdminBoard::new(feed.clone());
        board.refresh().await.expect("refresh");

        feed.failing.store(true, Ordering::SeqCst);
        assert!(board.refresh().await.is_err());
        assert_eq!(board.orders().await.len(), 1);
    }

    #[tokio::test]
    async fn set_status_moves_order_and_refreshes() {
        let waiting = order("20250617001", OrderStatus::Waiting);
        let id = waiting.id;
        let feed = Arc::new(MemoryFeed::with(vec![waiting]));
        let board = AdminBoard::new(feed.clone());
        board.refresh().await.expect("refresh");

        let updated = board.set_status(id, OrderStatus::Processing).await.expect("updated");
        assert_eq!(updated.status, OrderStatus::Processing);
        assert!(!board.is_updating(id).await);
        // Saiu da aba "waiting" depois do refresh
        assert!(board.orders().await.is_empty());
    }

    #[tokio::test]
    async fn failed_update_releases_the_lock() {
        let completed = order("20250617001", OrderStatus::Completed);
        let id = completed.id;
        let board = AdminBoard::new(Arc::new(MemoryFeed::with(vec![completed])));

        assert!(matches!(
            board.set_status(id, OrderStatus::Waiting).await,
            Err(ClientError::Rejected { status: 400, .. })
        ));
        assert!(!board.is_updating(id).await);
    }

    #[tokio::test]
    async fn second_click_while_in_flight_is_rejected() {
        let waiting = order("20250617001", OrderStatus::Waiting);
        let id = waiting.id;
        let gate = Arc::new(Notify::new());
        let feed = Arc::new(MemoryFeed {
            gate: Some(gate.clone()),
            ..MemoryFeed::with(vec![waiting])
        });
        let board = Arc::new(AdminBoard::new(feed));

        let first = tokio::spawn({
            let board = board.clone();
            async move { board.set_status(id, OrderStatus::Processing).await }
        });
        // Deixa a primeira chamada chegar no gate
        while !board.is_updating(id).await {
            tokio::task::yield_now().await;
        }

        assert!(matches!(
            board.set_status(id, OrderStatus::Cancelled).await,
            Err(ClientError::AlreadyUpdating(other)) if other == id
        ));

        gate.notify_one();
        let result = first.await.expect("join");
        assert_eq!(result.map(|o| o.status).ok(), Some(OrderStatus::Processing));
        assert!(!board.is_updating(id).await);
    }

    #[tokio::test(start_paused = true)]
    async fn polls_on_start_and_every_interval_until_stopped() {
        let feed = Arc::new(MemoryFeed::with(vec![order("20250617001", OrderStatus::Waiting)]));
        let board = Arc::new(AdminBoard::new(feed.clone()));
        let sync = AdminSync::spawn(board.clone(), DEFAULT_POLL_INTERVAL);

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(feed.fetches(), 1);
        assert_eq!(board.orders().await.len(), 1);

        tokio::time::sleep(DEFAULT_POLL_INTERVAL).await;
        assert_eq!(feed.fetches(), 2);

        sync.stop();
        tokio::time::sleep(DEFAULT_POLL_INTERVAL * 3).await;
        assert_eq!(feed.fetches(), 2);
        sync.join().await;
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_now_skips_the_wait() {
        let feed = Arc::new(MemoryFeed::default());
        let sync = AdminSync::spawn(Arc::new(AdminBoard::new(feed.clone())), DEFAULT_POLL_INTERVAL);

        tokio::time::sleep(Duration::from_millis(10)).await;
        sync.refresh_now();
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(feed.fetches(), 2);
        sync.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_session_stops_polling() {
        let feed = Arc::new(MemoryFeed::default());
        feed.unauthorized.store(true, Ordering::SeqCst);
        let sync = AdminSync::spawn(Arc::new(AdminBoard::new(feed.clone())), DEFAULT_POLL_INTERVAL);

        tokio::time::sleep(DEFAULT_POLL_INTERVAL * 2).await;
        assert!(sync.is_stopped());
        assert_eq!(feed.fetches(), 1);
    }
}
