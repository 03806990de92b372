// src/db/order_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{types::Json, Executor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::order::{NewOrder, Order, OrderStatus},
};

const ORDER_COLUMNS: &str = "id, order_number, customer_name, location, location_detail, items, \
     total, status, notes, pickup_time, created_at, updated_at";

/// Filtros da lista do painel. `created_to` é exclusivo.
#[derive(Debug, Clone, Default)]
pub struct OrderListFilter {
    pub status: Option<OrderStatus>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct OrderRepository {
    pool: PgPool,
}

impl OrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // =========================================================================
    //  NUMERAÇÃO
    // =========================================================================

    /// Serializa as criações do mesmo dia até o fim da transação corrente.
    pub async fn lock_day<'e, E>(&self, executor: E, date_prefix: &str) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1)::bigint)")
            .bind(date_prefix)
            .execute(executor)
            .await?;
        Ok(())
    }

    /// Maior número bem formado do dia. Ordena por tamanho antes do valor
    /// para que "...1000" venha depois de "...999".
    pub async fn find_last_order_number<'e, E>(
        &self,
        executor: E,
        date_prefix: &str,
    ) -> Result<Option<String>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let last = sqlx::query_scalar::<_, String>(
            r#"
            SELECT order_number FROM orders
            WHERE LEFT(order_number, 8) = $1
              AND order_number ~ ('^' || $1 || '[0-9]{3,}$')
            ORDER BY LENGTH(order_number) DESC, order_number DESC
            LIMIT 1
            "#,
        )
        .bind(date_prefix)
        .fetch_optional(executor)
        .await?;

        Ok(last)
    }

    // =========================================================================
    //  PEDIDOS
    // =========================================================================

    pub async fn insert_order<'e, E>(
        &self,
        executor: E,
        order_number: &str,
        order: &NewOrder,
    ) -> Result<Order, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO orders (
                order_number, customer_name, location, location_detail,
                items, total, status, notes, pickup_time
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {ORDER_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Order>(&sql)
            .bind(order_number)
            .bind(&order.customer_name)
            .bind(&order.location)
            .bind(order.location_detail.as_deref())
            .bind(Json(&order.items))
            .bind(order.total()?)
            .bind(OrderStatus::Waiting)
            .bind(order.notes.as_deref())
            .bind(order.pickup_time.as_deref())
            .fetch_one(executor)
            .await
            .map_err(|e| {
                if let Some(db_err) = e.as_database_error() {
                    if db_err.is_unique_violation() {
                        return AppError::Conflict(format!("Order {order_number}"));
                    }
                }
                AppError::DatabaseError(e)
            })
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Order>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(order)
    }

    /// Lê o pedido travando a linha até o fim da transação.
    pub async fn find_for_update<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Order>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 FOR UPDATE");
        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(order)
    }

    pub async fn update_status<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        status: OrderStatus,
    ) -> Result<Order, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "UPDATE orders SET status = $1, updated_at = NOW() WHERE id = $2 RETURNING {ORDER_COLUMNS}"
        );
        sqlx::query_as::<_, Order>(&sql)
            .bind(status)
            .bind(id)
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Order".into()))
    }

    /// Mais recentes primeiro.
    pub async fn list_orders<'e, E>(
        &self,
        executor: E,
        filter: &OrderListFilter,
    ) -> Result<Vec<Order>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let mut query = QueryBuilder::<Postgres>::new(format!("SELECT {ORDER_COLUMNS} FROM orders WHERE TRUE"));

        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(status);
        }
        if let Some(from) = filter.created_from {
            query.push(" AND created_at >= ").push_bind(from);
        }
        if let Some(to) = filter.created_to {
            query.push(" AND created_at < ").push_bind(to);
        }
        query.push(" ORDER BY created_at DESC");

        let orders = query.build_query_as::<Order>().fetch_all(executor).await?;
        Ok(orders)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{models::order::OrderLine, services::numbering};
    use rust_decimal::Decimal;

    const DAY: &str = "20250617";

    fn new_order(customer: &str) -> NewOrder {
        NewOrder {
            customer_name: customer.into(),
            location: "pool".into(),
            location_detail: None,
            items: vec![OrderLine {
                product_id: "p1".into(),
                name: "Spritz".into(),
                price: Decimal::new(700, 2),
                quantity: 2,
            }],
            notes: None,
            pickup_time: None,
        }
    }

    async fn insert_next(repo: &OrderRepository, customer: &str) -> Order {
        let mut tx = repo.pool().begin().await.expect("tx");
        repo.lock_day(&mut *tx, DAY).await.expect("lock");
        let last = repo.find_last_order_number(&mut *tx, DAY).await.expect("last");
        let number = numbering::next_order_number(DAY, last.as_deref());
        let order = repo.insert_order(&mut *tx, &number, &new_order(customer)).await.expect("insert");
        tx.commit().await.expect("commit");
        order
    }

    async fn age(pool: &PgPool, id: Uuid, minutes: i32) {
        sqlx::query("UPDATE orders SET created_at = NOW() - make_interval(mins => $1) WHERE id = $2")
            .bind(minutes)
            .bind(id)
            .execute(pool)
            .await
            .expect("age");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn numbers_start_at_001_and_increment(pool: PgPool) {
        let repo = OrderRepository::new(pool);

        let first = insert_next(&repo, "Mario Rossi").await;
        let second = insert_next(&repo, "Anna Bianchi").await;

        assert_eq!(first.order_number, "20250617001");
        assert_eq!(first.total, Decimal::from(14));
        assert_eq!(first.status, OrderStatus::Waiting);
        assert_eq!(second.order_number, "20250617002");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn counter_grows_past_999_and_skips_malformed_numbers(pool: PgPool) {
        let repo = OrderRepository::new(pool.clone());
        repo.insert_order(&pool, "20250617999", &new_order("A")).await.expect("insert");
        repo.insert_order(&pool, "20250617zzz", &new_order("B")).await.expect("insert");
        repo.insert_order(&pool, "20250618001", &new_order("C")).await.expect("insert");

        assert_eq!(
            repo.find_last_order_number(&pool, DAY).await.expect("last").as_deref(),
            Some("20250617999")
        );

        let next = insert_next(&repo, "D").await;
        assert_eq!(next.order_number, "202506171000");
        let after = insert_next(&repo, "E").await;
        assert_eq!(after.order_number, "202506171001");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn duplicate_number_is_a_conflict(pool: PgPool) {
        let repo = OrderRepository::new(pool.clone());
        repo.insert_order(&pool, "20250617001", &new_order("A")).await.expect("insert");

        let again = repo.insert_order(&pool, "20250617001", &new_order("B")).await;
        assert!(matches!(again, Err(AppError::Conflict(_))));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn list_filters_by_status_newest_first(pool: PgPool) {
        let repo = OrderRepository::new(pool.clone());
        let oldest = insert_next(&repo, "Oldest").await;
        let middle = insert_next(&repo, "Middle").await;
        let newest = insert_next(&repo, "Newest").await;
        age(&pool, oldest.id, 30).await;
        age(&pool, middle.id, 20).await;
        age(&pool, newest.id, 10).await;

        repo.update_status(&pool, middle.id, OrderStatus::Processing).await.expect("update");

        let waiting = repo
            .list_orders(&pool, &OrderListFilter { status: Some(OrderStatus::Waiting), ..Default::default() })
            .await
            .expect("list");
        let ids: Vec<Uuid> = waiting.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![newest.id, oldest.id]);

        let all = repo.list_orders(&pool, &OrderListFilter::default()).await.expect("list");
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].id, newest.id);

        // Janela que só pega o mais antigo
        let window = OrderListFilter {
            status: None,
            created_from: Some(Utc::now() - chrono::Duration::minutes(35)),
            created_to: Some(Utc::now() - chrono::Duration::minutes(25)),
        };
        let ranged = repo.list_orders(&pool, &window).await.expect("list");
        assert_eq!(ranged.iter().map(|o| o.id).collect::<Vec<_>>(), vec![oldest.id]);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn status_update_is_read_back(pool: PgPool) {
        let repo = OrderRepository::new(pool.clone());
        let order = insert_next(&repo, "Mario Rossi").await;

        let updated = repo.update_status(&pool, order.id, OrderStatus::Processing).await.expect("update");
        assert_eq!(updated.status, OrderStatus::Processing);

        let reloaded = repo.find_by_id(&pool, order.id).await.expect("find").expect("exists");
        assert_eq!(reloaded.status, OrderStatus::Processing);
        assert_eq!(reloaded.items.0, order.items.0);

        let missing = repo.update_status(&pool, Uuid::new_v4(), OrderStatus::Cancelled).await;
        assert!(matches!(missing, Err(AppError::ResourceNotFound(_))));
    }
}
