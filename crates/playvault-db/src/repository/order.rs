//! # Order Repository
//!
//! Read access to committed orders and their lines. Orders are written
//! only by the purchase transaction; there is no update path.

use sqlx::SqlitePool;

use crate::error::DbResult;
use playvault_core::{Order, OrderLine, OrderStatus};

/// Repository for order reads.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Gets an order by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(
            r#"
            SELECT id, account_id, subtotal_cents, discount_cents, total_cents,
                   status, discount_code_id, created_at
            FROM orders
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    /// Gets all lines for an order.
    pub async fn get_lines(&self, order_id: &str) -> DbResult<Vec<OrderLine>> {
        let lines = sqlx::query_as::<_, OrderLine>(
            r#"
            SELECT id, order_id, item_id, name_snapshot, unit_price_cents,
                   quantity, created_at
            FROM order_lines
            WHERE order_id = ?1
            ORDER BY created_at, item_id
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    /// Lists an account's orders, newest first.
    ///
    /// Every durable order is fulfilled; the status column exists for
    /// wire compatibility with [`OrderStatus`].
    pub async fn list_for_account(&self, account_id: i64) -> DbResult<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(
            r#"
            SELECT id, account_id, subtotal_cents, discount_cents, total_cents,
                   status, discount_code_id, created_at
            FROM orders
            WHERE account_id = ?1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;

        debug_assert!(orders.iter().all(|o| o.status == OrderStatus::Fulfilled));
        Ok(orders)
    }
}
