//! Postgres order storage.
//!
//! `insert_order` and `insert_items` each run as their own statement on the
//! pool. No transaction spans the pair: if the second call fails, the order
//! header stays behind without lines.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder, query_as};
use tracing::instrument;

use luma_core::{OrderId, OrderStatus};

use super::{OrderStore, StoreError, quantity_to_row};
use crate::models::{NewOrder, NewOrderItem, Order, OrderItem};

const ORDER_COLUMNS: &str = "id, order_number, customer_name, customer_email, customer_phone, \
     shipping_address, city, postal_code, total_amount, payment_method, status, created_at";

/// Orders in the `orders` and `order_items` tables.
#[derive(Debug, Clone)]
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    #[instrument(skip(self, order), fields(order_number = %order.order_number))]
    async fn insert_order(&self, order: NewOrder) -> Result<Order, StoreError> {
        let sql = format!(
            "INSERT INTO orders (order_number, customer_name, customer_email, customer_phone, \
             shipping_address, city, postal_code, total_amount, payment_method, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {ORDER_COLUMNS}"
        );
        let created = query_as::<Postgres, Order>(&sql)
            .bind(&order.order_number)
            .bind(&order.customer_name)
            .bind(&order.customer_email)
            .bind(&order.customer_phone)
            .bind(&order.shipping_address)
            .bind(&order.city)
            .bind(&order.postal_code)
            .bind(order.total_amount)
            .bind(order.payment_method)
            .bind(OrderStatus::Pending)
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }

    #[instrument(skip(self, items), fields(count = items.len()))]
    async fn insert_items(&self, items: &[NewOrderItem]) -> Result<(), StoreError> {
        if items.is_empty() {
            return Ok(());
        }

        let mut builder: QueryBuilder<'_, Postgres> =
            QueryBuilder::new("INSERT INTO order_items (order_id, product_id, quantity, price) ");
        builder.push_values(items, |mut row, item| {
            row.push_bind(item.order_id)
                .push_bind(item.product_id)
                .push_bind(quantity_to_row(item.quantity))
                .push_bind(item.price);
        });
        builder.build().execute(&self.pool).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn order(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
        let order = query_as::<Postgres, Order>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(order)
    }

    #[instrument(skip(self))]
    async fn order_items(&self, id: OrderId) -> Result<Vec<OrderItem>, StoreError> {
        let items = query_as::<Postgres, OrderItem>(
            "SELECT id, order_id, product_id, quantity, price FROM order_items \
             WHERE order_id = $1 ORDER BY created_at, id",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }
}
