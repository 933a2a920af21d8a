//! Postgres cart line storage.
//!
//! Lines are read with a `LEFT JOIN` so a line whose product has since been
//! deleted still comes back (priced at zero) instead of vanishing silently.
//! The foreign key cascades, so in practice such lines are rare.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, Postgres, query, query_as};
use tracing::instrument;

use luma_core::{CartLineId, CategoryId, Price, ProductId, ShopperId};

use super::{CartStore, StoreError, quantity_from_row, quantity_to_row};
use crate::models::{CartLine, NewCartLine, Product};

const SELECT_LINES_SQL: &str = r"
SELECT
    c.id, c.shopper_id, c.product_id, c.quantity, c.created_at,
    p.slug AS product_slug, p.name AS product_name, p.description AS product_description,
    p.price AS product_price, p.image_url AS product_image_url,
    p.category_id AS product_category_id, p.featured AS product_featured,
    p.created_at AS product_created_at
FROM cart_items c
LEFT JOIN products p ON p.id = c.product_id
WHERE c.shopper_id = $1
ORDER BY c.created_at, c.id
";

/// Flat row from the cart/product join.
#[derive(Debug, FromRow)]
struct CartLineRow {
    id: CartLineId,
    shopper_id: ShopperId,
    product_id: ProductId,
    quantity: i32,
    created_at: DateTime<Utc>,
    product_slug: Option<String>,
    product_name: Option<String>,
    product_description: Option<String>,
    product_price: Option<Decimal>,
    product_image_url: Option<String>,
    product_category_id: Option<CategoryId>,
    product_featured: Option<bool>,
    product_created_at: Option<DateTime<Utc>>,
}

impl CartLineRow {
    fn into_line(self) -> Result<CartLine, StoreError> {
        let product = match (
            self.product_slug,
            self.product_name,
            self.product_price,
            self.product_created_at,
        ) {
            (Some(slug), Some(name), Some(price), Some(created_at)) => Some(Product {
                id: self.product_id,
                slug,
                name,
                description: self.product_description.unwrap_or_default(),
                price: Price::new(price),
                image_url: self.product_image_url,
                category_id: self.product_category_id,
                featured: self.product_featured.unwrap_or(false),
                created_at,
            }),
            _ => None,
        };

        Ok(CartLine {
            id: self.id,
            shopper_id: self.shopper_id,
            product_id: self.product_id,
            quantity: quantity_from_row(self.quantity)?,
            product,
            created_at: self.created_at,
        })
    }
}

/// Cart lines in the `cart_items` table.
#[derive(Debug, Clone)]
pub struct PgCartStore {
    pool: PgPool,
}

impl PgCartStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CartStore for PgCartStore {
    #[instrument(skip(self), fields(shopper = %shopper))]
    async fn lines(&self, shopper: ShopperId) -> Result<Vec<CartLine>, StoreError> {
        let rows = query_as::<Postgres, CartLineRow>(SELECT_LINES_SQL)
            .bind(shopper)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(CartLineRow::into_line).collect()
    }

    #[instrument(skip(self), fields(shopper = %line.shopper_id, product = %line.product_id))]
    async fn insert_line(&self, line: NewCartLine) -> Result<(), StoreError> {
        query(
            "INSERT INTO cart_items (id, shopper_id, product_id, quantity) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(line.id)
        .bind(line.shopper_id)
        .bind(line.product_id)
        .bind(quantity_to_row(line.quantity))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    #[instrument(skip(self), fields(shopper = %shopper, line = %line))]
    async fn update_quantity(
        &self,
        shopper: ShopperId,
        line: CartLineId,
        quantity: u32,
    ) -> Result<(), StoreError> {
        query(
            "UPDATE cart_items SET quantity = $1, updated_at = NOW() \
             WHERE id = $2 AND shopper_id = $3",
        )
        .bind(quantity_to_row(quantity))
        .bind(line)
        .bind(shopper)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    #[instrument(skip(self), fields(shopper = %shopper, line = %line))]
    async fn delete_line(&self, shopper: ShopperId, line: CartLineId) -> Result<(), StoreError> {
        query("DELETE FROM cart_items WHERE id = $1 AND shopper_id = $2")
            .bind(line)
            .bind(shopper)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    #[instrument(skip(self), fields(shopper = %shopper))]
    async fn clear(&self, shopper: ShopperId) -> Result<(), StoreError> {
        query("DELETE FROM cart_items WHERE shopper_id = $1")
            .bind(shopper)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
