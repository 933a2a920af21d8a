//! Storage for the storefront.
//!
//! # Tables
//!
//! - `categories`, `products`, `blog_posts` - catalog, read-only here
//! - `cart_items` - cart lines keyed by anonymous shopper id
//! - `orders`, `order_items` - written once at checkout
//! - `tower_sessions.session` - session storage (created by `luma-cli migrate`)
//!
//! Every table is reached through one of three traits so the same services
//! run against Postgres in production and against [`MemoryStore`] in tests
//! and local development.
//!
//! # Migrations
//!
//! Migrations live in `crates/storefront/migrations/` and are run via:
//! ```bash
//! cargo run -p luma-cli -- migrate
//! ```

mod cart;
mod catalog;
mod memory;
mod orders;
pub mod seed;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use luma_core::{CartLineId, CategoryId, OrderId, ProductId, ShopperId};

use crate::models::{
    BlogPost, CartLine, Category, NewCartLine, NewOrder, NewOrderItem, Order, OrderItem, Product,
};

pub use cart::PgCartStore;
pub use catalog::PgCatalogStore;
pub use memory::MemoryStore;
pub use orders::PgOrderStore;

/// Errors from any storage backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database query failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored value could not be mapped onto the domain model.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// A unique value already exists.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The backend cannot serve requests right now.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Read-only catalog queries.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Featured products, newest first, at most `limit`.
    async fn featured_products(&self, limit: u32) -> Result<Vec<Product>, StoreError>;

    /// All products, optionally in one category, newest first.
    async fn products(&self, category: Option<CategoryId>) -> Result<Vec<Product>, StoreError>;

    async fn product_by_slug(&self, slug: &str) -> Result<Option<Product>, StoreError>;

    async fn product_by_id(&self, id: ProductId) -> Result<Option<Product>, StoreError>;

    /// All categories ordered by name.
    async fn categories(&self) -> Result<Vec<Category>, StoreError>;

    /// Published posts, newest first.
    async fn published_posts(&self) -> Result<Vec<BlogPost>, StoreError>;

    /// A published post by slug. Drafts are never returned.
    async fn post_by_slug(&self, slug: &str) -> Result<Option<BlogPost>, StoreError>;
}

/// Cart line storage, always scoped to one shopper.
///
/// Line mutations match on both line id and shopper id; a line belonging to
/// someone else is treated as absent.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Lines joined to their products, oldest first.
    async fn lines(&self, shopper: ShopperId) -> Result<Vec<CartLine>, StoreError>;

    async fn insert_line(&self, line: NewCartLine) -> Result<(), StoreError>;

    /// Replace a line's quantity. Unknown lines are ignored.
    async fn update_quantity(
        &self,
        shopper: ShopperId,
        line: CartLineId,
        quantity: u32,
    ) -> Result<(), StoreError>;

    /// Delete a line. Unknown lines are ignored.
    async fn delete_line(&self, shopper: ShopperId, line: CartLineId) -> Result<(), StoreError>;

    /// Delete every line for the shopper.
    async fn clear(&self, shopper: ShopperId) -> Result<(), StoreError>;
}

/// Order storage.
///
/// The header and the lines are written by separate calls; nothing ties the
/// two writes together.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Insert the order header with status `pending`.
    async fn insert_order(&self, order: NewOrder) -> Result<Order, StoreError>;

    /// Insert all line snapshots for an order in one statement.
    async fn insert_items(&self, items: &[NewOrderItem]) -> Result<(), StoreError>;

    async fn order(&self, id: OrderId) -> Result<Option<Order>, StoreError>;

    async fn order_items(&self, id: OrderId) -> Result<Vec<OrderItem>, StoreError>;
}

/// The three stores behind one handle.
#[derive(Clone)]
pub struct Stores {
    pub catalog: Arc<dyn CatalogStore>,
    pub carts: Arc<dyn CartStore>,
    pub orders: Arc<dyn OrderStore>,
}

impl Stores {
    /// Postgres-backed stores sharing one pool.
    #[must_use]
    pub fn postgres(pool: &PgPool) -> Self {
        Self {
            catalog: Arc::new(PgCatalogStore::new(pool.clone())),
            carts: Arc::new(PgCartStore::new(pool.clone())),
            orders: Arc::new(PgOrderStore::new(pool.clone())),
        }
    }

    /// Stores backed by a single in-process [`MemoryStore`].
    #[must_use]
    pub fn memory(store: &Arc<MemoryStore>) -> Self {
        Self {
            catalog: store.clone(),
            carts: store.clone(),
            orders: store.clone(),
        }
    }
}

impl std::fmt::Debug for Stores {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stores").finish_non_exhaustive()
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Convert a stored quantity, rejecting values the schema should never hold.
pub(crate) fn quantity_from_row(value: i32) -> Result<u32, StoreError> {
    u32::try_from(value)
        .ok()
        .filter(|q| *q > 0)
        .ok_or_else(|| StoreError::DataCorruption(format!("invalid quantity {value}")))
}

/// Convert a domain quantity to the signed column type, saturating.
pub(crate) fn quantity_to_row(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}
