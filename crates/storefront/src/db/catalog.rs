//! Postgres catalog queries.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, query_as};
use tracing::instrument;

use luma_core::{CategoryId, ProductId};

use super::{CatalogStore, StoreError};
use crate::models::{BlogPost, Category, Product};

const PRODUCT_COLUMNS: &str =
    "id, slug, name, description, price, image_url, category_id, featured, created_at";

const POST_COLUMNS: &str =
    "id, slug, title, excerpt, content, image_url, author, published, created_at";

/// Catalog reads against the `products`, `categories` and `blog_posts` tables.
#[derive(Debug, Clone)]
pub struct PgCatalogStore {
    pool: PgPool,
}

impl PgCatalogStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogStore for PgCatalogStore {
    #[instrument(skip(self))]
    async fn featured_products(&self, limit: u32) -> Result<Vec<Product>, StoreError> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE featured ORDER BY created_at DESC LIMIT $1"
        );
        let products = query_as::<Postgres, Product>(&sql)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;
        Ok(products)
    }

    #[instrument(skip(self))]
    async fn products(&self, category: Option<CategoryId>) -> Result<Vec<Product>, StoreError> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE ($1::uuid IS NULL OR category_id = $1) \
             ORDER BY created_at DESC"
        );
        let products = query_as::<Postgres, Product>(&sql)
            .bind(category)
            .fetch_all(&self.pool)
            .await?;
        Ok(products)
    }

    #[instrument(skip(self))]
    async fn product_by_slug(&self, slug: &str) -> Result<Option<Product>, StoreError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE slug = $1");
        let product = query_as::<Postgres, Product>(&sql)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }

    #[instrument(skip(self))]
    async fn product_by_id(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1");
        let product = query_as::<Postgres, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }

    #[instrument(skip(self))]
    async fn categories(&self) -> Result<Vec<Category>, StoreError> {
        let categories = query_as::<Postgres, Category>(
            "SELECT id, slug, name, description FROM categories ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(categories)
    }

    #[instrument(skip(self))]
    async fn published_posts(&self) -> Result<Vec<BlogPost>, StoreError> {
        let sql = format!(
            "SELECT {POST_COLUMNS} FROM blog_posts WHERE published ORDER BY created_at DESC"
        );
        let posts = query_as::<Postgres, BlogPost>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(posts)
    }

    #[instrument(skip(self))]
    async fn post_by_slug(&self, slug: &str) -> Result<Option<BlogPost>, StoreError> {
        let sql = format!("SELECT {POST_COLUMNS} FROM blog_posts WHERE published AND slug = $1");
        let post = query_as::<Postgres, BlogPost>(&sql)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;
        Ok(post)
    }
}
