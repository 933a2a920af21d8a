//! Catalog fixtures loaded from YAML.
//!
//! The same file seeds the Postgres catalog (via `luma-cli seed`) and the
//! in-memory store used by `LUMA_STORE_BACKEND=memory` and by tests.
//!
//! ## YAML Format
//!
//! ```yaml
//! categories:
//!   - slug: decor
//!     name: Decor
//!
//! products:
//!   - slug: modern-ceramic-vase
//!     name: Modern Ceramic Vase
//!     price: "899.00"
//!     category: decor
//!     featured: true
//!
//! posts:
//!   - slug: styling-small-spaces
//!     title: Styling Small Spaces
//!     published: true
//! ```
//!
//! Entries without `created_at` are stamped so that earlier entries in the
//! file sort as newer.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use sqlx::{PgPool, Postgres, query, query_scalar};
use thiserror::Error;
use tracing::{debug, info, instrument};

use luma_core::{BlogPostId, CategoryId, Price, ProductId};

use super::{MemoryStore, StoreError};
use crate::models::{BlogPost, Category, Product};

/// Catalog bundled with the binary.
const DEMO_CATALOG: &str = include_str!("../../seed/catalog.yaml");

/// Errors while loading or applying a seed file.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("failed to parse YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("{} validation errors: {}", .0.len(), .0.join("; "))]
    Invalid(Vec<String>),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategorySeed {
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductSeed {
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Price,
    #[serde(default)]
    pub image_url: Option<String>,
    /// Category slug.
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostSeed {
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub published: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Full seed file structure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogSeed {
    #[serde(default)]
    pub categories: Vec<CategorySeed>,
    #[serde(default)]
    pub products: Vec<ProductSeed>,
    #[serde(default)]
    pub posts: Vec<PostSeed>,
}

/// Seed entries resolved into catalog records with ids and timestamps.
#[derive(Debug, Clone, Default)]
pub struct CatalogRecords {
    pub categories: Vec<Category>,
    pub products: Vec<Product>,
    pub posts: Vec<BlogPost>,
}

/// Result of seeding the Postgres catalog.
#[derive(Debug, Default)]
pub struct SeedResult {
    /// Rows inserted.
    pub inserted: u64,
    /// Rows skipped because the slug already existed.
    pub skipped: u64,
    /// Rows removed by `--clear`.
    pub cleared: u64,
}

impl CatalogSeed {
    /// Parse a seed file.
    ///
    /// # Errors
    ///
    /// Returns `SeedError::Parse` if the YAML is malformed.
    pub fn from_yaml(content: &str) -> Result<Self, SeedError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// The demo catalog shipped with the storefront.
    ///
    /// # Errors
    ///
    /// Returns `SeedError::Parse` if the bundled file is malformed.
    pub fn demo() -> Result<Self, SeedError> {
        Self::from_yaml(DEMO_CATALOG)
    }

    /// Check slugs, names, prices and category references.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        let mut seen = HashSet::new();
        for category in &self.categories {
            check_slug("category", &category.slug, &mut errors);
            if category.name.trim().is_empty() {
                errors.push(format!("Category '{}' has no name", category.slug));
            }
            if !seen.insert(category.slug.as_str()) {
                errors.push(format!("Duplicate category slug: {}", category.slug));
            }
        }

        let mut seen_products = HashSet::new();
        for product in &self.products {
            check_slug("product", &product.slug, &mut errors);
            if product.name.trim().is_empty() {
                errors.push(format!("Product '{}' has no name", product.slug));
            }
            if product.price.is_negative() {
                errors.push(format!("Product '{}' has a negative price", product.slug));
            }
            if let Some(category) = &product.category
                && !seen.contains(category.as_str())
            {
                errors.push(format!(
                    "Product '{}' references unknown category '{category}'",
                    product.slug
                ));
            }
            if !seen_products.insert(product.slug.as_str()) {
                errors.push(format!("Duplicate product slug: {}", product.slug));
            }
        }

        let mut seen_posts = HashSet::new();
        for post in &self.posts {
            check_slug("post", &post.slug, &mut errors);
            if post.title.trim().is_empty() {
                errors.push(format!("Post '{}' has no title", post.slug));
            }
            if !seen_posts.insert(post.slug.as_str()) {
                errors.push(format!("Duplicate post slug: {}", post.slug));
            }
        }

        errors
    }

    /// Validate and resolve into records stamped relative to `now`.
    ///
    /// # Errors
    ///
    /// Returns `SeedError::Invalid` with every validation error found.
    pub fn into_records(self, now: DateTime<Utc>) -> Result<CatalogRecords, SeedError> {
        let errors = self.validate();
        if !errors.is_empty() {
            return Err(SeedError::Invalid(errors));
        }

        let categories: Vec<Category> = self
            .categories
            .into_iter()
            .map(|c| Category {
                id: CategoryId::generate(),
                slug: c.slug,
                name: c.name,
                description: c.description,
            })
            .collect();

        let category_ids: HashMap<&str, CategoryId> = categories
            .iter()
            .map(|c| (c.slug.as_str(), c.id))
            .collect();

        let products = self
            .products
            .into_iter()
            .zip(0_i64..)
            .map(|(p, index)| Product {
                id: ProductId::generate(),
                category_id: p
                    .category
                    .as_deref()
                    .and_then(|slug| category_ids.get(slug).copied()),
                slug: p.slug,
                name: p.name,
                description: p.description,
                price: p.price,
                image_url: p.image_url,
                featured: p.featured,
                created_at: p.created_at.unwrap_or(now - Duration::minutes(index)),
            })
            .collect();

        let posts = self
            .posts
            .into_iter()
            .zip(0_i64..)
            .map(|(p, index)| BlogPost {
                id: BlogPostId::generate(),
                slug: p.slug,
                title: p.title,
                excerpt: p.excerpt,
                content: p.content,
                image_url: p.image_url,
                author: p.author,
                published: p.published,
                created_at: p.created_at.unwrap_or(now - Duration::days(index)),
            })
            .collect();

        Ok(CatalogRecords {
            categories,
            products,
            posts,
        })
    }
}

fn check_slug(kind: &str, slug: &str, errors: &mut Vec<String>) {
    let valid = !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if !valid {
        errors.push(format!("Invalid {kind} slug: '{slug}'"));
    }
}

/// Load resolved records into a memory store.
///
/// # Errors
///
/// Returns `SeedError::Store` if the store lock is poisoned.
pub fn seed_memory(store: &MemoryStore, records: CatalogRecords) -> Result<(), SeedError> {
    for category in records.categories {
        store.put_category(category)?;
    }
    for product in records.products {
        store.put_product(product)?;
    }
    for post in records.posts {
        store.put_post(post)?;
    }
    Ok(())
}

/// A memory store holding the bundled demo catalog.
///
/// # Errors
///
/// Returns `SeedError` if the bundled catalog fails to parse or validate.
pub fn demo_memory_store(now: DateTime<Utc>) -> Result<Arc<MemoryStore>, SeedError> {
    let store = Arc::new(MemoryStore::new());
    seed_memory(&store, CatalogSeed::demo()?.into_records(now)?)?;
    Ok(store)
}

/// Insert resolved records into Postgres, skipping slugs that already exist.
///
/// With `clear_existing`, journal posts and any products never ordered are
/// deleted first, along with categories left empty. Ordered products stay so
/// order lines keep their reference.
///
/// # Errors
///
/// Returns `SeedError::Database` if any statement fails.
#[instrument(skip(pool, records), fields(
    categories = records.categories.len(),
    products = records.products.len(),
    posts = records.posts.len(),
))]
pub async fn seed_postgres(
    pool: &PgPool,
    records: CatalogRecords,
    clear_existing: bool,
) -> Result<SeedResult, SeedError> {
    let mut result = SeedResult::default();

    if clear_existing {
        result.cleared = clear_catalog(pool).await?;
        info!(cleared = result.cleared, "Cleared existing catalog rows");
    }

    // Slugs may already exist with different ids; resolve by slug afterwards.
    let mut category_ids: HashMap<CategoryId, CategoryId> = HashMap::new();
    for category in &records.categories {
        let inserted = query(
            "INSERT INTO categories (id, slug, name, description) VALUES ($1, $2, $3, $4) \
             ON CONFLICT (slug) DO NOTHING",
        )
        .bind(category.id)
        .bind(&category.slug)
        .bind(&category.name)
        .bind(&category.description)
        .execute(pool)
        .await?
        .rows_affected();
        tally(&mut result, inserted, "category", &category.slug);

        let stored: CategoryId =
            query_scalar::<Postgres, CategoryId>("SELECT id FROM categories WHERE slug = $1")
                .bind(&category.slug)
                .fetch_one(pool)
                .await?;
        category_ids.insert(category.id, stored);
    }

    for product in &records.products {
        let category_id = product
            .category_id
            .and_then(|id| category_ids.get(&id).copied());
        let inserted = query(
            "INSERT INTO products \
             (id, slug, name, description, price, image_url, category_id, featured, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             ON CONFLICT (slug) DO NOTHING",
        )
        .bind(product.id)
        .bind(&product.slug)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(&product.image_url)
        .bind(category_id)
        .bind(product.featured)
        .bind(product.created_at)
        .execute(pool)
        .await?
        .rows_affected();
        tally(&mut result, inserted, "product", &product.slug);
    }

    for post in &records.posts {
        let inserted = query(
            "INSERT INTO blog_posts \
             (id, slug, title, excerpt, content, image_url, author, published, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             ON CONFLICT (slug) DO NOTHING",
        )
        .bind(post.id)
        .bind(&post.slug)
        .bind(&post.title)
        .bind(&post.excerpt)
        .bind(&post.content)
        .bind(&post.image_url)
        .bind(&post.author)
        .bind(post.published)
        .bind(post.created_at)
        .execute(pool)
        .await?
        .rows_affected();
        tally(&mut result, inserted, "post", &post.slug);
    }

    info!(
        inserted = result.inserted,
        skipped = result.skipped,
        "Catalog seeding complete"
    );

    Ok(result)
}

fn tally(result: &mut SeedResult, rows: u64, kind: &str, slug: &str) {
    if rows == 0 {
        result.skipped += 1;
        debug!(kind, slug, "Skipping existing row");
    } else {
        result.inserted += rows;
        debug!(kind, slug, "Inserted row");
    }
}

async fn clear_catalog(pool: &PgPool) -> Result<u64, sqlx::Error> {
    let posts = query("DELETE FROM blog_posts")
        .execute(pool)
        .await?
        .rows_affected();
    let products = query(
        "DELETE FROM products p \
         WHERE NOT EXISTS (SELECT 1 FROM order_items i WHERE i.product_id = p.id)",
    )
    .execute(pool)
    .await?
    .rows_affected();
    let categories = query(
        "DELETE FROM categories c \
         WHERE NOT EXISTS (SELECT 1 FROM products p WHERE p.category_id = c.id)",
    )
    .execute(pool)
    .await?
    .rows_affected();
    Ok(posts + products + categories)
}
