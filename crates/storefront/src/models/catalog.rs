//! Catalog records: products, categories and journal posts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use luma_core::{BlogPostId, CategoryId, Price, ProductId};

/// A product in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: ProductId,
    /// URL-safe unique handle, e.g. `modern-ceramic-vase`.
    pub slug: String,
    pub name: String,
    pub description: String,
    /// Unit price in Rand. Never negative.
    pub price: Price,
    pub image_url: Option<String>,
    pub category_id: Option<CategoryId>,
    /// Shown on the home page.
    pub featured: bool,
    pub created_at: DateTime<Utc>,
}

/// A product category used to filter the shop listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    pub id: CategoryId,
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
}

/// A journal (blog) post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct BlogPost {
    pub id: BlogPostId,
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub image_url: Option<String>,
    pub author: Option<String>,
    pub published: bool,
    pub created_at: DateTime<Utc>,
}
