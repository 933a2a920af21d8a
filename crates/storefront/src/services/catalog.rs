//! Catalog access with an in-process cache.
//!
//! Reads never fail from the caller's point of view: a store error is logged
//! at `warn` and the caller gets an empty list or `None`, so pages degrade to
//! "no items" instead of erroring. Only successful lookups are cached; a
//! missing slug is not.
//!
//! Cart writes check the product with [`CatalogService::current_product`],
//! which bypasses the cache so a product removed from the catalog cannot be
//! added.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tracing::{instrument, warn};

use luma_core::{CategoryId, ProductId};

use crate::db::{CatalogStore, StoreError};
use crate::models::{BlogPost, Category, Product};

/// Number of featured products shown on the home page.
pub const HOME_FEATURED_LIMIT: u32 = 4;

/// Cache key per catalog query.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
enum CacheKey {
    Featured(u32),
    Products(Option<CategoryId>),
    ProductBySlug(String),
    Categories,
    Posts,
    PostBySlug(String),
}

/// Cached value types.
#[derive(Debug, Clone)]
enum CacheValue {
    Products(Arc<Vec<Product>>),
    Product(Box<Product>),
    Categories(Arc<Vec<Category>>),
    Posts(Arc<Vec<BlogPost>>),
    Post(Box<BlogPost>),
}

/// Read-only catalog queries, cached with a fixed time-to-live.
#[derive(Clone)]
pub struct CatalogService {
    inner: Arc<CatalogServiceInner>,
}

struct CatalogServiceInner {
    store: Arc<dyn CatalogStore>,
    cache: Cache<CacheKey, CacheValue>,
}

impl std::fmt::Debug for CatalogService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogService")
            .field("cached_entries", &self.inner.cache.entry_count())
            .finish_non_exhaustive()
    }
}

impl CatalogService {
    /// Create a catalog service caching results for `ttl`.
    #[must_use]
    pub fn new(store: Arc<dyn CatalogStore>, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(ttl)
            .build();

        Self {
            inner: Arc::new(CatalogServiceInner { store, cache }),
        }
    }

    /// Drop every cached entry.
    pub fn invalidate(&self) {
        self.inner.cache.invalidate_all();
    }

    async fn cached(&self, key: &CacheKey) -> Option<CacheValue> {
        self.inner.cache.get(key).await
    }

    async fn remember(&self, key: CacheKey, value: CacheValue) {
        self.inner.cache.insert(key, value).await;
    }

    /// Featured products, newest first.
    #[instrument(skip(self))]
    pub async fn featured_products(&self, limit: u32) -> Arc<Vec<Product>> {
        let key = CacheKey::Featured(limit);
        if let Some(CacheValue::Products(products)) = self.cached(&key).await {
            return products;
        }

        match self.inner.store.featured_products(limit).await {
            Ok(products) => {
                let products = Arc::new(products);
                self.remember(key, CacheValue::Products(products.clone()))
                    .await;
                products
            }
            Err(e) => {
                warn!(error = %e, "Failed to load featured products");
                Arc::default()
            }
        }
    }

    /// All products, optionally filtered by category, newest first.
    #[instrument(skip(self))]
    pub async fn products(&self, category: Option<CategoryId>) -> Arc<Vec<Product>> {
        let key = CacheKey::Products(category);
        if let Some(CacheValue::Products(products)) = self.cached(&key).await {
            return products;
        }

        match self.inner.store.products(category).await {
            Ok(products) => {
                let products = Arc::new(products);
                self.remember(key, CacheValue::Products(products.clone()))
                    .await;
                products
            }
            Err(e) => {
                warn!(error = %e, "Failed to load products");
                Arc::default()
            }
        }
    }

    /// A product by slug.
    #[instrument(skip(self))]
    pub async fn product_by_slug(&self, slug: &str) -> Option<Product> {
        let key = CacheKey::ProductBySlug(slug.to_string());
        if let Some(CacheValue::Product(product)) = self.cached(&key).await {
            return Some(*product);
        }

        match self.inner.store.product_by_slug(slug).await {
            Ok(Some(product)) => {
                self.remember(key, CacheValue::Product(Box::new(product.clone())))
                    .await;
                Some(product)
            }
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "Failed to load product");
                None
            }
        }
    }

    /// A product by id, read straight from the store.
    ///
    /// # Errors
    ///
    /// Returns the store error; unlike the cached reads this does not degrade.
    #[instrument(skip(self))]
    pub async fn current_product(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        self.inner.store.product_by_id(id).await
    }

    /// All categories ordered by name.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Arc<Vec<Category>> {
        let key = CacheKey::Categories;
        if let Some(CacheValue::Categories(categories)) = self.cached(&key).await {
            return categories;
        }

        match self.inner.store.categories().await {
            Ok(categories) => {
                let categories = Arc::new(categories);
                self.remember(key, CacheValue::Categories(categories.clone()))
                    .await;
                categories
            }
            Err(e) => {
                warn!(error = %e, "Failed to load categories");
                Arc::default()
            }
        }
    }

    /// Published journal posts, newest first.
    #[instrument(skip(self))]
    pub async fn published_posts(&self) -> Arc<Vec<BlogPost>> {
        let key = CacheKey::Posts;
        if let Some(CacheValue::Posts(posts)) = self.cached(&key).await {
            return posts;
        }

        match self.inner.store.published_posts().await {
            Ok(posts) => {
                let posts = Arc::new(posts);
                self.remember(key, CacheValue::Posts(posts.clone())).await;
                posts
            }
            Err(e) => {
                warn!(error = %e, "Failed to load journal posts");
                Arc::default()
            }
        }
    }

    /// A published journal post by slug.
    #[instrument(skip(self))]
    pub async fn post_by_slug(&self, slug: &str) -> Option<BlogPost> {
        let key = CacheKey::PostBySlug(slug.to_string());
        if let Some(CacheValue::Post(post)) = self.cached(&key).await {
            return Some(*post);
        }

        match self.inner.store.post_by_slug(slug).await {
            Ok(Some(post)) => {
                self.remember(key, CacheValue::Post(Box::new(post.clone())))
                    .await;
                Some(post)
            }
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "Failed to load journal post");
                None
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::Utc;
    use luma_core::Price;

    use crate::db::MemoryStore;

    /// Fails every query.
    struct DownStore;

    #[async_trait]
    impl CatalogStore for DownStore {
        async fn featured_products(&self, _: u32) -> Result<Vec<Product>, StoreError> {
            Err(StoreError::Unavailable("down".to_string()))
        }
        async fn products(&self, _: Option<CategoryId>) -> Result<Vec<Product>, StoreError> {
            Err(StoreError::Unavailable("down".to_string()))
        }
        async fn product_by_slug(&self, _: &str) -> Result<Option<Product>, StoreError> {
            Err(StoreError::Unavailable("down".to_string()))
        }
        async fn product_by_id(&self, _: ProductId) -> Result<Option<Product>, StoreError> {
            Err(StoreError::Unavailable("down".to_string()))
        }
        async fn categories(&self) -> Result<Vec<Category>, StoreError> {
            Err(StoreError::Unavailable("down".to_string()))
        }
        async fn published_posts(&self) -> Result<Vec<BlogPost>, StoreError> {
            Err(StoreError::Unavailable("down".to_string()))
        }
        async fn post_by_slug(&self, _: &str) -> Result<Option<BlogPost>, StoreError> {
            Err(StoreError::Unavailable("down".to_string()))
        }
    }

    /// Counts product listing queries before delegating.
    struct CountingStore {
        inner: MemoryStore,
        product_queries: AtomicUsize,
    }

    #[async_trait]
    impl CatalogStore for CountingStore {
        async fn featured_products(&self, limit: u32) -> Result<Vec<Product>, StoreError> {
            self.inner.featured_products(limit).await
        }
        async fn products(&self, c: Option<CategoryId>) -> Result<Vec<Product>, StoreError> {
            self.product_queries.fetch_add(1, Ordering::SeqCst);
            self.inner.products(c).await
        }
        async fn product_by_slug(&self, slug: &str) -> Result<Option<Product>, StoreError> {
            self.inner.product_by_slug(slug).await
        }
        async fn product_by_id(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
            self.inner.product_by_id(id).await
        }
        async fn categories(&self) -> Result<Vec<Category>, StoreError> {
            self.inner.categories().await
        }
        async fn published_posts(&self) -> Result<Vec<BlogPost>, StoreError> {
            self.inner.published_posts().await
        }
        async fn post_by_slug(&self, slug: &str) -> Result<Option<BlogPost>, StoreError> {
            self.inner.post_by_slug(slug).await
        }
    }

    fn vase() -> Product {
        Product {
            id: ProductId::generate(),
            slug: "modern-ceramic-vase".to_string(),
            name: "Modern Ceramic Vase".to_string(),
            description: String::new(),
            price: Price::from_cents(44_900),
            image_url: None,
            category_id: None,
            featured: true,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_store_failure_degrades_to_empty() {
        let catalog = CatalogService::new(Arc::new(DownStore), Duration::from_secs(300));

        assert!(catalog.featured_products(HOME_FEATURED_LIMIT).await.is_empty());
        assert!(catalog.products(None).await.is_empty());
        assert!(catalog.product_by_slug("anything").await.is_none());
        assert!(catalog.current_product(ProductId::generate()).await.is_err());
        assert!(catalog.categories().await.is_empty());
        assert!(catalog.published_posts().await.is_empty());
        assert!(catalog.post_by_slug("anything").await.is_none());
    }

    #[tokio::test]
    async fn test_results_are_cached() {
        let store = Arc::new(CountingStore {
            inner: MemoryStore::new(),
            product_queries: AtomicUsize::new(0),
        });
        store.inner.put_product(vase()).unwrap();
        let catalog = CatalogService::new(store.clone(), Duration::from_secs(300));

        assert_eq!(catalog.products(None).await.len(), 1);
        assert_eq!(catalog.products(None).await.len(), 1);
        assert_eq!(store.product_queries.load(Ordering::SeqCst), 1);

        catalog.invalidate();
        catalog.inner.cache.run_pending_tasks().await;
        assert_eq!(catalog.products(None).await.len(), 1);
        assert_eq!(store.product_queries.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_lookup_by_slug_and_id() {
        let store = Arc::new(MemoryStore::new());
        let product = vase();
        store.put_product(product.clone()).unwrap();
        let catalog = CatalogService::new(store, Duration::from_secs(300));

        assert_eq!(
            catalog.product_by_slug("modern-ceramic-vase").await,
            Some(product.clone())
        );
        assert_eq!(
            catalog.current_product(product.id).await.unwrap(),
            Some(product)
        );
        assert!(catalog.product_by_slug("missing").await.is_none());
    }

    #[tokio::test]
    async fn test_current_product_sees_deletion() {
        let store = Arc::new(MemoryStore::new());
        let product = vase();
        store.put_product(product.clone()).unwrap();
        let catalog = CatalogService::new(store.clone(), Duration::from_secs(300));

        assert_eq!(catalog.products(None).await.len(), 1);
        assert!(catalog.current_product(product.id).await.unwrap().is_some());

        store.delete_product(product.id).unwrap();

        assert_eq!(catalog.products(None).await.len(), 1, "listing stays cached");
        assert!(catalog.current_product(product.id).await.unwrap().is_none());
    }
}
