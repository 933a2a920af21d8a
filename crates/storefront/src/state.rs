//! Application state shared across handlers.

use std::sync::Arc;

use luma_core::ShopperId;
use sqlx::PgPool;

use crate::config::StorefrontConfig;
use crate::db::{MemoryStore, Stores};
use crate::services::{Cart, CatalogService, CheckoutService};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the stores and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    stores: Stores,
    catalog: CatalogService,
    checkout: CheckoutService,
    pool: Option<PgPool>,
}

impl AppState {
    /// Create state backed by `PostgreSQL`.
    #[must_use]
    pub fn postgres(config: StorefrontConfig, pool: PgPool) -> Self {
        let stores = Stores::postgres(&pool);
        Self::build(config, stores, Some(pool))
    }

    /// Create state backed by an in-process store.
    #[must_use]
    pub fn memory(config: StorefrontConfig, store: &Arc<MemoryStore>) -> Self {
        Self::build(config, Stores::memory(store), None)
    }

    fn build(config: StorefrontConfig, stores: Stores, pool: Option<PgPool>) -> Self {
        let catalog = CatalogService::new(stores.catalog.clone(), config.catalog_cache_ttl);
        let checkout = CheckoutService::new(stores.orders.clone());

        Self {
            inner: Arc::new(AppStateInner {
                config,
                stores,
                catalog,
                checkout,
                pool,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Cached catalog reads.
    #[must_use]
    pub fn catalog(&self) -> &CatalogService {
        &self.inner.catalog
    }

    /// Order placement and lookup.
    #[must_use]
    pub fn checkout(&self) -> &CheckoutService {
        &self.inner.checkout
    }

    /// The cart belonging to `shopper`.
    #[must_use]
    pub fn cart_for(&self, shopper: ShopperId) -> Cart {
        Cart::new(shopper, self.inner.stores.carts.clone())
    }

    /// The database pool, when running on `PostgreSQL`.
    #[must_use]
    pub fn pool(&self) -> Option<&PgPool> {
        self.inner.pool.as_ref()
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("backend", &self.inner.config.backend)
            .field("stores", &self.inner.stores)
            .finish_non_exhaustive()
    }
}
