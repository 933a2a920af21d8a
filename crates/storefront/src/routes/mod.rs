//! HTTP route handlers for the storefront JSON API.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                    - Liveness
//! GET    /health/ready              - Readiness (database ping)
//!
//! # Catalog
//! GET    /api/products              - Product listing (?category=<id>)
//! GET    /api/products/featured     - Featured products for the home page
//! GET    /api/products/{slug}       - Product detail, or null
//! GET    /api/categories            - Categories by name
//!
//! # Journal
//! GET    /api/journal               - Published posts, newest first
//! GET    /api/journal/{slug}        - Published post, or null
//!
//! # Cart (scoped to the session's shopper)
//! GET    /api/cart                  - Lines, count, total, shipping quote
//! DELETE /api/cart                  - Empty the cart
//! GET    /api/cart/count            - Item count badge
//! POST   /api/cart/items            - Add a product
//! PATCH  /api/cart/items/{line_id}  - Set quantity (<= 0 removes)
//! DELETE /api/cart/items/{line_id}  - Remove a line
//!
//! # Checkout (rate limited)
//! POST   /api/checkout              - Place an order
//! GET    /api/orders/{id}           - Order confirmation, or null
//!
//! # Misc
//! POST   /api/contact               - Contact form (rate limited)
//! GET    /api/navigation            - Resolve ?page=&param= to a path
//! ```

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod contact;
pub mod health;
pub mod journal;
pub mod navigation;
pub mod orders;

use axum::{
    Router,
    http::Uri,
    routing::{get, patch, post},
};

use crate::error::AppError;
use crate::middleware::form_rate_limiter;
use crate::state::AppState;

/// Create the catalog and journal routes router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(catalog::list_products))
        .route("/products/featured", get(catalog::featured_products))
        .route("/products/{slug}", get(catalog::show_product))
        .route("/categories", get(catalog::list_categories))
        .route("/journal", get(journal::list_posts))
        .route("/journal/{slug}", get(journal::show_post))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).delete(cart::clear))
        .route("/count", get(cart::count))
        .route("/items", post(cart::add_item))
        .route(
            "/items/{line_id}",
            patch(cart::update_item).delete(cart::remove_item),
        )
}

/// Create the form submission routes router.
pub fn form_routes() -> Router<AppState> {
    Router::new()
        .route("/checkout", post(checkout::submit))
        .route("/contact", post(contact::submit))
        .layer(form_rate_limiter())
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    let api = Router::new()
        .merge(catalog_routes())
        .nest("/cart", cart_routes())
        .merge(form_routes())
        .route("/orders/{id}", get(orders::show))
        .route("/navigation", get(navigation::resolve));

    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/api", api)
        .fallback(not_found)
}

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(uri.path().to_string())
}
