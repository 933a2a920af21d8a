//! Product and category endpoints.
//!
//! Catalog reads never fail: a store outage shows up as an empty list or
//! `null`.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use luma_core::CategoryId;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::models::{Category, Product};
use crate::services::HOME_FEATURED_LIMIT;
use crate::state::AppState;

/// A product with its formatted price.
#[derive(Debug, Clone, Serialize)]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    pub price_display: String,
}

impl From<Product> for ProductView {
    fn from(product: Product) -> Self {
        Self {
            price_display: product.price.display(),
            product,
        }
    }
}

fn views(products: &[Product]) -> Vec<ProductView> {
    products.iter().cloned().map(ProductView::from).collect()
}

/// Query parameters for the product listing.
#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    pub category: Option<String>,
}

/// GET /api/products
///
/// All products, newest first, optionally filtered by `?category=<id>`.
#[instrument(skip(state))]
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<Vec<ProductView>>> {
    let category = match query.category.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(
            raw.parse::<CategoryId>()
                .map_err(|_| AppError::BadRequest(format!("Invalid category id: {raw}")))?,
        ),
    };

    let products = state.catalog().products(category).await;
    Ok(Json(views(&products)))
}

/// GET /api/products/featured
#[instrument(skip(state))]
pub async fn featured_products(State(state): State<AppState>) -> Json<Vec<ProductView>> {
    let products = state.catalog().featured_products(HOME_FEATURED_LIMIT).await;
    Json(views(&products))
}

/// GET /api/products/{slug}
///
/// The product, or `null` if there is none with that slug.
#[instrument(skip(state))]
pub async fn show_product(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Json<Option<ProductView>> {
    Json(
        state
            .catalog()
            .product_by_slug(&slug)
            .await
            .map(ProductView::from),
    )
}

/// GET /api/categories
#[instrument(skip(state))]
pub async fn list_categories(State(state): State<AppState>) -> Json<Vec<Category>> {
    Json(state.catalog().categories().await.as_ref().clone())
}
