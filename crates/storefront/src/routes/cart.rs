//! Cart endpoints.
//!
//! The cart belongs to the session's shopper. Reads degrade to an empty
//! cart if the store is down; writes report one generic failure.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use luma_core::{CartLineId, Price, ProductId};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::Shopper;
use crate::models::{CartLine, CartSummary};
use crate::routes::catalog::ProductView;
use crate::services::{Cart, CartError, ShippingQuote, shipping_quote};
use crate::state::AppState;

/// One cart line for display.
#[derive(Debug, Clone, Serialize)]
pub struct CartLineView {
    pub id: CartLineId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub unit_price: Price,
    pub line_total: Price,
    pub line_total_display: String,
    /// `None` if the product has since been removed from the catalog.
    pub product: Option<ProductView>,
}

impl From<CartLine> for CartLineView {
    fn from(line: CartLine) -> Self {
        let line_total = line.line_total();
        Self {
            id: line.id,
            product_id: line.product_id,
            quantity: line.quantity,
            unit_price: line.unit_price(),
            line_total,
            line_total_display: line_total.display(),
            product: line.product.map(ProductView::from),
        }
    }
}

/// Cart display data.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub count: u64,
    pub total: Price,
    pub total_display: String,
    pub shipping: ShippingQuote,
}

impl From<CartSummary> for CartView {
    fn from(summary: CartSummary) -> Self {
        Self {
            count: summary.count,
            total: summary.total,
            total_display: summary.total.display(),
            shipping: shipping_quote(summary.total),
            lines: summary.lines.into_iter().map(CartLineView::from).collect(),
        }
    }
}

/// Cart item count.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CartCount {
    pub count: u64,
}

/// Add to cart request.
#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: ProductId,
    pub quantity: Option<u32>,
}

/// Update quantity request. Zero or negative removes the line.
#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub quantity: i64,
}

/// Read the cart, falling back to an empty one if the store fails.
async fn view(cart: &Cart) -> CartView {
    cart.summary().await.map_or_else(
        |e| {
            tracing::warn!(error = %e, "Failed to load cart, showing empty cart");
            CartView::from(CartSummary::default())
        },
        CartView::from,
    )
}

fn parse_line_id(raw: &str) -> Result<CartLineId> {
    raw.parse()
        .map_err(|_| AppError::BadRequest(format!("Invalid cart line id: {raw}")))
}

/// GET /api/cart
#[instrument(skip_all, fields(shopper = %shopper))]
pub async fn show(State(state): State<AppState>, Shopper(shopper): Shopper) -> Json<CartView> {
    Json(view(&state.cart_for(shopper)).await)
}

/// GET /api/cart/count
#[instrument(skip_all, fields(shopper = %shopper))]
pub async fn count(State(state): State<AppState>, Shopper(shopper): Shopper) -> Json<CartCount> {
    let count = state.cart_for(shopper).count().await.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to count cart");
        0
    });
    Json(CartCount { count })
}

/// POST /api/cart/items
#[instrument(skip_all, fields(shopper = %shopper, product_id = %request.product_id))]
pub async fn add_item(
    State(state): State<AppState>,
    Shopper(shopper): Shopper,
    Json(request): Json<AddItemRequest>,
) -> Result<(StatusCode, Json<CartView>)> {
    let product = state
        .catalog()
        .current_product(request.product_id)
        .await
        .map_err(CartError::from)?
        .ok_or_else(|| AppError::NotFound(format!("product {}", request.product_id)))?;

    let cart = state.cart_for(shopper);
    cart.add(&product, request.quantity.unwrap_or(1)).await?;

    add_breadcrumb("cart", "Added to cart", Some(&[("product", product.slug.as_str())]));

    Ok((StatusCode::CREATED, Json(view(&cart).await)))
}

/// PATCH /api/cart/items/{line_id}
#[instrument(skip_all, fields(shopper = %shopper))]
pub async fn update_item(
    State(state): State<AppState>,
    Shopper(shopper): Shopper,
    Path(line_id): Path<String>,
    Json(request): Json<UpdateItemRequest>,
) -> Result<Json<CartView>> {
    let line = parse_line_id(&line_id)?;
    let cart = state.cart_for(shopper);
    cart.set_quantity(line, request.quantity).await?;

    Ok(Json(view(&cart).await))
}

/// DELETE /api/cart/items/{line_id}
#[instrument(skip_all, fields(shopper = %shopper))]
pub async fn remove_item(
    State(state): State<AppState>,
    Shopper(shopper): Shopper,
    Path(line_id): Path<String>,
) -> Result<Json<CartView>> {
    let line = parse_line_id(&line_id)?;
    let cart = state.cart_for(shopper);
    cart.remove(line).await?;

    Ok(Json(view(&cart).await))
}

/// DELETE /api/cart
#[instrument(skip_all, fields(shopper = %shopper))]
pub async fn clear(
    State(state): State<AppState>,
    Shopper(shopper): Shopper,
) -> Result<Json<CartView>> {
    let cart = state.cart_for(shopper);
    cart.clear().await?;

    Ok(Json(view(&cart).await))
}
