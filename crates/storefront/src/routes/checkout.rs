//! Checkout endpoint.

use axum::{Json, extract::State, http::StatusCode};
use tracing::instrument;

use crate::error::{Result, add_breadcrumb};
use crate::middleware::Shopper;
use crate::services::{CheckoutForm, PlacedOrder};
use crate::state::AppState;

/// POST /api/checkout
///
/// - `201` with the order id, number and confirmation path
/// - `422` with per-field messages if the form is invalid
/// - `400` if the cart is empty
/// - `500` with a generic message if the order could not be written; the
///   cart is left as it was
#[instrument(skip_all, fields(shopper = %shopper))]
pub async fn submit(
    State(state): State<AppState>,
    Shopper(shopper): Shopper,
    Json(form): Json<CheckoutForm>,
) -> Result<(StatusCode, Json<PlacedOrder>)> {
    let cart = state.cart_for(shopper);
    let placed = state.checkout().submit(&cart, &form).await?;

    add_breadcrumb(
        "checkout",
        "Order placed",
        Some(&[("order_number", placed.order_number.as_str())]),
    );

    Ok((StatusCode::CREATED, Json(placed)))
}
