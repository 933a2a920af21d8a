//! Order confirmation lookup.

use axum::{
    Json,
    extract::{Path, State},
};
use luma_core::OrderId;
use serde::Serialize;
use tracing::instrument;

use crate::models::OrderDetails;
use crate::state::AppState;

/// An order with display strings for the confirmation page.
#[derive(Debug, Clone, Serialize)]
pub struct OrderView {
    #[serde(flatten)]
    pub details: OrderDetails,
    pub total_display: String,
    pub payment_method_label: &'static str,
}

impl From<OrderDetails> for OrderView {
    fn from(details: OrderDetails) -> Self {
        Self {
            total_display: details.order.total_amount.display(),
            payment_method_label: details.order.payment_method.label(),
            details,
        }
    }
}

/// GET /api/orders/{id}
///
/// The order with its lines, or `null` for an unknown or malformed id.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<Option<OrderView>> {
    let Ok(id) = id.parse::<OrderId>() else {
        return Json(None);
    };

    Json(state.checkout().order_details(id).await.map(OrderView::from))
}
