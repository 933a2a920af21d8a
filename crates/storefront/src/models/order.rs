//! Orders and their line snapshots.

use chrono::{DateTime, Utc};
use serde::Serialize;

use luma_core::{
    Email, OrderId, OrderItemId, OrderNumber, OrderStatus, PaymentMethod, Price, ProductId,
};

/// A stored order. Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Order {
    pub id: OrderId,
    pub order_number: OrderNumber,
    pub customer_name: String,
    pub customer_email: Email,
    /// Empty when the customer left it blank.
    pub customer_phone: String,
    pub shipping_address: String,
    pub city: String,
    pub postal_code: String,
    /// Cart total at checkout. Shipping is not included.
    pub total_amount: Price,
    pub payment_method: PaymentMethod,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

/// Order header about to be inserted. Status always starts `pending`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub order_number: OrderNumber,
    pub customer_name: String,
    pub customer_email: Email,
    pub customer_phone: String,
    pub shipping_address: String,
    pub city: String,
    pub postal_code: String,
    pub total_amount: Price,
    pub payment_method: PaymentMethod,
}

/// An order line: product, quantity and the unit price paid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    #[sqlx(try_from = "i32")]
    pub quantity: u32,
    pub price: Price,
}

/// Order line about to be inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewOrderItem {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub price: Price,
}

/// An order with its lines, as shown on the confirmation page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderDetails {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}
