//! Domain models for the storefront.
//!
//! Catalog rows are read-only; cart lines and orders are written by the
//! cart and checkout services.

pub mod cart;
pub mod catalog;
pub mod order;
pub mod session;

pub use cart::{CartLine, CartSummary, MAX_LINE_QUANTITY, NewCartLine, cart_total, count_items};
pub use catalog::{BlogPost, Category, Product};
pub use order::{NewOrder, NewOrderItem, Order, OrderDetails, OrderItem};
