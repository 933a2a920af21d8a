//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `cart` - the per-shopper cart aggregate
//! - `catalog` - cached, degrade-to-empty catalog reads
//! - `checkout` - order placement and confirmation lookup

pub mod cart;
pub mod catalog;
pub mod checkout;

pub use cart::{Cart, CartError};
pub use catalog::{CatalogService, HOME_FEATURED_LIMIT};
pub use checkout::{
    CheckoutError, CheckoutForm, CheckoutService, FieldErrors, ORDER_FAILED_MESSAGE, PlacedOrder,
    ShippingQuote, shipping_quote,
};
