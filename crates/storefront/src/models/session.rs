//! Session keys.
//!
//! The session holds nothing but the anonymous shopper id; cart contents
//! live in the store, keyed by that id.

/// Session keys used by the storefront.
pub mod keys {
    /// Key for the anonymous shopper id that scopes the cart.
    pub const SHOPPER_ID: &str = "shopper_id";
}
