//! Checkout and order lookup.
//!
//! # Protocol
//!
//! 1. Validate the shipping form and reject an empty cart. Nothing is
//!    written on either failure.
//! 2. Insert the order header (`pending`, total = cart total).
//! 3. Insert one line snapshot per cart line at the current unit price
//!    (zero if the product has gone).
//! 4. Clear the cart. A failure here is logged; the order stands.
//!
//! Steps 2 and 3 are separate writes with no rollback. If step 3 fails the
//! order header remains without lines and the shopper sees the generic
//! failure message with their cart intact.

use std::collections::BTreeMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, instrument, warn};

use luma_core::{Email, OrderId, OrderNumber, PaymentMethod, Price};

use crate::db::{OrderStore, StoreError};
use crate::models::{NewOrder, NewOrderItem, OrderDetails};
use crate::navigation::Page;

use super::cart::{Cart, CartError};

/// Subtotal at which shipping becomes free.
pub const FREE_SHIPPING_THRESHOLD: Price = Price::new(Decimal::from_parts(500, 0, 0, false, 0));

/// Flat shipping fee below the threshold.
pub const FLAT_SHIPPING_FEE: Price = Price::new(Decimal::from_parts(60, 0, 0, false, 0));

/// Message shown for any failure while writing the order.
pub const ORDER_FAILED_MESSAGE: &str = "Failed to process order. Please try again.";

/// Per-field validation messages, keyed by form field name.
pub type FieldErrors = BTreeMap<&'static str, String>;

/// The checkout form as submitted.
///
/// Every field defaults to empty so a missing field reports as a
/// validation error rather than a malformed request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CheckoutForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    #[serde(alias = "postalCode")]
    pub postal_code: String,
    #[serde(alias = "paymentMethod")]
    pub payment_method: Option<String>,
}

/// A validated checkout form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShippingDetails {
    pub name: String,
    pub email: Email,
    /// Empty when not given.
    pub phone: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub payment_method: PaymentMethod,
}

impl CheckoutForm {
    /// Check required fields, email shape and payment method.
    ///
    /// # Errors
    ///
    /// Returns every failing field with a message.
    pub fn validate(&self) -> Result<ShippingDetails, FieldErrors> {
        let mut errors = FieldErrors::new();

        let name = required(&mut errors, "name", &self.name, "Please enter your full name.");
        let address = required(
            &mut errors,
            "address",
            &self.address,
            "Please enter a street address.",
        );
        let city = required(&mut errors, "city", &self.city, "Please enter a city.");
        let postal_code = required(
            &mut errors,
            "postal_code",
            &self.postal_code,
            "Please enter a postal code.",
        );

        let email = if self.email.trim().is_empty() {
            errors.insert("email", "Please enter your email address.".to_string());
            None
        } else {
            match Email::parse(&self.email) {
                Ok(email) => Some(email),
                Err(_) => {
                    errors.insert("email", "Please enter a valid email address.".to_string());
                    None
                }
            }
        };

        let payment_method = match self.payment_method.as_deref().map(str::trim) {
            None | Some("") => Some(PaymentMethod::default()),
            Some(value) => value.parse::<PaymentMethod>().map_or_else(
                |_| {
                    errors.insert(
                        "payment_method",
                        "Please choose PayFast, Ozow or EFT.".to_string(),
                    );
                    None
                },
                Some,
            ),
        };

        match (email, payment_method) {
            (Some(email), Some(payment_method)) if errors.is_empty() => Ok(ShippingDetails {
                name,
                email,
                phone: self.phone.trim().to_string(),
                address,
                city,
                postal_code,
                payment_method,
            }),
            _ => Err(errors),
        }
    }
}

fn required(errors: &mut FieldErrors, field: &'static str, value: &str, message: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        errors.insert(field, message.to_string());
    }
    value.to_string()
}

/// Errors from checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The form failed validation.
    #[error("invalid checkout form: {} field(s)", .0.len())]
    Invalid(FieldErrors),

    /// Nothing to order.
    #[error("cart is empty")]
    EmptyCart,

    /// The cart could not be read.
    #[error("failed to read cart: {0}")]
    Cart(#[from] CartError),

    /// The order header could not be written.
    #[error("failed to create order: {0}")]
    CreateOrder(#[source] StoreError),

    /// The header was written but its lines were not.
    #[error("failed to add items to order {order_id}: {source}")]
    AddItems {
        order_id: OrderId,
        #[source]
        source: StoreError,
    },
}

/// A successfully placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlacedOrder {
    pub order_id: OrderId,
    pub order_number: OrderNumber,
    pub total: Price,
    /// Confirmation page path.
    pub redirect: String,
}

/// Display-only shipping breakdown. The stored order total never includes
/// shipping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ShippingQuote {
    pub subtotal: Price,
    pub shipping: Price,
    pub total: Price,
    pub free_shipping: bool,
}

/// Shipping for a given cart subtotal: free from R500, otherwise R60.
#[must_use]
pub fn shipping_quote(subtotal: Price) -> ShippingQuote {
    let free_shipping = subtotal >= FREE_SHIPPING_THRESHOLD;
    let shipping = if free_shipping {
        Price::ZERO
    } else {
        FLAT_SHIPPING_FEE
    };
    ShippingQuote {
        subtotal,
        shipping,
        total: subtotal + shipping,
        free_shipping,
    }
}

/// Places orders and reads them back.
#[derive(Clone)]
pub struct CheckoutService {
    orders: Arc<dyn OrderStore>,
}

impl std::fmt::Debug for CheckoutService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckoutService").finish_non_exhaustive()
    }
}

impl CheckoutService {
    #[must_use]
    pub fn new(orders: Arc<dyn OrderStore>) -> Self {
        Self { orders }
    }

    /// Turn the cart into an order and clear it.
    ///
    /// # Errors
    ///
    /// - `CheckoutError::Invalid` if the form fails validation
    /// - `CheckoutError::EmptyCart` if there is nothing to order
    /// - `CheckoutError::Cart` if the cart cannot be read
    /// - `CheckoutError::CreateOrder` / `CheckoutError::AddItems` if a write
    ///   fails; the cart is left untouched
    #[instrument(skip(self, cart, form), fields(shopper = %cart.shopper()))]
    pub async fn submit(
        &self,
        cart: &Cart,
        form: &CheckoutForm,
    ) -> Result<PlacedOrder, CheckoutError> {
        let details = form.validate().map_err(CheckoutError::Invalid)?;

        let summary = cart.summary().await?;
        if summary.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let new_order = NewOrder {
            order_number: OrderNumber::generate(),
            customer_name: details.name,
            customer_email: details.email,
            customer_phone: details.phone,
            shipping_address: details.address,
            city: details.city,
            postal_code: details.postal_code,
            total_amount: summary.total,
            payment_method: details.payment_method,
        };

        let order = self
            .orders
            .insert_order(new_order)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to create order");
                CheckoutError::CreateOrder(e)
            })?;

        let items: Vec<NewOrderItem> = summary
            .lines
            .iter()
            .map(|line| NewOrderItem {
                order_id: order.id,
                product_id: line.product_id,
                quantity: line.quantity,
                price: line.unit_price(),
            })
            .collect();

        if let Err(e) = self.orders.insert_items(&items).await {
            error!(
                order_id = %order.id,
                order_number = %order.order_number,
                error = %e,
                "Failed to add order items; order left without lines"
            );
            return Err(CheckoutError::AddItems {
                order_id: order.id,
                source: e,
            });
        }

        if let Err(e) = cart.clear().await {
            warn!(order_id = %order.id, error = %e, "Order placed but cart could not be cleared");
        }

        info!(
            order_id = %order.id,
            order_number = %order.order_number,
            items = items.len(),
            total = %order.total_amount,
            "Order placed"
        );

        Ok(PlacedOrder {
            order_id: order.id,
            redirect: Page::Confirmation(order.id.to_string()).path(),
            order_number: order.order_number,
            total: order.total_amount,
        })
    }

    /// An order with its lines, or `None` if it does not exist or cannot be
    /// read.
    #[instrument(skip(self))]
    pub async fn order_details(&self, id: OrderId) -> Option<OrderDetails> {
        let order = match self.orders.order(id).await {
            Ok(Some(order)) => order,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "Failed to load order");
                return None;
            }
        };

        let items = self.orders.order_items(id).await.unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load order items");
            Vec::new()
        });

        Some(OrderDetails { order, items })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use chrono::Utc;
    use luma_core::{OrderStatus, ProductId, ShopperId};

    use crate::db::{CartStore, MemoryStore};
    use crate::models::{Order, OrderItem, Product};

    /// Delegates to a memory store but fails every line insert.
    struct FailingItems(Arc<MemoryStore>);

    #[async_trait]
    impl OrderStore for FailingItems {
        async fn insert_order(&self, order: NewOrder) -> Result<Order, StoreError> {
            self.0.insert_order(order).await
        }
        async fn insert_items(&self, _: &[NewOrderItem]) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("order_items rejected".to_string()))
        }
        async fn order(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
            self.0.order(id).await
        }
        async fn order_items(&self, id: OrderId) -> Result<Vec<OrderItem>, StoreError> {
            self.0.order_items(id).await
        }
    }

    /// Fails the header insert.
    struct FailingOrders;

    #[async_trait]
    impl OrderStore for FailingOrders {
        async fn insert_order(&self, _: NewOrder) -> Result<Order, StoreError> {
            Err(StoreError::Unavailable("orders rejected".to_string()))
        }
        async fn insert_items(&self, _: &[NewOrderItem]) -> Result<(), StoreError> {
            Ok(())
        }
        async fn order(&self, _: OrderId) -> Result<Option<Order>, StoreError> {
            Ok(None)
        }
        async fn order_items(&self, _: OrderId) -> Result<Vec<OrderItem>, StoreError> {
            Ok(Vec::new())
        }
    }

    fn form() -> CheckoutForm {
        CheckoutForm {
            name: "Thandi Nkosi".to_string(),
            email: "thandi@example.co.za".to_string(),
            phone: String::new(),
            address: "12 Long Street".to_string(),
            city: "Cape Town".to_string(),
            postal_code: "8001".to_string(),
            payment_method: Some("ozow".to_string()),
        }
    }

    fn product(store: &MemoryStore, slug: &str, rand: i64) -> Product {
        let product = Product {
            id: ProductId::generate(),
            slug: slug.to_string(),
            name: slug.to_string(),
            description: String::new(),
            price: Price::new(Decimal::from(rand)),
            image_url: None,
            category_id: None,
            featured: false,
            created_at: Utc::now(),
        };
        store.put_product(product.clone()).unwrap();
        product
    }

    async fn two_item_cart(store: &Arc<MemoryStore>) -> Cart {
        let vase = product(store, "vase", 449);
        let coasters = product(store, "coasters", 249);
        let cart = Cart::new(ShopperId::generate(), store.clone());
        cart.add(&vase, 1).await.unwrap();
        cart.add(&coasters, 2).await.unwrap();
        cart
    }

    #[test]
    fn test_validate_accepts_complete_form() {
        let details = form().validate().unwrap();
        assert_eq!(details.payment_method, PaymentMethod::Ozow);
        assert_eq!(details.email.as_str(), "thandi@example.co.za");
        assert_eq!(details.phone, "");
    }

    #[test]
    fn test_validate_reports_each_missing_field() {
        let errors = CheckoutForm::default().validate().unwrap_err();
        let fields: Vec<_> = errors.keys().copied().collect();
        assert_eq!(fields, ["address", "city", "email", "name", "postal_code"]);
    }

    #[test]
    fn test_validate_trims_and_rejects_blank() {
        let mut form = form();
        form.city = "   ".to_string();
        form.name = "  Thandi  ".to_string();
        let errors = form.validate().unwrap_err();
        assert!(errors.contains_key("city"));
        assert!(!errors.contains_key("name"));
    }

    #[test]
    fn test_validate_email_and_payment_method() {
        let mut form = form();
        form.email = "not-an-email".to_string();
        form.payment_method = Some("bitcoin".to_string());
        let errors = form.validate().unwrap_err();
        assert!(errors.contains_key("email"));
        assert!(errors.contains_key("payment_method"));
    }

    #[test]
    fn test_payment_method_defaults_to_payfast() {
        let mut form = form();
        form.payment_method = None;
        assert_eq!(form.validate().unwrap().payment_method, PaymentMethod::Payfast);
    }

    #[test]
    fn test_form_accepts_camel_case_aliases() {
        let form: CheckoutForm = serde_json::from_str(
            r#"{"name":"A","email":"a@b.co","address":"1 Road","city":"Durban","postalCode":"4001","paymentMethod":"eft"}"#,
        )
        .unwrap();
        let details = form.validate().unwrap();
        assert_eq!(details.postal_code, "4001");
        assert_eq!(details.payment_method, PaymentMethod::Eft);
    }

    #[test]
    fn test_shipping_quote() {
        let below = shipping_quote(Price::new(Decimal::from(499)));
        assert_eq!(below.shipping.display(), "R60.00");
        assert_eq!(below.total.display(), "R559.00");
        assert!(!below.free_shipping);

        let at = shipping_quote(Price::new(Decimal::from(500)));
        assert_eq!(at.shipping, Price::ZERO);
        assert_eq!(at.total.display(), "R500.00");
        assert!(at.free_shipping);
    }

    #[tokio::test]
    async fn test_checkout_writes_order_and_lines_then_clears_cart() {
        let store = Arc::new(MemoryStore::new());
        let cart = two_item_cart(&store).await;
        let checkout = CheckoutService::new(store.clone());

        let placed = checkout.submit(&cart, &form()).await.unwrap();

        assert_eq!(store.order_count().unwrap(), 1);
        assert_eq!(store.order_item_count().unwrap(), 2);
        assert!(cart.lines().await.unwrap().is_empty());
        assert_eq!(placed.redirect, format!("/confirmation/{}", placed.order_id));
        assert!(placed.order_number.as_str().starts_with("LUM-"));

        let details = checkout.order_details(placed.order_id).await.unwrap();
        assert_eq!(details.order.status, OrderStatus::Pending);
        assert_eq!(details.order.payment_method, PaymentMethod::Ozow);
        assert_eq!(details.order.total_amount, Price::new(Decimal::from(947)));
        assert_eq!(details.items.len(), 2);
        let snapshot_total: Price = details
            .items
            .iter()
            .map(|item| item.price.times(item.quantity))
            .sum();
        assert_eq!(snapshot_total, details.order.total_amount);
    }

    #[tokio::test]
    async fn test_empty_cart_writes_nothing() {
        let store = Arc::new(MemoryStore::new());
        let cart = Cart::new(ShopperId::generate(), store.clone());
        let checkout = CheckoutService::new(store.clone());

        let result = checkout.submit(&cart, &form()).await;

        assert!(matches!(result, Err(CheckoutError::EmptyCart)));
        assert_eq!(store.order_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_invalid_form_writes_nothing_and_keeps_cart() {
        let store = Arc::new(MemoryStore::new());
        let cart = two_item_cart(&store).await;
        let checkout = CheckoutService::new(store.clone());

        let mut bad = form();
        bad.email = String::new();
        let result = checkout.submit(&cart, &bad).await;

        assert!(matches!(result, Err(CheckoutError::Invalid(_))));
        assert_eq!(store.order_count().unwrap(), 0);
        assert_eq!(cart.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_order_failure_keeps_cart() {
        let store = Arc::new(MemoryStore::new());
        let cart = two_item_cart(&store).await;
        let checkout = CheckoutService::new(Arc::new(FailingOrders));

        let result = checkout.submit(&cart, &form()).await;

        assert!(matches!(result, Err(CheckoutError::CreateOrder(_))));
        assert_eq!(cart.count().await.unwrap(), 3);
    }

    /// The header and lines are written separately. When the line insert
    /// fails the header stays behind with no lines. This pins the current
    /// non-atomic behaviour so any change to it is deliberate.
    #[tokio::test]
    async fn test_item_failure_leaves_order_without_lines() {
        let store = Arc::new(MemoryStore::new());
        let cart = two_item_cart(&store).await;
        let checkout = CheckoutService::new(Arc::new(FailingItems(store.clone())));

        let result = checkout.submit(&cart, &form()).await;

        let Err(CheckoutError::AddItems { order_id, .. }) = result else {
            panic!("expected AddItems error, got {result:?}");
        };
        assert_eq!(store.order_count().unwrap(), 1);
        assert_eq!(store.order_item_count().unwrap(), 0);

        let orphan = checkout.order_details(order_id).await.unwrap();
        assert!(orphan.items.is_empty());
        assert_eq!(cart.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_missing_product_snapshots_zero_price() {
        let store = Arc::new(MemoryStore::new());
        let lamp = product(&store, "lamp", 1299);
        let shopper = ShopperId::generate();
        let cart = Cart::new(shopper, store.clone());
        cart.add(&lamp, 1).await.unwrap();

        // A line pointing at a product that no longer exists.
        store
            .insert_line(crate::models::NewCartLine {
                id: luma_core::CartLineId::generate(),
                shopper_id: shopper,
                product_id: ProductId::generate(),
                quantity: 2,
            })
            .await
            .unwrap();

        let checkout = CheckoutService::new(store.clone());
        let placed = checkout.submit(&cart, &form()).await.unwrap();
        let details = checkout.order_details(placed.order_id).await.unwrap();

        assert_eq!(details.order.total_amount, Price::new(Decimal::from(1299)));
        assert!(details.items.iter().any(|i| i.price == Price::ZERO && i.quantity == 2));
    }

    #[tokio::test]
    async fn test_unknown_order_is_none() {
        let store = Arc::new(MemoryStore::new());
        let checkout = CheckoutService::new(store);
        assert!(checkout.order_details(OrderId::generate()).await.is_none());
    }
}
