//! The cart aggregate.
//!
//! A [`Cart`] is one shopper's view over a [`CartStore`]. It is built per
//! request from application state and the shopper id, then handed to
//! whichever handler or service needs it. Every mutation goes straight to
//! the store; nothing is cached on the aggregate, so totals always reflect
//! current product prices.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, instrument};

use luma_core::{CartLineId, Price, ShopperId};

use crate::db::{CartStore, StoreError};
use crate::models::{
    CartLine, CartSummary, MAX_LINE_QUANTITY, NewCartLine, Product, cart_total, count_items,
};

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// The cart store failed.
    #[error("cart store error: {0}")]
    Store(#[from] StoreError),
}

/// One shopper's cart.
#[derive(Clone)]
pub struct Cart {
    shopper: ShopperId,
    store: Arc<dyn CartStore>,
}

impl std::fmt::Debug for Cart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cart")
            .field("shopper", &self.shopper)
            .finish_non_exhaustive()
    }
}

impl Cart {
    #[must_use]
    pub fn new(shopper: ShopperId, store: Arc<dyn CartStore>) -> Self {
        Self { shopper, store }
    }

    /// The shopper this cart belongs to.
    #[must_use]
    pub const fn shopper(&self) -> ShopperId {
        self.shopper
    }

    /// Current lines with product snapshots, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Store` if the store cannot be read.
    pub async fn lines(&self) -> Result<Vec<CartLine>, CartError> {
        Ok(self.store.lines(self.shopper).await?)
    }

    /// Add `quantity` of a product.
    ///
    /// Merges into the existing line for the same product if there is one,
    /// otherwise creates a line with a fresh id. Quantities saturate at
    /// [`MAX_LINE_QUANTITY`]. Adding zero does nothing.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Store` if the store cannot be read or written.
    #[instrument(skip(self, product), fields(shopper = %self.shopper, product = %product.id))]
    pub async fn add(&self, product: &Product, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 {
            return Ok(());
        }

        let lines = self.store.lines(self.shopper).await?;
        if let Some(existing) = lines.iter().find(|line| line.product_id == product.id) {
            let merged = existing
                .quantity
                .saturating_add(quantity)
                .min(MAX_LINE_QUANTITY);
            debug!(line = %existing.id, merged, "Merging into existing line");
            self.store
                .update_quantity(self.shopper, existing.id, merged)
                .await?;
        } else {
            let line = NewCartLine {
                id: CartLineId::generate(),
                shopper_id: self.shopper,
                product_id: product.id,
                quantity: quantity.min(MAX_LINE_QUANTITY),
            };
            debug!(line = %line.id, "Creating new line");
            self.store.insert_line(line).await?;
        }
        Ok(())
    }

    /// Replace a line's quantity. Zero or negative removes the line; an
    /// unknown line id is ignored.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Store` if the store cannot be written.
    #[instrument(skip(self), fields(shopper = %self.shopper))]
    pub async fn set_quantity(&self, line: CartLineId, quantity: i64) -> Result<(), CartError> {
        if quantity <= 0 {
            return self.remove(line).await;
        }

        let quantity = u32::try_from(quantity)
            .unwrap_or(MAX_LINE_QUANTITY)
            .min(MAX_LINE_QUANTITY);
        self.store
            .update_quantity(self.shopper, line, quantity)
            .await?;
        Ok(())
    }

    /// Remove a line if present.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Store` if the store cannot be written.
    #[instrument(skip(self), fields(shopper = %self.shopper))]
    pub async fn remove(&self, line: CartLineId) -> Result<(), CartError> {
        self.store.delete_line(self.shopper, line).await?;
        Ok(())
    }

    /// Remove every line.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Store` if the store cannot be written.
    #[instrument(skip(self), fields(shopper = %self.shopper))]
    pub async fn clear(&self) -> Result<(), CartError> {
        self.store.clear(self.shopper).await?;
        Ok(())
    }

    /// Sum of all line quantities.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Store` if the store cannot be read.
    pub async fn count(&self) -> Result<u64, CartError> {
        Ok(count_items(&self.lines().await?))
    }

    /// Sum of `price × quantity` at current prices.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Store` if the store cannot be read.
    pub async fn total(&self) -> Result<Price, CartError> {
        Ok(cart_total(&self.lines().await?))
    }

    /// Lines, count and total from a single read.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Store` if the store cannot be read.
    pub async fn summary(&self) -> Result<CartSummary, CartError> {
        Ok(CartSummary::from_lines(self.lines().await?))
    }
}
