//! Cart line items and the totals derived from them.

use chrono::{DateTime, Utc};
use serde::Serialize;

use luma_core::{CartLineId, Price, ProductId, ShopperId};

use super::catalog::Product;

/// Largest quantity a single line can hold (the store column is a signed
/// 32-bit integer). Adds saturate here instead of overflowing.
pub const MAX_LINE_QUANTITY: u32 = i32::MAX.unsigned_abs();

/// A cart line as materialized for display and pricing.
///
/// `product` is the joined product row at read time; it is `None` when the
/// product has been removed from the catalog since the line was added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartLine {
    pub id: CartLineId,
    pub shopper_id: ShopperId,
    pub product_id: ProductId,
    /// Always at least 1.
    pub quantity: u32,
    pub product: Option<Product>,
    pub created_at: DateTime<Utc>,
}

impl CartLine {
    /// Current unit price, or zero when the product is gone.
    #[must_use]
    pub fn unit_price(&self) -> Price {
        self.product.as_ref().map_or(Price::ZERO, |p| p.price)
    }

    /// `unit_price × quantity`.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.unit_price().times(self.quantity)
    }
}

/// A line about to be inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewCartLine {
    pub id: CartLineId,
    pub shopper_id: ShopperId,
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Lines plus the count and total computed from the same read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CartSummary {
    pub lines: Vec<CartLine>,
    pub count: u64,
    pub total: Price,
}

impl CartSummary {
    /// Build a summary from a snapshot of lines.
    #[must_use]
    pub fn from_lines(lines: Vec<CartLine>) -> Self {
        let count = count_items(&lines);
        let total = cart_total(&lines);
        Self {
            lines,
            count,
            total,
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Sum of all quantities.
#[must_use]
pub fn count_items(lines: &[CartLine]) -> u64 {
    lines.iter().map(|line| u64::from(line.quantity)).sum()
}

/// Sum of `price × quantity`; lines without a product count as zero.
#[must_use]
pub fn cart_total(lines: &[CartLine]) -> Price {
    lines.iter().map(CartLine::line_total).sum()
}
