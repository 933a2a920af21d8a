//! Status and selector enums for orders.

use serde::{Deserialize, Serialize};

/// Lifecycle status of an order.
///
/// Every order is created `Pending`; the later states are set by staff
/// outside the storefront.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "order_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Paid,
    Shipped,
    Cancelled,
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Paid => write!(f, "paid"),
            Self::Shipped => write!(f, "shipped"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Payment method chosen at checkout.
///
/// Only recorded on the order; no payment is processed by the storefront.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "payment_method", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// `PayFast` card/instant EFT gateway.
    #[default]
    Payfast,
    /// Ozow instant EFT.
    Ozow,
    /// Manual bank transfer.
    Eft,
}

impl PaymentMethod {
    /// Human-readable label shown on the confirmation page.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Payfast => "PayFast",
            Self::Ozow => "Ozow",
            Self::Eft => "EFT",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Payfast => write!(f, "payfast"),
            Self::Ozow => write!(f, "ozow"),
            Self::Eft => write!(f, "eft"),
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "payfast" => Ok(Self::Payfast),
            "ozow" => Ok(Self::Ozow),
            "eft" => Ok(Self::Eft),
            other => Err(format!("invalid payment method: {other}")),
        }
    }
}
