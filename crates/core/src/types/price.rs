//! Type-safe price representation using decimal arithmetic.
//!
//! The shop trades in a single currency (South African Rand), so a price is
//! just a decimal amount. Display formatting is fixed and locale-independent:
//! `R` followed by the amount with `,` thousands separators and two decimals.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, AddAssign};

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Currency symbol prefixed to every formatted amount.
pub const CURRENCY_SYMBOL: &str = "R";

/// An amount of money in Rand.
///
/// Serialized as a decimal string (`"249.90"`) so no precision is lost on the
/// wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Zero rand.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a price from a decimal amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create a price from a whole number of cents.
    #[must_use]
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, 2))
    }

    /// Get the underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Price of `quantity` units at this unit price.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }

    /// Whether the amount is below zero.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Format for display, e.g. `R1,234.50`.
    #[must_use]
    pub fn display(&self) -> String {
        format_zar(self.0)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_zar(self.0))
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Price {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

// SQLx support (with postgres feature): stored as NUMERIC.
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Price {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Price {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let amount = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self(amount))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Price {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

/// Format a Rand amount for display.
///
/// Output is deterministic regardless of host locale: `R`, then the integer
/// part grouped by `,` every three digits, then `.` and exactly two decimals.
/// Midpoints round away from zero. Negative amounts are rendered with a
/// leading `-` (`-R12.00`); callers are expected not to pass them.
///
/// # Example
///
/// ```
/// use luma_core::format_zar;
/// use rust_decimal::Decimal;
///
/// assert_eq!(format_zar(Decimal::new(123_450, 2)), "R1,234.50");
/// assert_eq!(format_zar(Decimal::ZERO), "R0.00");
/// ```
#[must_use]
pub fn format_zar(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();

    // `{:.2}` pads to two decimals; grouping is applied to the integer part only.
    let plain = format!("{:.2}", rounded.abs());
    let (whole, cents) = plain.split_once('.').unwrap_or((plain.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if negative { "-" } else { "" };
    format!("{sign}{CURRENCY_SYMBOL}{grouped}.{cents}")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_format_zero() {
        assert_eq!(format_zar(Decimal::ZERO), "R0.00");
    }

    #[test]
    fn test_format_pads_decimals() {
        assert_eq!(format_zar(dec("60")), "R60.00");
        assert_eq!(format_zar(dec("249.9")), "R249.90");
    }

    #[test]
    fn test_format_groups_thousands() {
        assert_eq!(format_zar(dec("999.99")), "R999.99");
        assert_eq!(format_zar(dec("1000")), "R1,000.00");
        assert_eq!(format_zar(dec("1234.5")), "R1,234.50");
        assert_eq!(format_zar(dec("1000000")), "R1,000,000.00");
        assert_eq!(format_zar(dec("12345678.9")), "R12,345,678.90");
    }

    #[test]
    fn test_format_rounds_half_away_from_zero() {
        assert_eq!(format_zar(dec("0.005")), "R0.01");
        assert_eq!(format_zar(dec("2.675")), "R2.68");
        assert_eq!(format_zar(dec("2.674")), "R2.67");
    }

    #[test]
    fn test_format_negative_is_marked() {
        assert_eq!(format_zar(dec("-12")), "-R12.00");
        assert_eq!(format_zar(dec("-0.001")), "R0.00");
    }

    #[test]
    fn test_times_and_sum() {
        let total: Price = [Price::new(dec("100")).times(2), Price::new(dec("50")).times(1)]
            .into_iter()
            .sum();
        assert_eq!(total, Price::new(dec("250")));
        assert_eq!(total.display(), "R250.00");
    }

    #[test]
    fn test_from_cents() {
        assert_eq!(Price::from_cents(6000).amount(), dec("60.00"));
    }

    #[test]
    fn test_serde_as_string() {
        let price = Price::new(dec("249.90"));
        let json = serde_json::to_string(&price).unwrap();
        assert_eq!(json, "\"249.90\"");
        let parsed: Price = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, price);
    }
}
