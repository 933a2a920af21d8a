//! Human-displayable order numbers.
//!
//! Order numbers are generated before the order row exists, from the current
//! time plus a random suffix: `LUM-1718000000000-K3J9QX2ZA`. They are unique
//! in practice, not by construction.

use core::fmt;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Prefix shared by every order number.
pub const ORDER_NUMBER_PREFIX: &str = "LUM";

/// Length of the random suffix.
const SUFFIX_LEN: usize = 9;

/// Characters the random suffix is drawn from.
const SUFFIX_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// An order number shown to the customer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderNumber(String);

impl OrderNumber {
    /// Generate a fresh order number for the current instant.
    #[must_use]
    pub fn generate() -> Self {
        Self::generate_at(Utc::now(), &mut rand::rng())
    }

    /// Generate an order number for a given instant and random source.
    #[must_use]
    pub fn generate_at<R: Rng + ?Sized>(now: DateTime<Utc>, rng: &mut R) -> Self {
        let suffix: String = (0..SUFFIX_LEN)
            .map(|_| {
                let idx = rng.random_range(0..SUFFIX_ALPHABET.len());
                char::from(SUFFIX_ALPHABET.get(idx).copied().unwrap_or(b'0'))
            })
            .collect();

        Self(format!(
            "{ORDER_NUMBER_PREFIX}-{}-{suffix}",
            now.timestamp_millis()
        ))
    }

    /// Returns the order number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for OrderNumber {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for OrderNumber {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for OrderNumber {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format() {
        let now = Utc.timestamp_millis_opt(1_718_000_000_123).unwrap();
        let number = OrderNumber::generate_at(now, &mut rand::rng());

        let mut parts = number.as_str().split('-');
        assert_eq!(parts.next(), Some("LUM"));
        assert_eq!(parts.next(), Some("1718000000123"));

        let suffix = parts.next().unwrap();
        assert_eq!(suffix.len(), 9);
        assert!(
            suffix
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase())
        );
        assert_eq!(parts.next(), None);
    }

    #[test]
    fn test_generate_differs() {
        assert_ne!(OrderNumber::generate(), OrderNumber::generate());
    }
}
