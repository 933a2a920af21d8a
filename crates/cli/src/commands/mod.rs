//! CLI command implementations.

pub mod migrate;
pub mod seed;

use secrecy::SecretString;

/// Database URL from `LUMA_DATABASE_URL`, falling back to `DATABASE_URL`.
///
/// Loads `.env` first if present.
pub fn database_url() -> Result<SecretString, &'static str> {
    dotenvy::dotenv().ok();

    std::env::var("LUMA_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| "LUMA_DATABASE_URL not set")
}
