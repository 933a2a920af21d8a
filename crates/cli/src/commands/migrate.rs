//! Database migration command.
//!
//! Applies `crates/storefront/migrations/` and then creates the
//! `tower_sessions` table used by the session store. Both steps are
//! idempotent.

use thiserror::Error;
use tower_sessions_sqlx_store::PostgresStore;

use luma_storefront::db;

/// Errors from `luma-cli migrate`.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Run storefront migrations and create the session table.
///
/// # Errors
///
/// Returns `MigrationError` if the database URL is missing, the connection
/// fails, or a migration fails.
pub async fn run() -> Result<(), MigrationError> {
    let database_url = super::database_url()
        .map_err(|_| MigrationError::MissingEnvVar("LUMA_DATABASE_URL"))?;

    tracing::info!("Connecting to storefront database...");
    let pool = db::create_pool(&database_url).await?;

    tracing::info!("Running storefront migrations...");
    sqlx::migrate!("../storefront/migrations").run(&pool).await?;

    tracing::info!("Creating session table...");
    PostgresStore::new(pool.clone()).migrate().await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
