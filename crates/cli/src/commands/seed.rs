//! Seed the catalog from a YAML file.
//!
//! The file is parsed and validated before any database connection is made.
//! Rows whose slug already exists are skipped, so seeding twice is safe.

use std::path::Path;

use tracing::{error, info};

use luma_storefront::db::{
    self,
    seed::{CatalogSeed, SeedError, seed_postgres},
};

/// Seed the catalog.
///
/// # Arguments
///
/// * `file` - YAML catalog; the bundled demo catalog if `None`
/// * `clear_existing` - Remove existing posts and never-ordered products first
/// * `check_only` - Validate the file and stop
///
/// # Errors
///
/// Returns an error if the file cannot be read or fails validation, the
/// database URL is missing, or a database operation fails.
pub async fn catalog(
    file: Option<&Path>,
    clear_existing: bool,
    check_only: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let seed = match file {
        Some(path) => {
            if !path.exists() {
                return Err(format!("File not found: {}", path.display()).into());
            }
            info!(path = %path.display(), "Loading catalog from file");
            CatalogSeed::from_yaml(&tokio::fs::read_to_string(path).await?)?
        }
        None => {
            info!("Loading bundled demo catalog");
            CatalogSeed::demo()?
        }
    };

    info!(
        categories = seed.categories.len(),
        products = seed.products.len(),
        posts = seed.posts.len(),
        "Parsed catalog"
    );

    let records = match seed.into_records(chrono::Utc::now()) {
        Ok(records) => records,
        Err(SeedError::Invalid(errors)) => {
            error!("Catalog validation failed:");
            for err in &errors {
                error!("  - {err}");
            }
            return Err(format!("{} validation errors found", errors.len()).into());
        }
        Err(e) => return Err(e.into()),
    };

    info!("Catalog validated successfully");
    if check_only {
        return Ok(());
    }

    let database_url = super::database_url()?;
    let pool = db::create_pool(&database_url).await?;
    info!("Connected to database");

    info!(clear_existing, "Starting seeding process");
    let result = seed_postgres(&pool, records, clear_existing).await?;

    info!("Seeding complete!");
    info!("  Rows inserted: {}", result.inserted);
    info!("  Rows skipped (slug already exists): {}", result.skipped);
    if clear_existing {
        info!("  Rows cleared: {}", result.cleared);
    }

    Ok(())
}
