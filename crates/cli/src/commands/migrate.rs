//! Database migration commands.
//!
//! # Usage
//!
//! ```bash
//! tw-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to
//!   `DATABASE_URL`)
//!
//! Migrations live in `crates/storefront/migrations/` and are embedded at
//! compile time.

use thiserror::Error;

use tidewater_storefront::config::database_url_from_env;
use tidewater_storefront::db::create_pool;

/// Errors that can occur while migrating.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// Neither database URL variable is set.
    #[error("Missing environment variable: STOREFRONT_DATABASE_URL (or DATABASE_URL)")]
    MissingDatabaseUrl,

    /// Database connection error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A migration failed to apply.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Run storefront database migrations.
///
/// # Errors
///
/// Returns `MigrationError` if the URL is missing, the database is unreachable,
/// or a migration fails.
pub async fn run() -> Result<(), MigrationError> {
    let database_url = database_url_from_env().ok_or(MigrationError::MissingDatabaseUrl)?;

    tracing::info!("Connecting to storefront database...");
    let pool = create_pool(&database_url).await?;

    tracing::info!("Running storefront migrations...");
    sqlx::migrate!("../storefront/migrations").run(&pool).await?;

    tracing::info!("Storefront migrations complete");
    Ok(())
}
