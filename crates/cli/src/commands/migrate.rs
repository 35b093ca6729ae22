//! Database migration commands.
//!
//! # Usage
//!
//! ```bash
//! b2b-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `PORTAL_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! # Migration Files
//!
//! `crates/portal/migrations/`

use b2b_portal::config::{ConfigError, get_database_url};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use thiserror::Error;

/// Errors that can occur while migrating.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// Database URL is missing or invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Database connection error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A migration failed to apply.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Run role cache database migrations.
///
/// # Errors
///
/// Returns an error if the database URL is missing, the connection fails,
/// or a migration fails to apply.
pub async fn portal() -> Result<(), MigrationError> {
    let _ = dotenvy::dotenv();

    let database_url = get_database_url("PORTAL_DATABASE_URL")?;

    tracing::info!("Connecting to portal database...");
    let pool = PgPool::connect(database_url.expose_secret()).await?;

    tracing::info!("Running portal migrations...");
    sqlx::migrate!("../portal/migrations").run(&pool).await?;

    tracing::info!("Portal migrations complete!");
    Ok(())
}
