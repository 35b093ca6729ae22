//! Role backfill command.
//!
//! Runs the same resolution as `GET /api/stores/{store}/customers/{id}/details`
//! once, writing any missing role assignments into the role cache, and prints
//! the resolved JSON to stdout.
//!
//! # Usage
//!
//! ```bash
//! b2b-cli sync-roles --store acme-b2b.myshopify.com --customer 7421
//! ```
//!
//! # Environment Variables
//!
//! - `PORTAL_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `SHOPIFY_STORE` - Store the Admin API token belongs to
//! - `SHOPIFY_ADMIN_ACCESS_TOKEN` - Admin API access token
//! - `SHOPIFY_API_VERSION` - API version (optional)

use std::sync::Arc;

use b2b_portal::config::{ConfigError, ShopifyAdminConfig, get_database_url};
use b2b_portal::db::{PgRoleAssignmentStore, create_pool};
use b2b_portal::services::{CustomerDetailsError, CustomerDetailsService};
use b2b_portal::shopify::AdminClient;
use b2b_portal_core::{CustomerId, GidError, StoreName, StoreNameError};
use thiserror::Error;

/// Errors that can occur during a role backfill.
#[derive(Debug, Error)]
pub enum SyncRolesError {
    /// Configuration is missing or invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Invalid `--store` argument.
    #[error("Invalid store: {0}")]
    InvalidStore(#[from] StoreNameError),

    /// Invalid `--customer` argument.
    #[error("Invalid customer ID: {0}")]
    InvalidCustomer(#[from] GidError),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resolution failed.
    #[error(transparent)]
    Resolve(#[from] CustomerDetailsError),

    /// Result could not be rendered.
    #[error("Failed to render result: {0}")]
    Render(#[from] serde_json::Error),
}

/// Resolve one customer against the configured store and database.
///
/// # Errors
///
/// Returns an error if arguments or configuration are invalid, the database
/// is unreachable, or resolution fails.
pub async fn run(store: &str, customer: &str) -> Result<(), SyncRolesError> {
    let _ = dotenvy::dotenv();

    let store = StoreName::parse(store)?;
    let customer_id = CustomerId::from_input(customer)?;

    let shopify = ShopifyAdminConfig::from_env()?;
    let database_url = get_database_url("PORTAL_DATABASE_URL")?;
    let pool = create_pool(&database_url).await?;

    let service = CustomerDetailsService::new(
        Arc::new(AdminClient::new(&shopify)),
        Arc::new(PgRoleAssignmentStore::new(pool)),
    );

    let resolved = service.get_customer_details(&store, &customer_id).await?;
    for warning in &resolved.warnings {
        tracing::warn!(?warning, "Resolution warning");
    }

    #[allow(clippy::print_stdout)]
    {
        println!("{}", serde_json::to_string_pretty(&resolved)?);
    }

    Ok(())
}
