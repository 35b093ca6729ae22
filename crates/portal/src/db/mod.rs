//! Role cache storage.
//!
//! # Database: `b2b_portal`
//!
//! ## Tables
//!
//! - `portal.roles` - The two local role tiers (`admin`, `member`)
//! - `portal.role_assignments` - Shopify role assignments observed per
//!   (company, store, location, contact)
//!
//! # Migrations
//!
//! Migrations are stored in `crates/portal/migrations/` and run via:
//! ```bash
//! cargo run -p b2b-portal-cli -- migrate
//! ```

pub mod memory;
pub mod role_assignments;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use memory::InMemoryRoleAssignmentStore;
pub use role_assignments::{
    CachedRoleAssignment, NewRoleAssignment, PgRoleAssignmentStore, RoleAssignmentStore,
};

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Constraint violation.
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// The store cannot serve requests right now.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
