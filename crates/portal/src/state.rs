//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;
use tracing::{info, warn};

use crate::config::{PortalConfig, RoleCacheBackend};
use crate::db::{self, InMemoryRoleAssignmentStore, PgRoleAssignmentStore, RoleAssignmentStore};
use crate::services::CustomerDetailsService;
use crate::shopify::{AdminClient, CustomerRoleSource};

/// Application state shared across all handlers.
///
/// Cheap to clone; everything lives behind one `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: PortalConfig,
    pool: Option<PgPool>,
    customer_details: CustomerDetailsService,
}

impl AppState {
    /// Create application state.
    ///
    /// `pool` is `None` when the role cache is held in memory.
    #[must_use]
    pub fn new(
        config: PortalConfig,
        pool: Option<PgPool>,
        customer_details: CustomerDetailsService,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                customer_details,
            }),
        }
    }

    /// Get the portal configuration.
    #[must_use]
    pub fn config(&self) -> &PortalConfig {
        &self.inner.config
    }

    /// Get the database pool, if the role cache is in `PostgreSQL`.
    #[must_use]
    pub fn pool(&self) -> Option<&PgPool> {
        self.inner.pool.as_ref()
    }

    /// Get the customer details service.
    #[must_use]
    pub fn customer_details(&self) -> &CustomerDetailsService {
        &self.inner.customer_details
    }
}

/// Wire the customer details service to Shopify and the configured role cache.
///
/// Returns the pool alongside the service when the cache is in `PostgreSQL`.
///
/// # Errors
///
/// Returns `sqlx::Error` if the database pool cannot be created.
pub async fn build_customer_details(
    config: &PortalConfig,
) -> Result<(CustomerDetailsService, Option<PgPool>), sqlx::Error> {
    let source: Arc<dyn CustomerRoleSource> = Arc::new(AdminClient::new(&config.shopify));

    let (store, pool): (Arc<dyn RoleAssignmentStore>, Option<PgPool>) =
        match (config.role_cache, &config.database_url) {
            (RoleCacheBackend::Postgres, Some(url)) => {
                let pool = db::create_pool(url).await?;
                info!("Database pool created");
                (Arc::new(PgRoleAssignmentStore::new(pool.clone())), Some(pool))
            }
            (RoleCacheBackend::Postgres, None) => {
                return Err(sqlx::Error::Configuration(
                    "PORTAL_DATABASE_URL is required for the postgres role cache".into(),
                ));
            }
            (RoleCacheBackend::Memory, _) => {
                warn!("Role cache is in memory; cached roles are lost on restart");
                (Arc::new(InMemoryRoleAssignmentStore::new()), None)
            }
        };

    Ok((CustomerDetailsService::new(source, store), pool))
}
