//! Integration tests for the B2B portal.
//!
//! # Running Tests
//!
//! ```bash
//! # Service and HTTP tests (no external services needed)
//! cargo test -p b2b-portal-integration-tests
//!
//! # Include PostgreSQL role cache tests
//! PORTAL_DATABASE_URL=postgres://... cargo test -p b2b-portal-integration-tests -- --ignored
//! ```
//!
//! # Fixtures
//!
//! - [`FakeRoleSource`] - Shopify stand-in returning canned customers
//! - [`FlakyStore`] - Wraps the in-memory cache and fails reads or writes on demand
//! - Builders for customers, profiles, assignments and config

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use b2b_portal::config::{PortalConfig, RoleCacheBackend, ShopifyAdminConfig};
use b2b_portal::db::{
    CachedRoleAssignment, InMemoryRoleAssignmentStore, NewRoleAssignment, RepositoryError,
    RoleAssignmentStore,
};
use b2b_portal::services::CustomerDetailsService;
use b2b_portal::shopify::{
    AdminShopifyError, CompanyContactProfile, CompanySummary, CustomerCompanyRoles,
    CustomerRoleSource, ShopifyCustomer,
};
use b2b_portal::state::AppState;
use b2b_portal_core::{
    CompanyContactId, CompanyId, CompanyLocationId, CustomerId, ExternalRoleAssignment,
    RoleAssignmentId, RoleScope, StoreName,
};
use secrecy::SecretString;
use tokio::sync::Mutex;

/// Store domain used throughout the tests.
pub const TEST_STORE: &str = "acme-b2b.myshopify.com";

/// Service token accepted by [`test_config`].
pub const TEST_SERVICE_TOKEN: &str = "kq7Vn2xLp9Rz4Tb8Wm3Yc6Hd1Jf5Gs0A";

/// Company every fixture profile belongs to.
pub const TEST_COMPANY: &str = "gid://shopify/Company/100";

/// Company contact of [`profile`].
pub const TEST_CONTACT: &str = "gid://shopify/CompanyContact/10";

// =============================================================================
// Builders
// =============================================================================

/// The test store name.
#[must_use]
pub fn store_name() -> StoreName {
    StoreName::parse(TEST_STORE).expect("test store name is valid")
}

/// Customer `gid://shopify/Customer/<n>`.
#[must_use]
pub fn customer_id(n: u64) -> CustomerId {
    CustomerId::new(format!("gid://shopify/Customer/{n}"))
}

/// A customer with the given ID.
#[must_use]
pub fn customer(n: u64) -> ShopifyCustomer {
    ShopifyCustomer {
        id: customer_id(n),
        first_name: Some("Ada".to_string()),
        last_name: Some("Lovelace".to_string()),
        display_name: "Ada Lovelace".to_string(),
        email: Some("ada@example.com".to_string()),
    }
}

/// A company-wide role assignment in [`TEST_COMPANY`].
#[must_use]
pub fn company_assignment(id: &str, role_name: &str) -> ExternalRoleAssignment {
    ExternalRoleAssignment {
        assignment_id: RoleAssignmentId::new(id),
        role_name: role_name.to_string(),
        scope: RoleScope::Company {
            company_id: CompanyId::new(TEST_COMPANY),
        },
    }
}

/// A location-scoped role assignment in [`TEST_COMPANY`].
#[must_use]
pub fn location_assignment(
    id: &str,
    role_name: &str,
    location_id: &str,
    location_name: Option<&str>,
) -> ExternalRoleAssignment {
    ExternalRoleAssignment {
        assignment_id: RoleAssignmentId::new(id),
        role_name: role_name.to_string(),
        scope: RoleScope::Location {
            company_id: CompanyId::new(TEST_COMPANY),
            company_location_id: CompanyLocationId::new(location_id),
            location_name: location_name.map(str::to_owned),
        },
    }
}

/// The [`TEST_CONTACT`] profile in [`TEST_COMPANY`].
#[must_use]
pub fn profile(role_assignments: Vec<ExternalRoleAssignment>) -> CompanyContactProfile {
    CompanyContactProfile {
        company_contact_id: CompanyContactId::new(TEST_CONTACT),
        is_main_contact: true,
        company: CompanySummary {
            id: CompanyId::new(TEST_COMPANY),
            name: "Analytical Engines".to_string(),
        },
        role_assignments,
    }
}

/// Customer `n` with the given profiles.
#[must_use]
pub fn customer_roles(n: u64, profiles: Vec<CompanyContactProfile>) -> CustomerCompanyRoles {
    CustomerCompanyRoles {
        customer: customer(n),
        profiles,
    }
}

/// Portal configuration with an in-memory role cache and test secrets.
#[must_use]
pub fn test_config() -> PortalConfig {
    PortalConfig {
        database_url: None,
        role_cache: RoleCacheBackend::Memory,
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        service_token: SecretString::from(TEST_SERVICE_TOKEN),
        shopify: ShopifyAdminConfig {
            store: store_name(),
            api_version: "2026-01".to_string(),
            access_token: SecretString::from("shpat_test"),
        },
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
    }
}

// =============================================================================
// Fake role source
// =============================================================================

/// Shopify stand-in serving canned customers for [`TEST_STORE`].
#[derive(Default)]
pub struct FakeRoleSource {
    customers: Mutex<HashMap<CustomerId, CustomerCompanyRoles>>,
    failure: Mutex<Option<String>>,
    calls: AtomicUsize,
}

impl FakeRoleSource {
    /// Create an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `roles` for its customer ID.
    pub async fn insert(&self, roles: CustomerCompanyRoles) {
        self.customers
            .lock()
            .await
            .insert(roles.customer.id.clone(), roles);
    }

    /// Make every following fetch fail with a GraphQL error.
    pub async fn fail_with(&self, message: &str) {
        *self.failure.lock().await = Some(message.to_string());
    }

    /// Number of fetches so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CustomerRoleSource for FakeRoleSource {
    async fn fetch_customer_roles(
        &self,
        store: &StoreName,
        customer_id: &CustomerId,
    ) -> Result<Option<CustomerCompanyRoles>, AdminShopifyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(message) = self.failure.lock().await.clone() {
            return Err(AdminShopifyError::GraphQL(vec![
                b2b_portal::shopify::GraphQLError {
                    message,
                    locations: vec![],
                    path: vec![],
                },
            ]));
        }
        if store.as_str() != TEST_STORE {
            return Err(AdminShopifyError::UnknownStore(store.to_string()));
        }

        Ok(self.customers.lock().await.get(customer_id).cloned())
    }
}

// =============================================================================
// Flaky store
// =============================================================================

/// In-memory role cache that can be told to fail reads or writes.
#[derive(Default)]
pub struct FlakyStore {
    inner: InMemoryRoleAssignmentStore,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    failed_writes: AtomicUsize,
}

impl FlakyStore {
    /// Create a store that works until told otherwise.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make reads fail.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make writes fail.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of writes rejected so far.
    #[must_use]
    pub fn failed_writes(&self) -> usize {
        self.failed_writes.load(Ordering::SeqCst)
    }

    /// The wrapped in-memory store.
    #[must_use]
    pub const fn inner(&self) -> &InMemoryRoleAssignmentStore {
        &self.inner
    }
}

#[async_trait]
impl RoleAssignmentStore for FlakyStore {
    async fn find_all_by_contact_and_company_with_role(
        &self,
        company_contact_id: &CompanyContactId,
        company_id: &CompanyId,
        store_name: &StoreName,
    ) -> Result<Vec<CachedRoleAssignment>, RepositoryError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable(
                "simulated read failure".to_string(),
            ));
        }
        self.inner
            .find_all_by_contact_and_company_with_role(company_contact_id, company_id, store_name)
            .await
    }

    async fn bulk_create_with_skip_duplicates(
        &self,
        rows: &[NewRoleAssignment],
    ) -> Result<u64, RepositoryError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            self.failed_writes.fetch_add(1, Ordering::SeqCst);
            return Err(RepositoryError::Unavailable(
                "simulated write failure".to_string(),
            ));
        }
        self.inner.bulk_create_with_skip_duplicates(rows).await
    }
}

// =============================================================================
// Harness
// =============================================================================

/// A resolver wired to a fake source and a flaky in-memory cache.
pub struct Harness {
    /// Fake Shopify.
    pub source: Arc<FakeRoleSource>,
    /// Role cache.
    pub store: Arc<FlakyStore>,
    /// Service under test.
    pub service: CustomerDetailsService,
}

impl Harness {
    /// Build a harness with empty source and cache.
    #[must_use]
    pub fn new() -> Self {
        let source = Arc::new(FakeRoleSource::new());
        let store = Arc::new(FlakyStore::new());
        let service = CustomerDetailsService::new(source.clone(), store.clone());
        Self {
            source,
            store,
            service,
        }
    }

    /// Application state around the harness service.
    #[must_use]
    pub fn app_state(&self) -> AppState {
        AppState::new(test_config(), None, self.service.clone())
    }

    /// Every row in the cache.
    pub async fn cached_rows(&self) -> Vec<CachedRoleAssignment> {
        self.store.inner().all().await
    }

    /// Number of write calls that reached the cache.
    #[must_use]
    pub fn cache_writes(&self) -> u64 {
        self.store.inner().write_calls()
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}
