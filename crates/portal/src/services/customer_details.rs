//! Customer detail resolution.
//!
//! Resolves a customer's company and roles for one store:
//! 1. Fetch the customer, company-contact profiles and role assignments
//!    from Shopify
//! 2. Load the role cache for the first profile
//! 3. Reconcile assignments the cache has not seen (best effort)
//! 4. Re-read the cache and shape it into [`ResolvedRole`]s
//!
//! Reconciliation problems never fail the request. They are returned as
//! [`ResolutionWarning`]s next to the data.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use b2b_portal_core::{
    CompanyContactId, CompanyLocationId, CustomerId, ExternalRoleAssignment, RoleAssignmentId,
    RoleId, RoleTier, StoreName,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use super::role_sync::{RoleSyncService, SyncScope};
use crate::db::{CachedRoleAssignment, RepositoryError, RoleAssignmentStore};
use crate::shopify::{
    AdminShopifyError, CompanySummary, CustomerCompanyRoles, CustomerRoleSource, ShopifyCustomer,
};

// =============================================================================
// Errors
// =============================================================================

/// Errors that fail a customer detail resolution.
#[derive(Debug, Error)]
pub enum CustomerDetailsError {
    /// Shopify has no such customer.
    #[error("Customer {0} not found")]
    CustomerNotFound(CustomerId),

    /// The customer is not a contact of any company.
    #[error("This customer is not associated with a company")]
    NoCompanyContact,

    /// The customer's company contact has no role assignments.
    #[error("This customer has no roles assigned")]
    NoRolesAssigned,

    /// Fetching from Shopify failed.
    #[error("role source error: {0}")]
    Source(#[from] AdminShopifyError),

    /// Reading the role cache failed.
    #[error("role cache error: {0}")]
    Cache(#[source] RepositoryError),
}

// =============================================================================
// Response Types
// =============================================================================

/// A value produced with best-effort side effects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolved<T> {
    /// The resolved value.
    pub data: T,
    /// Problems that did not prevent resolution.
    pub warnings: Vec<ResolutionWarning>,
}

/// Non-fatal problem found while resolving customer details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolutionWarning {
    /// Syncing missing assignments into the cache failed; roles reflect the
    /// cache as it was before the attempt.
    ReconciliationFailed {
        /// Error description.
        message: String,
    },
    /// A cached row shadows an assignment Shopify no longer reports.
    #[serde(rename_all = "camelCase")]
    StaleAssignment {
        /// Shopify assignment ID of the cached row.
        external_assignment_id: RoleAssignmentId,
    },
}

/// Customer, company and roles for one store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDetailsResponse {
    /// Customer identity.
    pub customer: ShopifyCustomer,
    /// Company of the resolved profile.
    pub company: CompanySummary,
    /// Company contact of the resolved profile.
    pub company_contact_id: CompanyContactId,
    /// Roles from the cache.
    pub roles: Vec<ResolvedRole>,
}

/// A cached role shaped for callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "scope", rename_all = "camelCase")]
pub enum ResolvedRole {
    /// Role limited to one company location.
    #[serde(rename_all = "camelCase")]
    Location {
        /// Shopify role-assignment ID.
        external_assignment_id: RoleAssignmentId,
        /// Local role ID.
        role_id: RoleId,
        /// Local role tier.
        tier: RoleTier,
        /// Shopify role name, when Shopify still reports the assignment.
        role_name: Option<String>,
        /// Location the role applies to.
        company_location_id: CompanyLocationId,
        /// Location display name, when Shopify returned one.
        location_name: Option<String>,
    },
    /// Role over the whole company.
    #[serde(rename_all = "camelCase")]
    Company {
        /// Shopify role-assignment ID.
        external_assignment_id: RoleAssignmentId,
        /// Local role ID.
        role_id: RoleId,
        /// Local role tier.
        tier: RoleTier,
        /// Shopify role name, when Shopify still reports the assignment.
        role_name: Option<String>,
    },
}

impl ResolvedRole {
    /// Shopify role-assignment ID of the role.
    #[must_use]
    pub const fn external_assignment_id(&self) -> &RoleAssignmentId {
        match self {
            Self::Location {
                external_assignment_id,
                ..
            }
            | Self::Company {
                external_assignment_id,
                ..
            } => external_assignment_id,
        }
    }

    /// Local role ID of the role.
    #[must_use]
    pub const fn role_id(&self) -> RoleId {
        match self {
            Self::Location { role_id, .. } | Self::Company { role_id, .. } => *role_id,
        }
    }
}

// =============================================================================
// Service
// =============================================================================

/// Resolves customer details and keeps the role cache in step with Shopify.
#[derive(Clone)]
pub struct CustomerDetailsService {
    source: Arc<dyn CustomerRoleSource>,
    store: Arc<dyn RoleAssignmentStore>,
    sync: RoleSyncService,
}

impl CustomerDetailsService {
    /// Create a new customer details service.
    #[must_use]
    pub fn new(source: Arc<dyn CustomerRoleSource>, store: Arc<dyn RoleAssignmentStore>) -> Self {
        let sync = RoleSyncService::new(Arc::clone(&store));
        Self {
            source,
            store,
            sync,
        }
    }

    /// Resolve a customer's company and roles on `store_name`.
    ///
    /// May insert rows into the role cache. Rows are never removed; cached
    /// assignments Shopify no longer reports are returned with a
    /// [`ResolutionWarning::StaleAssignment`].
    ///
    /// # Errors
    ///
    /// - `CustomerNotFound` if Shopify has no such customer
    /// - `NoCompanyContact` if the customer has no company-contact profile
    /// - `NoRolesAssigned` if the profile has no role assignments
    /// - `Source` if the Shopify request fails
    /// - `Cache` if the role cache cannot be read
    #[instrument(skip(self), fields(store = %store_name, customer_id = %customer_id))]
    pub async fn get_customer_details(
        &self,
        store_name: &StoreName,
        customer_id: &CustomerId,
    ) -> Result<Resolved<CustomerDetailsResponse>, CustomerDetailsError> {
        let CustomerCompanyRoles { customer, profiles } = self
            .source
            .fetch_customer_roles(store_name, customer_id)
            .await?
            .ok_or_else(|| CustomerDetailsError::CustomerNotFound(customer_id.clone()))?;

        if profiles.len() > 1 {
            debug!(
                profiles = profiles.len(),
                "Customer has several company-contact profiles; using the first"
            );
        }
        let profile = profiles
            .into_iter()
            .next()
            .ok_or(CustomerDetailsError::NoCompanyContact)?;

        if profile.role_assignments.is_empty() {
            return Err(CustomerDetailsError::NoRolesAssigned);
        }

        let scope = SyncScope {
            store_name: store_name.clone(),
            company_contact_id: profile.company_contact_id.clone(),
            company_id: profile.company.id.clone(),
        };

        let cached = self.load_cache(&scope).await?;
        let mut warnings = Vec::new();

        let missing = missing_assignments(&profile.role_assignments, &cached);
        let cached = if missing.is_empty() {
            cached
        } else {
            match self
                .sync
                .sync_role_assignments(&missing, &scope, &customer.id)
                .await
            {
                Ok(outcome) => {
                    debug!(inserted = outcome.inserted, "Reconciled role cache");
                    self.load_cache(&scope).await?
                }
                Err(e) => {
                    warn!(error = %e, missing = missing.len(), "Role reconciliation failed; using cached roles");
                    warnings.push(ResolutionWarning::ReconciliationFailed {
                        message: e.to_string(),
                    });
                    cached
                }
            }
        };

        let roles = shape_roles(&cached, &profile.role_assignments, &mut warnings);

        Ok(Resolved {
            data: CustomerDetailsResponse {
                customer,
                company: profile.company,
                company_contact_id: profile.company_contact_id,
                roles,
            },
            warnings,
        })
    }

    async fn load_cache(
        &self,
        scope: &SyncScope,
    ) -> Result<Vec<CachedRoleAssignment>, CustomerDetailsError> {
        self.store
            .find_all_by_contact_and_company_with_role(
                &scope.company_contact_id,
                &scope.company_id,
                &scope.store_name,
            )
            .await
            .map_err(CustomerDetailsError::Cache)
    }
}

/// External assignments to reconcile: all of them when the cache is empty,
/// otherwise those whose ID the cache has not seen.
fn missing_assignments(
    external: &[ExternalRoleAssignment],
    cached: &[CachedRoleAssignment],
) -> Vec<ExternalRoleAssignment> {
    if cached.is_empty() {
        return external.to_vec();
    }

    let cached_ids: HashSet<&RoleAssignmentId> =
        cached.iter().map(|row| &row.external_assignment_id).collect();
    external
        .iter()
        .filter(|assignment| !cached_ids.contains(&assignment.assignment_id))
        .cloned()
        .collect()
}

/// Shape cached rows, enriching them from the matching external assignment.
fn shape_roles(
    cached: &[CachedRoleAssignment],
    external: &[ExternalRoleAssignment],
    warnings: &mut Vec<ResolutionWarning>,
) -> Vec<ResolvedRole> {
    let by_id: HashMap<&RoleAssignmentId, &ExternalRoleAssignment> = external
        .iter()
        .map(|assignment| (&assignment.assignment_id, assignment))
        .collect();

    cached
        .iter()
        .map(|row| {
            let matched = by_id.get(&row.external_assignment_id).copied();
            if matched.is_none() {
                warn!(
                    external_assignment_id = %row.external_assignment_id,
                    "Cached role assignment is no longer reported by Shopify"
                );
                warnings.push(ResolutionWarning::StaleAssignment {
                    external_assignment_id: row.external_assignment_id.clone(),
                });
            }

            let tier = RoleTier::from_role_id(row.role_id).unwrap_or(RoleTier::Member);
            let role_name = matched.map(|assignment| assignment.role_name.clone());

            match &row.company_location_id {
                Some(company_location_id) => ResolvedRole::Location {
                    external_assignment_id: row.external_assignment_id.clone(),
                    role_id: row.role_id,
                    tier,
                    role_name,
                    company_location_id: company_location_id.clone(),
                    location_name: matched
                        .and_then(|assignment| assignment.scope.location_name())
                        .map(str::to_owned),
                },
                None => ResolvedRole::Company {
                    external_assignment_id: row.external_assignment_id.clone(),
                    role_id: row.role_id,
                    tier,
                    role_name,
                },
            }
        })
        .collect()
}
