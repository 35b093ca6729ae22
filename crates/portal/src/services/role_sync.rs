//! Role assignment reconciliation.
//!
//! Copies Shopify role assignments that the cache has not seen yet into the
//! role cache. The flow is:
//! 1. Re-read the cache for the contact's (company, store) scope
//! 2. Build the composite key of every candidate
//! 3. Drop candidates whose key is already cached or repeated in the batch
//! 4. Insert the rest with skip-duplicates semantics
//!
//! There is no locking between the read and the write. Two concurrent syncs
//! for one contact both pass step 3 and the store's insert-or-ignore makes the
//! second write a no-op.

use std::collections::HashSet;
use std::sync::Arc;

use b2b_portal_core::{
    CompanyContactId, CompanyId, CustomerId, ExternalRoleAssignment, RoleAssignmentKey, StoreName,
};
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::db::{NewRoleAssignment, RepositoryError, RoleAssignmentStore};

/// Errors from a reconciliation run.
#[derive(Debug, Error)]
pub enum RoleSyncError {
    /// The cache could not be read before diffing.
    #[error("failed to read role cache: {0}")]
    Read(#[source] RepositoryError),

    /// The bulk insert failed.
    #[error("failed to write role cache: {0}")]
    Write(#[source] RepositoryError),
}

/// The (contact, company, store) a reconciliation run is limited to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncScope {
    /// Store the assignments were read from.
    pub store_name: StoreName,
    /// Company contact that holds the assignments.
    pub company_contact_id: CompanyContactId,
    /// Company of the contact profile.
    pub company_id: CompanyId,
}

/// Counts from one reconciliation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncOutcome {
    /// Candidates handed to the run.
    pub candidates: usize,
    /// Candidates dropped before writing: key already cached, or repeated
    /// earlier in the same batch.
    pub already_cached: usize,
    /// Rows the store actually inserted.
    pub inserted: u64,
    /// Rows sent to the store that it skipped as duplicates (lost races).
    pub skipped_by_store: u64,
}

/// Reconciles Shopify role assignments into the role cache.
#[derive(Clone)]
pub struct RoleSyncService {
    store: Arc<dyn RoleAssignmentStore>,
}

impl RoleSyncService {
    /// Create a new role sync service.
    #[must_use]
    pub fn new(store: Arc<dyn RoleAssignmentStore>) -> Self {
        Self { store }
    }

    /// Insert every candidate whose composite key is not cached yet.
    ///
    /// Never updates or deletes existing rows. `actor` is recorded as both
    /// `created_by` and `updated_by`.
    ///
    /// # Errors
    ///
    /// Returns `RoleSyncError` if the cache read or the bulk insert fails.
    #[instrument(
        skip(self, candidates, scope),
        fields(
            store = %scope.store_name,
            company_contact_id = %scope.company_contact_id,
            candidate_count = candidates.len(),
        )
    )]
    pub async fn sync_role_assignments(
        &self,
        candidates: &[ExternalRoleAssignment],
        scope: &SyncScope,
        actor: &CustomerId,
    ) -> Result<SyncOutcome, RoleSyncError> {
        let cached = self
            .store
            .find_all_by_contact_and_company_with_role(
                &scope.company_contact_id,
                &scope.company_id,
                &scope.store_name,
            )
            .await
            .map_err(RoleSyncError::Read)?;

        let mut seen: HashSet<RoleAssignmentKey> = cached.iter().map(|row| row.key()).collect();
        let rows: Vec<NewRoleAssignment> = candidates
            .iter()
            .map(|candidate| new_row(candidate, scope, actor))
            .filter(|row| seen.insert(row.key()))
            .collect();

        let mut outcome = SyncOutcome {
            candidates: candidates.len(),
            already_cached: candidates.len() - rows.len(),
            ..SyncOutcome::default()
        };

        if rows.is_empty() {
            debug!(already_cached = outcome.already_cached, "Role cache already up to date");
            return Ok(outcome);
        }

        let inserted = self
            .store
            .bulk_create_with_skip_duplicates(&rows)
            .await
            .map_err(RoleSyncError::Write)?;

        outcome.inserted = inserted;
        outcome.skipped_by_store = (rows.len() as u64).saturating_sub(inserted);

        info!(
            inserted = outcome.inserted,
            already_cached = outcome.already_cached,
            skipped_by_store = outcome.skipped_by_store,
            "Synced role assignments"
        );
        Ok(outcome)
    }
}

/// Build the cache row for one candidate, mapping its role name to a tier.
fn new_row(
    candidate: &ExternalRoleAssignment,
    scope: &SyncScope,
    actor: &CustomerId,
) -> NewRoleAssignment {
    NewRoleAssignment {
        company_contact_id: scope.company_contact_id.clone(),
        company_id: scope.company_id.clone(),
        store_name: scope.store_name.clone(),
        role_id: candidate.tier().role_id(),
        company_location_id: candidate.scope.company_location_id().cloned(),
        external_assignment_id: candidate.assignment_id.clone(),
        created_by: actor.clone(),
        updated_by: actor.clone(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use b2b_portal_core::{CompanyLocationId, RoleAssignmentId, RoleId, RoleScope};

    use super::*;
    use crate::db::InMemoryRoleAssignmentStore;

    fn scope() -> SyncScope {
        SyncScope {
            store_name: StoreName::parse("acme.myshopify.com").unwrap(),
            company_contact_id: CompanyContactId::new("gid://shopify/CompanyContact/10"),
            company_id: CompanyId::new("gid://shopify/Company/100"),
        }
    }

    fn actor() -> CustomerId {
        CustomerId::new("gid://shopify/Customer/1")
    }

    fn location_assignment(id: &str, role: &str, location: &str) -> ExternalRoleAssignment {
        ExternalRoleAssignment {
            assignment_id: RoleAssignmentId::new(id),
            role_name: role.to_string(),
            scope: RoleScope::Location {
                company_id: CompanyId::new("gid://shopify/Company/100"),
                company_location_id: CompanyLocationId::new(location),
                location_name: None,
            },
        }
    }

    fn company_assignment(id: &str, role: &str) -> ExternalRoleAssignment {
        ExternalRoleAssignment {
            assignment_id: RoleAssignmentId::new(id),
            role_name: role.to_string(),
            scope: RoleScope::Company {
                company_id: CompanyId::new("gid://shopify/Company/100"),
            },
        }
    }

    #[test]
    fn test_new_row_maps_role_tier() {
        let admin = new_row(&location_assignment("a", "Location Admin", "L1"), &scope(), &actor());
        assert_eq!(admin.role_id, RoleId::ADMIN);
        assert_eq!(admin.company_location_id.unwrap().as_str(), "L1");
        assert_eq!(admin.created_by, actor());
        assert_eq!(admin.updated_by, actor());

        let member = new_row(&company_assignment("b", "Ordering only"), &scope(), &actor());
        assert_eq!(member.role_id, RoleId::MEMBER);
        assert!(member.company_location_id.is_none());
    }

    #[tokio::test]
    async fn test_sync_inserts_missing_rows() {
        let store = Arc::new(InMemoryRoleAssignmentStore::new());
        let service = RoleSyncService::new(store.clone());

        let outcome = service
            .sync_role_assignments(
                &[
                    location_assignment("a", "Location Admin", "L1"),
                    company_assignment("b", "Buyer"),
                ],
                &scope(),
                &actor(),
            )
            .await
            .unwrap();

        assert_eq!(
            outcome,
            SyncOutcome {
                candidates: 2,
                already_cached: 0,
                inserted: 2,
                skipped_by_store: 0,
            }
        );
        assert_eq!(store.all().await.len(), 2);
    }

    #[tokio::test]
    async fn test_sync_skips_cached_keys_without_writing() {
        let store = Arc::new(InMemoryRoleAssignmentStore::new());
        let service = RoleSyncService::new(store.clone());
        let candidates = [location_assignment("a", "Location Admin", "L1")];

        service
            .sync_role_assignments(&candidates, &scope(), &actor())
            .await
            .unwrap();
        let outcome = service
            .sync_role_assignments(&candidates, &scope(), &actor())
            .await
            .unwrap();

        assert_eq!(outcome.already_cached, 1);
        assert_eq!(outcome.inserted, 0);
        assert_eq!(store.write_calls(), 1);
    }

    #[tokio::test]
    async fn test_sync_drops_repeated_keys_in_batch() {
        let store = Arc::new(InMemoryRoleAssignmentStore::new());
        let service = RoleSyncService::new(store.clone());

        // Two company-wide assignments share one composite key.
        let outcome = service
            .sync_role_assignments(
                &[company_assignment("a", "Admin"), company_assignment("b", "Buyer")],
                &scope(),
                &actor(),
            )
            .await
            .unwrap();

        assert_eq!(outcome.inserted, 1);
        assert_eq!(outcome.already_cached, 1);
        let rows = store.all().await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].external_assignment_id.as_str(), "a");
        assert_eq!(rows[0].role_id, RoleId::ADMIN);
    }

    #[tokio::test]
    async fn test_sync_with_no_candidates_does_not_write() {
        let store = Arc::new(InMemoryRoleAssignmentStore::new());
        let service = RoleSyncService::new(store.clone());

        let outcome = service
            .sync_role_assignments(&[], &scope(), &actor())
            .await
            .unwrap();

        assert_eq!(outcome, SyncOutcome::default());
        assert_eq!(store.write_calls(), 0);
    }
}
