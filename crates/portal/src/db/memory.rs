//! Process-local role assignment cache.
//!
//! Same insert-or-ignore semantics as `portal.role_assignments`, keyed by
//! [`RoleAssignmentKey`]. Contents are lost on restart.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use b2b_portal_core::{CompanyContactId, CompanyId, RoleAssignmentKey, RoleTier, StoreName};
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;

use super::RepositoryError;
use super::role_assignments::{CachedRoleAssignment, NewRoleAssignment, RoleAssignmentStore};

/// In-memory [`RoleAssignmentStore`].
#[derive(Debug, Default)]
pub struct InMemoryRoleAssignmentStore {
    rows: RwLock<BTreeMap<RoleAssignmentKey, CachedRoleAssignment>>,
    next_id: AtomicU64,
    write_calls: AtomicU64,
}

impl InMemoryRoleAssignmentStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `bulk_create_with_skip_duplicates` calls so far.
    #[must_use]
    pub fn write_calls(&self) -> u64 {
        self.write_calls.load(Ordering::SeqCst)
    }

    /// Snapshot of every cached row, ordered by key.
    pub async fn all(&self) -> Vec<CachedRoleAssignment> {
        self.rows.read().await.values().cloned().collect()
    }
}

#[async_trait]
impl RoleAssignmentStore for InMemoryRoleAssignmentStore {
    async fn find_all_by_contact_and_company_with_role(
        &self,
        company_contact_id: &CompanyContactId,
        company_id: &CompanyId,
        store_name: &StoreName,
    ) -> Result<Vec<CachedRoleAssignment>, RepositoryError> {
        let rows = self.rows.read().await;
        let mut found: Vec<CachedRoleAssignment> = rows
            .values()
            .filter(|row| {
                &row.company_contact_id == company_contact_id
                    && &row.company_id == company_id
                    && &row.store_name == store_name
            })
            .cloned()
            .collect();
        found.sort_by_key(|row| row.id);
        Ok(found)
    }

    async fn bulk_create_with_skip_duplicates(
        &self,
        new_rows: &[NewRoleAssignment],
    ) -> Result<u64, RepositoryError> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);

        // Validate the whole batch first so a bad row writes nothing, like a
        // failed foreign key on `portal.roles`.
        let tiers = new_rows
            .iter()
            .map(|row| {
                RoleTier::from_role_id(row.role_id).ok_or_else(|| {
                    RepositoryError::Conflict(format!("unknown role id {}", row.role_id))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut rows = self.rows.write().await;
        let mut inserted = 0;
        for (new_row, tier) in new_rows.iter().zip(tiers) {
            let role_name = tier.as_str().to_owned();
            let key = new_row.key();
            if rows.contains_key(&key) {
                continue;
            }

            let id = i64::try_from(self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
                .map_err(|_| RepositoryError::Unavailable("row id space exhausted".to_string()))?;
            let now = Utc::now();
            rows.insert(
                key,
                CachedRoleAssignment {
                    id,
                    company_contact_id: new_row.company_contact_id.clone(),
                    company_id: new_row.company_id.clone(),
                    store_name: new_row.store_name.clone(),
                    role_id: new_row.role_id,
                    role_name,
                    company_location_id: new_row.company_location_id.clone(),
                    external_assignment_id: new_row.external_assignment_id.clone(),
                    created_by: new_row.created_by.clone(),
                    updated_by: new_row.updated_by.clone(),
                    created_at: now,
                    updated_at: now,
                },
            );
            inserted += 1;
        }

        debug!(inserted, requested = new_rows.len(), "Cached role assignments in memory");
        Ok(inserted)
    }
}
