//! Role assignment cache repository.
//!
//! Rows shadow the role assignments Shopify reported for a company contact.
//! They are appended when first observed and never updated or deleted here.

use async_trait::async_trait;
use b2b_portal_core::{
    CompanyContactId, CompanyId, CompanyLocationId, CustomerId, RoleAssignmentId,
    RoleAssignmentKey, RoleId, StoreName,
};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{debug, instrument};

use super::RepositoryError;

// =============================================================================
// Domain Types
// =============================================================================

/// A role assignment as stored in the cache, joined with its role name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedRoleAssignment {
    /// Primary key.
    pub id: i64,
    /// Company contact the role belongs to.
    pub company_contact_id: CompanyContactId,
    /// Company the role is granted in.
    pub company_id: CompanyId,
    /// Store the assignment was observed on.
    pub store_name: StoreName,
    /// Local role tier id.
    pub role_id: RoleId,
    /// Local role name (`admin` or `member`).
    pub role_name: String,
    /// Location scope; `None` for company-wide roles.
    pub company_location_id: Option<CompanyLocationId>,
    /// Shopify role assignment this row shadows.
    pub external_assignment_id: RoleAssignmentId,
    /// Customer whose resolution created the row.
    pub created_by: CustomerId,
    /// Customer whose resolution last touched the row.
    pub updated_by: CustomerId,
    /// When the row was created.
    pub created_at: DateTime<Utc>,
    /// When the row was last updated.
    pub updated_at: DateTime<Utc>,
}

impl CachedRoleAssignment {
    /// Composite uniqueness key of this row.
    #[must_use]
    pub fn key(&self) -> RoleAssignmentKey {
        RoleAssignmentKey::new(
            &self.company_id,
            &self.store_name,
            self.company_location_id.as_ref(),
            &self.company_contact_id,
        )
    }
}

/// Parameters for caching a newly observed role assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRoleAssignment {
    /// Company contact the role belongs to.
    pub company_contact_id: CompanyContactId,
    /// Company the role is granted in.
    pub company_id: CompanyId,
    /// Store the assignment was observed on.
    pub store_name: StoreName,
    /// Local role tier id.
    pub role_id: RoleId,
    /// Location scope; `None` for company-wide roles.
    pub company_location_id: Option<CompanyLocationId>,
    /// Shopify role assignment this row shadows.
    pub external_assignment_id: RoleAssignmentId,
    /// Customer whose resolution creates the row.
    pub created_by: CustomerId,
    /// Customer whose resolution creates the row.
    pub updated_by: CustomerId,
}

impl NewRoleAssignment {
    /// Composite uniqueness key the row will have once stored.
    #[must_use]
    pub fn key(&self) -> RoleAssignmentKey {
        RoleAssignmentKey::new(
            &self.company_id,
            &self.store_name,
            self.company_location_id.as_ref(),
            &self.company_contact_id,
        )
    }
}

// =============================================================================
// Port
// =============================================================================

/// Storage for cached role assignments.
#[async_trait]
pub trait RoleAssignmentStore: Send + Sync {
    /// All cached assignments of a contact within one company and store.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the store cannot be read.
    async fn find_all_by_contact_and_company_with_role(
        &self,
        company_contact_id: &CompanyContactId,
        company_id: &CompanyId,
        store_name: &StoreName,
    ) -> Result<Vec<CachedRoleAssignment>, RepositoryError>;

    /// Insert rows, silently skipping any whose composite key already exists.
    ///
    /// Returns the number of rows actually inserted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the write fails.
    async fn bulk_create_with_skip_duplicates(
        &self,
        rows: &[NewRoleAssignment],
    ) -> Result<u64, RepositoryError>;
}

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for `PostgreSQL` role assignment queries.
#[derive(Debug, sqlx::FromRow)]
struct RoleAssignmentRow {
    id: i64,
    company_contact_id: String,
    company_id: String,
    store_name: String,
    role_id: i32,
    role_name: String,
    company_location_id: Option<String>,
    external_assignment_id: String,
    created_by: String,
    updated_by: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<RoleAssignmentRow> for CachedRoleAssignment {
    type Error = RepositoryError;

    fn try_from(row: RoleAssignmentRow) -> Result<Self, Self::Error> {
        let store_name = StoreName::parse(&row.store_name).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid store name in database: {e}"))
        })?;

        Ok(Self {
            id: row.id,
            company_contact_id: CompanyContactId::new(row.company_contact_id),
            company_id: CompanyId::new(row.company_id),
            store_name,
            role_id: RoleId::new(row.role_id),
            role_name: row.role_name,
            company_location_id: row.company_location_id.map(CompanyLocationId::new),
            external_assignment_id: RoleAssignmentId::new(row.external_assignment_id),
            created_by: CustomerId::new(row.created_by),
            updated_by: CustomerId::new(row.updated_by),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// `PostgreSQL`-backed role assignment cache (`portal.role_assignments`).
#[derive(Clone)]
pub struct PgRoleAssignmentStore {
    pool: PgPool,
}

impl PgRoleAssignmentStore {
    /// Create a new role assignment repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoleAssignmentStore for PgRoleAssignmentStore {
    #[instrument(skip(self), fields(company_contact_id = %company_contact_id, company_id = %company_id, store = %store_name))]
    async fn find_all_by_contact_and_company_with_role(
        &self,
        company_contact_id: &CompanyContactId,
        company_id: &CompanyId,
        store_name: &StoreName,
    ) -> Result<Vec<CachedRoleAssignment>, RepositoryError> {
        let rows: Vec<RoleAssignmentRow> = sqlx::query_as(
            r"
            SELECT ra.id, ra.company_contact_id, ra.company_id, ra.store_name,
                   ra.role_id, r.name AS role_name, ra.company_location_id,
                   ra.external_assignment_id, ra.created_by, ra.updated_by,
                   ra.created_at, ra.updated_at
            FROM portal.role_assignments ra
            JOIN portal.roles r ON r.id = ra.role_id
            WHERE ra.company_contact_id = $1
              AND ra.company_id = $2
              AND ra.store_name = $3
            ORDER BY ra.id
            ",
        )
        .bind(company_contact_id)
        .bind(company_id)
        .bind(store_name)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = rows.len(), "Loaded cached role assignments");
        rows.into_iter().map(TryInto::try_into).collect()
    }

    #[instrument(skip(self, rows), fields(count = rows.len()))]
    async fn bulk_create_with_skip_duplicates(
        &self,
        rows: &[NewRoleAssignment],
    ) -> Result<u64, RepositoryError> {
        if rows.is_empty() {
            return Ok(0);
        }

        let mut contact_ids = Vec::with_capacity(rows.len());
        let mut company_ids = Vec::with_capacity(rows.len());
        let mut store_names = Vec::with_capacity(rows.len());
        let mut role_ids = Vec::with_capacity(rows.len());
        let mut location_ids = Vec::with_capacity(rows.len());
        let mut external_ids = Vec::with_capacity(rows.len());
        let mut created_by = Vec::with_capacity(rows.len());
        let mut updated_by = Vec::with_capacity(rows.len());

        for row in rows {
            contact_ids.push(row.company_contact_id.as_str().to_owned());
            company_ids.push(row.company_id.as_str().to_owned());
            store_names.push(row.store_name.as_str().to_owned());
            role_ids.push(row.role_id.as_i32());
            location_ids.push(
                row.company_location_id
                    .as_ref()
                    .map(|id| id.as_str().to_owned()),
            );
            external_ids.push(row.external_assignment_id.as_str().to_owned());
            created_by.push(row.created_by.as_str().to_owned());
            updated_by.push(row.updated_by.as_str().to_owned());
        }

        let result = sqlx::query(
            r"
            INSERT INTO portal.role_assignments
                (company_contact_id, company_id, store_name, role_id,
                 company_location_id, external_assignment_id, created_by, updated_by)
            SELECT * FROM UNNEST(
                $1::text[], $2::text[], $3::text[], $4::int4[],
                $5::text[], $6::text[], $7::text[], $8::text[]
            )
            ON CONFLICT DO NOTHING
            ",
        )
        .bind(&contact_ids)
        .bind(&company_ids)
        .bind(&store_names)
        .bind(&role_ids)
        .bind(&location_ids)
        .bind(&external_ids)
        .bind(&created_by)
        .bind(&updated_by)
        .execute(&self.pool)
        .await?;

        let inserted = result.rows_affected();
        debug!(
            inserted,
            skipped = rows.len() as u64 - inserted,
            "Bulk inserted role assignments"
        );
        Ok(inserted)
    }
}
