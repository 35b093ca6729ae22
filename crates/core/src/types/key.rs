//! Composite key identifying a role-cache row.

use core::fmt;

use super::id::{CompanyContactId, CompanyId, CompanyLocationId};
use super::store::StoreName;

/// Placeholder rendered for company-scoped rows, which have no location.
const NO_LOCATION: &str = "null";

/// Uniqueness key of a cached role assignment.
///
/// Renders as `companyId|storeName|companyLocationId|companyContactId`, with
/// `null` standing in for a missing location. The same key must come out of
/// a candidate built from Shopify data and of the row it produces once read
/// back from the cache, so both sides build it through [`RoleAssignmentKey::new`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoleAssignmentKey {
    company_id: CompanyId,
    store_name: StoreName,
    company_location_id: Option<CompanyLocationId>,
    company_contact_id: CompanyContactId,
}

impl RoleAssignmentKey {
    /// Build a key from its parts.
    #[must_use]
    pub fn new(
        company_id: &CompanyId,
        store_name: &StoreName,
        company_location_id: Option<&CompanyLocationId>,
        company_contact_id: &CompanyContactId,
    ) -> Self {
        Self {
            company_id: company_id.clone(),
            store_name: store_name.clone(),
            company_location_id: company_location_id.cloned(),
            company_contact_id: company_contact_id.clone(),
        }
    }

    /// Location part of the key, if the row is location-scoped.
    #[must_use]
    pub const fn company_location_id(&self) -> Option<&CompanyLocationId> {
        self.company_location_id.as_ref()
    }
}

impl fmt::Display for RoleAssignmentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}|{}|{}|{}",
            self.company_id,
            self.store_name,
            self.company_location_id
                .as_ref()
                .map_or(NO_LOCATION, CompanyLocationId::as_str),
            self.company_contact_id
        )
    }
}
