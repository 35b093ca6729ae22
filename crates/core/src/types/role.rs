//! Role tiers and role-assignment scopes.
//!
//! Shopify lets merchants define any number of B2B roles ("Location admin",
//! "Ordering only", custom roles...). The portal collapses them into two
//! local tiers; see [`RoleTier::from_role_name`].

use serde::{Deserialize, Serialize};

use super::id::{CompanyId, CompanyLocationId, RoleAssignmentId, RoleId};

/// Local permission tier for a cached role assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleTier {
    /// Can manage the company or location (users, addresses, approvals).
    Admin,
    /// Can browse and order.
    Member,
}

impl RoleTier {
    /// Map a Shopify role name to a local tier.
    ///
    /// Any name containing "admin" (case-insensitive) is [`RoleTier::Admin`].
    ///
    /// ```
    /// use b2b_portal_core::RoleTier;
    ///
    /// assert_eq!(RoleTier::from_role_name("Location Admin"), RoleTier::Admin);
    /// assert_eq!(RoleTier::from_role_name("ADMINISTRATOR"), RoleTier::Admin);
    /// assert_eq!(RoleTier::from_role_name("Ordering only"), RoleTier::Member);
    /// ```
    #[must_use]
    pub fn from_role_name(name: &str) -> Self {
        if name.to_lowercase().contains("admin") {
            Self::Admin
        } else {
            Self::Member
        }
    }

    /// The local role ID stored in the cache for this tier.
    #[must_use]
    pub const fn role_id(self) -> RoleId {
        match self {
            Self::Admin => RoleId::ADMIN,
            Self::Member => RoleId::MEMBER,
        }
    }

    /// Reverse of [`RoleTier::role_id`].
    #[must_use]
    pub fn from_role_id(id: RoleId) -> Option<Self> {
        if id == RoleId::ADMIN {
            Some(Self::Admin)
        } else if id == RoleId::MEMBER {
            Some(Self::Member)
        } else {
            None
        }
    }

    /// Name of the tier as stored in `portal.roles`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Member => "member",
        }
    }
}

/// What a role assignment applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "camelCase")]
pub enum RoleScope {
    /// The role applies to the whole company.
    #[serde(rename_all = "camelCase")]
    Company {
        /// Company the contact belongs to.
        company_id: CompanyId,
    },
    /// The role applies to a single company location.
    #[serde(rename_all = "camelCase")]
    Location {
        /// Company the location belongs to.
        company_id: CompanyId,
        /// Location the role is scoped to.
        company_location_id: CompanyLocationId,
        /// Display name of the location, when Shopify returned one.
        location_name: Option<String>,
    },
}

impl RoleScope {
    /// Company the scope belongs to.
    #[must_use]
    pub const fn company_id(&self) -> &CompanyId {
        match self {
            Self::Company { company_id } | Self::Location { company_id, .. } => company_id,
        }
    }

    /// Location the scope is limited to, if any.
    #[must_use]
    pub const fn company_location_id(&self) -> Option<&CompanyLocationId> {
        match self {
            Self::Company { .. } => None,
            Self::Location {
                company_location_id,
                ..
            } => Some(company_location_id),
        }
    }

    /// Display name of the location, if any.
    #[must_use]
    pub fn location_name(&self) -> Option<&str> {
        match self {
            Self::Company { .. } => None,
            Self::Location { location_name, .. } => location_name.as_deref(),
        }
    }
}

/// A role assignment as reported by Shopify.
///
/// This is the source of truth; the local cache only shadows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalRoleAssignment {
    /// Shopify role-assignment ID.
    pub assignment_id: RoleAssignmentId,
    /// Shopify role name (merchant-defined).
    pub role_name: String,
    /// What the role applies to.
    pub scope: RoleScope,
}

impl ExternalRoleAssignment {
    /// Local tier for this assignment.
    #[must_use]
    pub fn tier(&self) -> RoleTier {
        RoleTier::from_role_name(&self.role_name)
    }
}
