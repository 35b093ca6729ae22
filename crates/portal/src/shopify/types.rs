//! Domain types for Shopify B2B data.
//!
//! These are produced by the conversion layer from GraphQL wire types.

use b2b_portal_core::{CompanyContactId, CompanyId, CustomerId, ExternalRoleAssignment};
use serde::{Deserialize, Serialize};

/// Customer identity as known to Shopify.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopifyCustomer {
    /// Shopify customer ID.
    pub id: CustomerId,
    /// First name.
    pub first_name: Option<String>,
    /// Last name.
    pub last_name: Option<String>,
    /// Display name (Shopify falls back to email or phone).
    pub display_name: String,
    /// Default email address.
    pub email: Option<String>,
}

/// Company identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanySummary {
    /// Shopify company ID.
    pub id: CompanyId,
    /// Company name.
    pub name: String,
}

/// A customer's membership in one company.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanyContactProfile {
    /// Shopify company-contact ID.
    pub company_contact_id: CompanyContactId,
    /// Whether the contact is the company's main contact.
    pub is_main_contact: bool,
    /// Company the contact belongs to.
    pub company: CompanySummary,
    /// Role assignments of this contact.
    pub role_assignments: Vec<ExternalRoleAssignment>,
}

/// Everything the role service needs to know about a customer from Shopify.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerCompanyRoles {
    /// Customer identity.
    pub customer: ShopifyCustomer,
    /// Company-contact profiles, in the order Shopify returned them.
    pub profiles: Vec<CompanyContactProfile>,
}
