//! GraphQL documents and wire types for the Shopify Admin API.
//!
//! Wire types mirror the response shape exactly and stay private to the
//! `admin` module; `conversions` turns them into domain types.

use serde::Deserialize;

/// Maximum role assignments requested per company-contact profile.
pub const ROLE_ASSIGNMENTS_PAGE_SIZE: i64 = 50;

// =============================================================================
// Customer company roles
// =============================================================================

pub const CUSTOMER_COMPANY_ROLES: &str = r"
    query CustomerCompanyRoles($id: ID!, $first: Int!) {
        customer(id: $id) {
            id
            firstName
            lastName
            displayName
            defaultEmailAddress {
                emailAddress
            }
            companyContactProfiles {
                id
                isMainContact
                company {
                    id
                    name
                }
                roleAssignments(first: $first) {
                    pageInfo {
                        hasNextPage
                    }
                    edges {
                        node {
                            id
                            role {
                                name
                            }
                            company {
                                id
                            }
                            companyLocation {
                                id
                                name
                            }
                        }
                    }
                }
            }
        }
    }
";

#[derive(Debug, Deserialize)]
pub struct CustomerCompanyRolesData {
    pub customer: Option<CustomerRolesNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRolesNode {
    pub id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub display_name: String,
    pub default_email_address: Option<EmailAddressNode>,
    #[serde(default)]
    pub company_contact_profiles: Vec<CompanyContactNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailAddressNode {
    pub email_address: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyContactNode {
    pub id: String,
    #[serde(default)]
    pub is_main_contact: bool,
    pub company: CompanyNode,
    pub role_assignments: RoleAssignmentConnection,
}

#[derive(Debug, Deserialize)]
pub struct CompanyNode {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleAssignmentConnection {
    pub page_info: PageInfoNode,
    #[serde(default)]
    pub edges: Vec<RoleAssignmentEdge>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfoNode {
    pub has_next_page: bool,
}

#[derive(Debug, Deserialize)]
pub struct RoleAssignmentEdge {
    pub node: RoleAssignmentNode,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleAssignmentNode {
    pub id: String,
    pub role: Option<RoleNode>,
    pub company: Option<CompanyRefNode>,
    pub company_location: Option<CompanyLocationNode>,
}

#[derive(Debug, Deserialize)]
pub struct RoleNode {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct CompanyRefNode {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct CompanyLocationNode {
    pub id: String,
    pub name: Option<String>,
}
