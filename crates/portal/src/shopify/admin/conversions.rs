//! Type conversions from GraphQL wire types to domain types.

use b2b_portal_core::{
    CompanyContactId, CompanyId, CompanyLocationId, CustomerId, ExternalRoleAssignment,
    RoleAssignmentId, RoleScope,
};
use tracing::warn;

use crate::shopify::types::{
    CompanySummary, CompanyContactProfile, CustomerCompanyRoles, ShopifyCustomer,
};

use super::queries::{CompanyContactNode, CustomerRolesNode, RoleAssignmentNode};

// =============================================================================
// CustomerCompanyRoles conversions
// =============================================================================

pub fn convert_customer_company_roles(node: CustomerRolesNode) -> CustomerCompanyRoles {
    let customer = ShopifyCustomer {
        id: CustomerId::new(node.id),
        first_name: node.first_name,
        last_name: node.last_name,
        display_name: node.display_name,
        email: node.default_email_address.map(|e| e.email_address),
    };

    let profiles = node
        .company_contact_profiles
        .into_iter()
        .map(convert_company_contact)
        .collect();

    CustomerCompanyRoles { customer, profiles }
}

fn convert_company_contact(node: CompanyContactNode) -> CompanyContactProfile {
    let company_id = CompanyId::new(node.company.id);

    if node.role_assignments.page_info.has_next_page {
        warn!(
            company_contact_id = %node.id,
            "Company contact has more role assignments than one page; extra pages are ignored"
        );
    }

    let role_assignments = node
        .role_assignments
        .edges
        .into_iter()
        .filter_map(|edge| convert_role_assignment(edge.node, &company_id))
        .collect();

    CompanyContactProfile {
        company_contact_id: CompanyContactId::new(node.id),
        is_main_contact: node.is_main_contact,
        company: CompanySummary {
            id: company_id,
            name: node.company.name,
        },
        role_assignments,
    }
}

/// Convert one assignment; `None` when the node has no role attached.
fn convert_role_assignment(
    node: RoleAssignmentNode,
    profile_company_id: &CompanyId,
) -> Option<ExternalRoleAssignment> {
    let Some(role) = node.role else {
        warn!(assignment_id = %node.id, "Dropping role assignment without a role");
        return None;
    };

    let company_id = node
        .company
        .map_or_else(|| profile_company_id.clone(), |c| CompanyId::new(c.id));

    let scope = match node.company_location {
        Some(location) => RoleScope::Location {
            company_id,
            company_location_id: CompanyLocationId::new(location.id),
            location_name: location.name,
        },
        None => RoleScope::Company { company_id },
    };

    Some(ExternalRoleAssignment {
        assignment_id: RoleAssignmentId::new(node.id),
        role_name: role.name,
        scope,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use serde_json::json;

    use super::super::queries::CustomerCompanyRolesData;
    use super::*;

    fn sample_response() -> serde_json::Value {
        json!({
            "customer": {
                "id": "gid://shopify/Customer/1",
                "firstName": "Ada",
                "lastName": "Lovelace",
                "displayName": "Ada Lovelace",
                "defaultEmailAddress": { "emailAddress": "ada@example.com" },
                "companyContactProfiles": [{
                    "id": "gid://shopify/CompanyContact/10",
                    "isMainContact": true,
                    "company": { "id": "gid://shopify/Company/100", "name": "Analytical Engines" },
                    "roleAssignments": {
                        "pageInfo": { "hasNextPage": false },
                        "edges": [
                            { "node": {
                                "id": "gid://shopify/CompanyContactRoleAssignment/a",
                                "role": { "name": "Location admin" },
                                "company": { "id": "gid://shopify/Company/100" },
                                "companyLocation": { "id": "gid://shopify/CompanyLocation/L1", "name": "London" }
                            }},
                            { "node": {
                                "id": "gid://shopify/CompanyContactRoleAssignment/b",
                                "role": { "name": "Ordering only" },
                                "company": null,
                                "companyLocation": null
                            }},
                            { "node": {
                                "id": "gid://shopify/CompanyContactRoleAssignment/c",
                                "role": null,
                                "company": null,
                                "companyLocation": null
                            }}
                        ]
                    }
                }]
            }
        })
    }

    #[test]
    fn test_convert_customer_company_roles() {
        let data: CustomerCompanyRolesData = serde_json::from_value(sample_response()).unwrap();
        let roles = convert_customer_company_roles(data.customer.unwrap());

        assert_eq!(roles.customer.id.as_str(), "gid://shopify/Customer/1");
        assert_eq!(roles.customer.email.as_deref(), Some("ada@example.com"));
        assert_eq!(roles.profiles.len(), 1);

        let profile = &roles.profiles[0];
        assert!(profile.is_main_contact);
        assert_eq!(profile.company.name, "Analytical Engines");
        // The assignment without a role is dropped.
        assert_eq!(profile.role_assignments.len(), 2);
    }

    #[test]
    fn test_location_scope_carries_name() {
        let data: CustomerCompanyRolesData = serde_json::from_value(sample_response()).unwrap();
        let roles = convert_customer_company_roles(data.customer.unwrap());
        let first = &roles.profiles[0].role_assignments[0];

        assert_eq!(first.role_name, "Location admin");
        assert_eq!(
            first.scope.company_location_id().map(CompanyLocationId::as_str),
            Some("gid://shopify/CompanyLocation/L1")
        );
        assert_eq!(first.scope.location_name(), Some("London"));
    }

    #[test]
    fn test_missing_company_falls_back_to_profile_company() {
        let data: CustomerCompanyRolesData = serde_json::from_value(sample_response()).unwrap();
        let roles = convert_customer_company_roles(data.customer.unwrap());
        let second = &roles.profiles[0].role_assignments[1];

        assert_eq!(
            second.scope,
            RoleScope::Company {
                company_id: CompanyId::new("gid://shopify/Company/100")
            }
        );
    }

    #[test]
    fn test_customer_without_profiles() {
        let data: CustomerCompanyRolesData = serde_json::from_value(json!({
            "customer": {
                "id": "gid://shopify/Customer/2",
                "firstName": null,
                "lastName": null,
                "displayName": "guest@example.com",
                "defaultEmailAddress": null,
                "companyContactProfiles": []
            }
        }))
        .unwrap();
        let roles = convert_customer_company_roles(data.customer.unwrap());
        assert!(roles.profiles.is_empty());
        assert!(roles.customer.email.is_none());
    }

    #[test]
    fn test_missing_customer_deserializes_to_none() {
        let data: CustomerCompanyRolesData =
            serde_json::from_value(json!({ "customer": null })).unwrap();
        assert!(data.customer.is_none());
    }
}
