//! Integration tests for customer detail resolution and role reconciliation.
//!
//! Runs the resolver against a fake Shopify source and the in-memory role
//! cache; no external services needed.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::collections::HashSet;

use b2b_portal::services::{CustomerDetailsError, ResolutionWarning, ResolvedRole};
use b2b_portal_core::{RoleAssignmentKey, RoleId, RoleTier};
use b2b_portal_integration_tests::{
    Harness, company_assignment, customer_id, customer_roles, location_assignment, profile,
    store_name,
};

// =============================================================================
// Cache population
// =============================================================================

#[tokio::test]
async fn test_empty_cache_is_populated_with_every_assignment() {
    let h = Harness::new();
    h.source
        .insert(customer_roles(
            1,
            vec![profile(vec![
                location_assignment("a", "Location Admin", "L1", Some("London")),
                location_assignment("b", "Ordering only", "L2", Some("Leeds")),
                company_assignment("c", "ADMINISTRATOR"),
            ])],
        ))
        .await;

    let resolved = h
        .service
        .get_customer_details(&store_name(), &customer_id(1))
        .await
        .unwrap();

    assert!(resolved.warnings.is_empty());
    assert_eq!(resolved.data.roles.len(), 3);

    let rows = h.cached_rows().await;
    assert_eq!(rows.len(), 3);
    for row in &rows {
        let expected = match row.external_assignment_id.as_str() {
            "a" | "c" => RoleId::ADMIN,
            "b" => RoleId::MEMBER,
            other => panic!("unexpected assignment {other}"),
        };
        assert_eq!(row.role_id, expected, "assignment {}", row.external_assignment_id);
        assert_eq!(row.created_by, customer_id(1));
        assert_eq!(row.updated_by, customer_id(1));
        assert_eq!(row.store_name, store_name());
    }
}

#[tokio::test]
async fn test_location_admin_example() {
    let h = Harness::new();
    h.source
        .insert(customer_roles(
            1,
            vec![profile(vec![location_assignment(
                "a",
                "Location Admin",
                "L1",
                None,
            )])],
        ))
        .await;

    h.service
        .get_customer_details(&store_name(), &customer_id(1))
        .await
        .unwrap();

    let rows = h.cached_rows().await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].role_id, RoleId::ADMIN);
    assert_eq!(
        rows[0].company_location_id.as_ref().map(|id| id.as_str()),
        Some("L1")
    );
    assert_eq!(rows[0].external_assignment_id.as_str(), "a");
}

// =============================================================================
// Idempotence
// =============================================================================

#[tokio::test]
async fn test_second_resolution_performs_no_writes() {
    let h = Harness::new();
    h.source
        .insert(customer_roles(
            1,
            vec![profile(vec![
                location_assignment("a", "Location Admin", "L1", Some("London")),
                company_assignment("b", "Buyer"),
            ])],
        ))
        .await;

    let first = h
        .service
        .get_customer_details(&store_name(), &customer_id(1))
        .await
        .unwrap();
    assert_eq!(h.cache_writes(), 1);

    let second = h
        .service
        .get_customer_details(&store_name(), &customer_id(1))
        .await
        .unwrap();

    assert_eq!(h.cache_writes(), 1);
    assert_eq!(first, second);
    assert_eq!(h.cached_rows().await.len(), 2);
}

#[tokio::test]
async fn test_only_missing_assignments_are_reconciled() {
    let h = Harness::new();
    h.source
        .insert(customer_roles(
            1,
            vec![profile(vec![location_assignment(
                "a",
                "Location Admin",
                "L1",
                None,
            )])],
        ))
        .await;
    h.service
        .get_customer_details(&store_name(), &customer_id(1))
        .await
        .unwrap();

    // Shopify grants a second location role.
    h.source
        .insert(customer_roles(
            1,
            vec![profile(vec![
                location_assignment("a", "Location Admin", "L1", None),
                location_assignment("b", "Buyer", "L2", Some("Leeds")),
            ])],
        ))
        .await;
    let resolved = h
        .service
        .get_customer_details(&store_name(), &customer_id(1))
        .await
        .unwrap();

    assert_eq!(h.cache_writes(), 2);
    assert_eq!(resolved.data.roles.len(), 2);
    let leeds = resolved
        .data
        .roles
        .iter()
        .find(|role| role.external_assignment_id().as_str() == "b")
        .unwrap();
    assert_eq!(leeds.role_id(), RoleId::MEMBER);
    assert!(matches!(
        leeds,
        ResolvedRole::Location { location_name: Some(name), .. } if name == "Leeds"
    ));
}

// =============================================================================
// Concurrency
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_resolutions_converge_on_one_row_per_key() {
    let h = Harness::new();
    h.source
        .insert(customer_roles(
            1,
            vec![profile(vec![
                location_assignment("a", "Location Admin", "L1", None),
                location_assignment("b", "Buyer", "L2", None),
            ])],
        ))
        .await;

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let service = h.service.clone();
            tokio::spawn(async move {
                service
                    .get_customer_details(&store_name(), &customer_id(1))
                    .await
            })
        })
        .collect();

    for handle in handles {
        let resolved = handle.await.unwrap().unwrap();
        assert!(resolved.warnings.is_empty(), "{:?}", resolved.warnings);
        assert_eq!(resolved.data.roles.len(), 2);
    }

    let rows = h.cached_rows().await;
    assert_eq!(rows.len(), 2);
    let keys: HashSet<String> = rows.iter().map(|row| row.key().to_string()).collect();
    assert_eq!(keys.len(), 2);
    assert!(h.cache_writes() >= 1);
}

// =============================================================================
// Structural errors
// =============================================================================

#[tokio::test]
async fn test_zero_assignments_is_no_roles_assigned_and_writes_nothing() {
    let h = Harness::new();
    h.source
        .insert(customer_roles(1, vec![profile(vec![])]))
        .await;

    let err = h
        .service
        .get_customer_details(&store_name(), &customer_id(1))
        .await
        .unwrap_err();

    assert!(matches!(err, CustomerDetailsError::NoRolesAssigned));
    assert_eq!(h.cache_writes(), 0);
    assert!(h.cached_rows().await.is_empty());
}

#[tokio::test]
async fn test_no_profile_is_no_company_contact() {
    let h = Harness::new();
    h.source.insert(customer_roles(1, vec![])).await;

    let err = h
        .service
        .get_customer_details(&store_name(), &customer_id(1))
        .await
        .unwrap_err();

    assert!(matches!(err, CustomerDetailsError::NoCompanyContact));
    assert_eq!(h.cache_writes(), 0);
}

#[tokio::test]
async fn test_unknown_customer_is_not_found() {
    let h = Harness::new();

    let err = h
        .service
        .get_customer_details(&store_name(), &customer_id(404))
        .await
        .unwrap_err();

    assert!(matches!(err, CustomerDetailsError::CustomerNotFound(id) if id == customer_id(404)));
}

#[tokio::test]
async fn test_source_failure_propagates() {
    let h = Harness::new();
    h.source.fail_with("Throttled").await;

    let err = h
        .service
        .get_customer_details(&store_name(), &customer_id(1))
        .await
        .unwrap_err();

    assert!(matches!(err, CustomerDetailsError::Source(_)));
    assert_eq!(h.cache_writes(), 0);
}

#[tokio::test]
async fn test_cache_read_failure_propagates() {
    let h = Harness::new();
    h.source
        .insert(customer_roles(
            1,
            vec![profile(vec![company_assignment("a", "Admin")])],
        ))
        .await;
    h.store.fail_reads(true);

    let err = h
        .service
        .get_customer_details(&store_name(), &customer_id(1))
        .await
        .unwrap_err();

    assert!(matches!(err, CustomerDetailsError::Cache(_)));
}

// =============================================================================
// Best-effort reconciliation
// =============================================================================

#[tokio::test]
async fn test_write_failure_returns_pre_reconciliation_state_with_warning() {
    let h = Harness::new();
    h.source
        .insert(customer_roles(
            1,
            vec![profile(vec![location_assignment(
                "a",
                "Location Admin",
                "L1",
                None,
            )])],
        ))
        .await;
    h.service
        .get_customer_details(&store_name(), &customer_id(1))
        .await
        .unwrap();

    h.source
        .insert(customer_roles(
            1,
            vec![profile(vec![
                location_assignment("a", "Location Admin", "L1", None),
                company_assignment("b", "Buyer"),
            ])],
        ))
        .await;
    h.store.fail_writes(true);

    let resolved = h
        .service
        .get_customer_details(&store_name(), &customer_id(1))
        .await
        .unwrap();

    assert_eq!(h.store.failed_writes(), 1);
    assert_eq!(resolved.data.roles.len(), 1);
    assert_eq!(resolved.data.roles[0].external_assignment_id().as_str(), "a");
    assert_eq!(resolved.warnings.len(), 1);
    assert!(matches!(
        &resolved.warnings[0],
        ResolutionWarning::ReconciliationFailed { message } if message.contains("simulated write failure")
    ));
}

#[tokio::test]
async fn test_write_failure_on_empty_cache_returns_no_roles() {
    let h = Harness::new();
    h.source
        .insert(customer_roles(
            1,
            vec![profile(vec![company_assignment("a", "Admin")])],
        ))
        .await;
    h.store.fail_writes(true);

    let resolved = h
        .service
        .get_customer_details(&store_name(), &customer_id(1))
        .await
        .unwrap();

    assert!(resolved.data.roles.is_empty());
    assert_eq!(resolved.data.company.name, "Analytical Engines");
    assert!(matches!(
        resolved.warnings.as_slice(),
        [ResolutionWarning::ReconciliationFailed { .. }]
    ));
}

// =============================================================================
// Staleness
// =============================================================================

#[tokio::test]
async fn test_revoked_assignment_is_kept_and_reported() {
    let h = Harness::new();
    h.source
        .insert(customer_roles(
            1,
            vec![profile(vec![
                location_assignment("a", "Location Admin", "L1", None),
                company_assignment("b", "Buyer"),
            ])],
        ))
        .await;
    h.service
        .get_customer_details(&store_name(), &customer_id(1))
        .await
        .unwrap();

    // Shopify revokes "a".
    h.source
        .insert(customer_roles(
            1,
            vec![profile(vec![company_assignment("b", "Buyer")])],
        ))
        .await;
    let resolved = h
        .service
        .get_customer_details(&store_name(), &customer_id(1))
        .await
        .unwrap();

    assert_eq!(h.cached_rows().await.len(), 2);
    assert_eq!(resolved.data.roles.len(), 2);
    assert_eq!(
        resolved.warnings,
        vec![ResolutionWarning::StaleAssignment {
            external_assignment_id: "a".into(),
        }]
    );
}

// =============================================================================
// Key stability
// =============================================================================

#[tokio::test]
async fn test_candidate_key_matches_key_read_back() {
    let h = Harness::new();
    let assignments = vec![
        location_assignment("a", "Location Admin", "L1", None),
        company_assignment("b", "Buyer"),
    ];
    h.source
        .insert(customer_roles(1, vec![profile(assignments.clone())]))
        .await;
    h.service
        .get_customer_details(&store_name(), &customer_id(1))
        .await
        .unwrap();

    let p = profile(assignments.clone());
    let mut expected: Vec<String> = assignments
        .iter()
        .map(|a| {
            RoleAssignmentKey::new(
                &p.company.id,
                &store_name(),
                a.scope.company_location_id(),
                &p.company_contact_id,
            )
            .to_string()
        })
        .collect();
    expected.sort();

    let mut read_back: Vec<String> = h
        .cached_rows()
        .await
        .iter()
        .map(|row| row.key().to_string())
        .collect();
    read_back.sort();

    assert_eq!(read_back, expected);
    assert!(read_back.contains(&format!(
        "gid://shopify/Company/100|{}|null|gid://shopify/CompanyContact/10",
        store_name()
    )));
}

#[tokio::test]
async fn test_resolved_roles_carry_tier() {
    let h = Harness::new();
    h.source
        .insert(customer_roles(
            1,
            vec![profile(vec![company_assignment("a", "Company admin")])],
        ))
        .await;

    let resolved = h
        .service
        .get_customer_details(&store_name(), &customer_id(1))
        .await
        .unwrap();

    assert_eq!(
        resolved.data.roles,
        vec![ResolvedRole::Company {
            external_assignment_id: "a".into(),
            role_id: RoleId::ADMIN,
            tier: RoleTier::Admin,
            role_name: Some("Company admin".to_string()),
        }]
    );
}
