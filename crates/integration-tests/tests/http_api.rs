//! Integration tests for the portal HTTP surface.
//!
//! Drives the full router (tracing and Sentry layers included) in-process
//! with `tower::ServiceExt::oneshot`.

#![allow(clippy::unwrap_used)]

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use b2b_portal_integration_tests::{
    Harness, TEST_SERVICE_TOKEN, TEST_STORE, company_assignment, customer_roles,
    location_assignment, profile,
};
use serde_json::Value;
use tower::ServiceExt;

fn details_uri(store: &str, customer: &str) -> String {
    format!("/api/stores/{store}/customers/{customer}/details")
}

async fn get(h: &Harness, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
    let mut request = Request::builder().uri(uri);
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    let response = b2b_portal::app(h.app_state())
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_health() {
    let h = Harness::new();
    let response = b2b_portal::app(h.app_state())
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"ok");
}

#[tokio::test]
async fn test_readiness_without_database() {
    let h = Harness::new();
    let response = b2b_portal::app(h.app_state())
        .oneshot(
            Request::builder()
                .uri("/health/ready")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_details_requires_service_token() {
    let h = Harness::new();

    let (status, _) = get(&h, &details_uri(TEST_STORE, "1"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = get(&h, &details_uri(TEST_STORE, "1"), Some("wrong-token")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(h.source.calls(), 0);
}

#[tokio::test]
async fn test_details_returns_resolved_json() {
    let h = Harness::new();
    h.source
        .insert(customer_roles(
            7421,
            vec![profile(vec![
                location_assignment("a", "Location Admin", "L1", Some("London")),
                company_assignment("b", "Buyer"),
            ])],
        ))
        .await;

    let (status, json) = get(&h, &details_uri(TEST_STORE, "7421"), Some(TEST_SERVICE_TOKEN)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["warnings"], serde_json::json!([]));

    let data = &json["data"];
    assert_eq!(data["customer"]["id"], "gid://shopify/Customer/7421");
    assert_eq!(data["customer"]["displayName"], "Ada Lovelace");
    assert_eq!(data["company"]["name"], "Analytical Engines");
    assert_eq!(data["companyContactId"], "gid://shopify/CompanyContact/10");

    let roles = data["roles"].as_array().unwrap();
    assert_eq!(roles.len(), 2);
    let location = roles.iter().find(|r| r["scope"] == "location").unwrap();
    assert_eq!(location["roleId"], 1);
    assert_eq!(location["tier"], "admin");
    assert_eq!(location["companyLocationId"], "L1");
    assert_eq!(location["locationName"], "London");
    let company = roles.iter().find(|r| r["scope"] == "company").unwrap();
    assert_eq!(company["roleId"], 2);
    assert_eq!(company["roleName"], "Buyer");
}

#[tokio::test]
async fn test_details_accepts_full_gid() {
    let h = Harness::new();
    h.source
        .insert(customer_roles(
            5,
            vec![profile(vec![company_assignment("a", "Admin")])],
        ))
        .await;

    let uri = details_uri(TEST_STORE, "gid%3A%2F%2Fshopify%2FCustomer%2F5");
    let (status, json) = get(&h, &uri, Some(TEST_SERVICE_TOKEN)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["customer"]["id"], "gid://shopify/Customer/5");
}

#[tokio::test]
async fn test_details_status_mapping() {
    let h = Harness::new();
    h.source.insert(customer_roles(1, vec![])).await;
    h.source
        .insert(customer_roles(2, vec![profile(vec![])]))
        .await;

    let (status, _) = get(&h, &details_uri(TEST_STORE, "404"), Some(TEST_SERVICE_TOKEN)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, json) = get(&h, &details_uri(TEST_STORE, "1"), Some(TEST_SERVICE_TOKEN)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["error"], "This customer is not associated with a company");

    let (status, json) = get(&h, &details_uri(TEST_STORE, "2"), Some(TEST_SERVICE_TOKEN)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["error"], "This customer has no roles assigned");

    let (status, _) = get(&h, &details_uri(TEST_STORE, "not-a-number"), Some(TEST_SERVICE_TOKEN)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_details_hides_upstream_and_cache_errors() {
    let h = Harness::new();
    h.source
        .insert(customer_roles(
            1,
            vec![profile(vec![company_assignment("a", "Admin")])],
        ))
        .await;

    h.store.fail_reads(true);
    let (status, json) = get(&h, &details_uri(TEST_STORE, "1"), Some(TEST_SERVICE_TOKEN)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "Internal server error");

    h.source.fail_with("Throttled").await;
    let (status, json) = get(&h, &details_uri(TEST_STORE, "1"), Some(TEST_SERVICE_TOKEN)).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["error"], "External service error");
}

#[tokio::test]
async fn test_details_reports_reconciliation_warning() {
    let h = Harness::new();
    h.source
        .insert(customer_roles(
            1,
            vec![profile(vec![company_assignment("a", "Admin")])],
        ))
        .await;
    h.store.fail_writes(true);

    let (status, json) = get(&h, &details_uri(TEST_STORE, "1"), Some(TEST_SERVICE_TOKEN)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["roles"], serde_json::json!([]));
    assert_eq!(json["warnings"][0]["kind"], "reconciliation_failed");
}
