//! HTTP route handlers for the portal.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (database when configured)
//!
//! # Customers (service token required)
//! GET  /api/stores/{store}/customers/{customer_id}/details
//!                              - Customer, company and roles for one store
//! ```

use axum::{Router, extract::State, http::StatusCode, routing::get};

use crate::state::AppState;

pub mod customers;

/// Build the portal routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .route(
            "/api/stores/{store}/customers/{customer_id}/details",
            get(customers::details),
        )
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Verifies database connectivity when the role cache is in `PostgreSQL`.
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    let Some(pool) = state.pool() else {
        return StatusCode::OK;
    };

    match sqlx::query("SELECT 1").fetch_one(pool).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}
