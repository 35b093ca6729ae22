//! Service-token authentication for `/api` routes.
//!
//! Callers are other backend services (the storefront, operator tooling).
//! They present `Authorization: Bearer <PORTAL_SERVICE_TOKEN>`.

use axum::{extract::FromRequestParts, http::header::AUTHORIZATION, http::request::Parts};
use secrecy::ExposeSecret;
use tracing::debug;

use crate::error::AppError;
use crate::state::AppState;

/// Extractor that requires a valid service token.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     _auth: RequireServiceToken,
/// ) -> impl IntoResponse {
///     "ok"
/// }
/// ```
pub struct RequireServiceToken;

impl FromRequestParts<AppState> for RequireServiceToken {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let presented = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or_else(|| AppError::Unauthorized("Missing bearer token".to_string()))?;

        if !constant_time_compare(presented, state.config().service_token.expose_secret()) {
            debug!("Rejected request with invalid service token");
            return Err(AppError::Unauthorized("Invalid service token".to_string()));
        }

        Ok(Self)
    }
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}
