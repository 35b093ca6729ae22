//! Unified error handling for the portal HTTP surface.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::services::CustomerDetailsError;

/// Application-level error type for the portal.
#[derive(Debug, Error)]
pub enum AppError {
    /// Customer detail resolution failed.
    #[error(transparent)]
    CustomerDetails(#[from] CustomerDetailsError),

    /// Caller did not present a valid service token.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::CustomerDetails(e) => match e {
                CustomerDetailsError::CustomerNotFound(_) => StatusCode::NOT_FOUND,
                CustomerDetailsError::NoCompanyContact | CustomerDetailsError::NoRolesAssigned => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                CustomerDetailsError::Source(_) => StatusCode::BAD_GATEWAY,
                CustomerDetailsError::Cache(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    const fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::CustomerDetails(CustomerDetailsError::Source(_) | CustomerDetailsError::Cache(_))
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log server errors with Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Portal request error"
            );
        }

        let status = self.status();

        // Don't expose internal error details to clients
        let message = match &self {
            Self::CustomerDetails(CustomerDetailsError::Cache(_)) => {
                "Internal server error".to_string()
            }
            Self::CustomerDetails(CustomerDetailsError::Source(_)) => {
                "External service error".to_string()
            }
            _ => self.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
