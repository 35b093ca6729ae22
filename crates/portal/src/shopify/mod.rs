//! Shopify Admin API client (HIGH PRIVILEGE).
//!
//! # Security
//!
//! **CRITICAL: This module holds the Shopify Admin API access token.**
//!
//! The portal only reads B2B data through it: customers, their company-contact
//! profiles and role assignments. Nothing here mutates the store.
//!
//! # Architecture
//!
//! - Raw GraphQL documents with serde response types (`admin::queries`)
//! - Wire types are converted into validated domain types at the boundary
//!   (`admin::conversions`), so services never see untyped JSON
//! - Direct API calls to Shopify; the role cache lives in `crate::db`
//!
//! # Example
//!
//! ```rust,ignore
//! use b2b_portal::shopify::AdminClient;
//!
//! let client = AdminClient::new(&config.shopify);
//! let roles = client
//!     .get_customer_company_roles(&CustomerId::from_input("7421")?)
//!     .await?;
//! ```

mod admin;
pub mod types;

pub use admin::AdminClient;
pub use types::*;

use async_trait::async_trait;
use b2b_portal_core::{CustomerId, StoreName};
use thiserror::Error;

/// Source of truth for a customer's B2B role assignments.
///
/// Implemented by [`AdminClient`]; tests substitute a fixed source.
#[async_trait]
pub trait CustomerRoleSource: Send + Sync {
    /// Fetch the customer, their company-contact profiles and role assignments.
    ///
    /// Returns `Ok(None)` when the store has no such customer.
    async fn fetch_customer_roles(
        &self,
        store: &StoreName,
        customer_id: &CustomerId,
    ) -> Result<Option<CustomerCompanyRoles>, AdminShopifyError>;
}

/// Errors that can occur when interacting with Shopify Admin API.
#[derive(Debug, Error)]
pub enum AdminShopifyError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// GraphQL query returned errors.
    #[error("GraphQL errors: {}", format_graphql_errors(.0))]
    GraphQL(Vec<GraphQLError>),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Rate limited by Shopify.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Authentication/authorization failed.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The client was asked about a store it holds no token for.
    #[error("Unknown store: {0}")]
    UnknownStore(String),
}

impl AdminShopifyError {
    /// Build a GraphQL error from a single message.
    pub(crate) fn graphql_message(message: impl Into<String>) -> Self {
        Self::GraphQL(vec![GraphQLError {
            message: message.into(),
            locations: vec![],
            path: vec![],
        }])
    }
}

/// A GraphQL error returned by the Shopify Admin API.
#[derive(Debug, Clone)]
pub struct GraphQLError {
    /// Error message.
    pub message: String,
    /// Source locations in the query.
    pub locations: Vec<GraphQLErrorLocation>,
    /// Path to the error in the response.
    pub path: Vec<serde_json::Value>,
}

/// Location in a GraphQL query where an error occurred.
#[derive(Debug, Clone)]
pub struct GraphQLErrorLocation {
    /// Line number (1-indexed).
    pub line: i64,
    /// Column number (1-indexed).
    pub column: i64,
}

fn format_graphql_errors(errors: &[GraphQLError]) -> String {
    errors
        .iter()
        .map(|e| e.message.clone())
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graphql_error_formatting() {
        let errors = vec![
            GraphQLError {
                message: "Field not found".to_string(),
                locations: vec![],
                path: vec![],
            },
            GraphQLError {
                message: "Invalid ID".to_string(),
                locations: vec![],
                path: vec![],
            },
        ];
        let err = AdminShopifyError::GraphQL(errors);
        assert_eq!(
            err.to_string(),
            "GraphQL errors: Field not found; Invalid ID"
        );
    }

    #[test]
    fn test_graphql_message_helper() {
        let err = AdminShopifyError::graphql_message("No data in response");
        assert_eq!(err.to_string(), "GraphQL errors: No data in response");
    }

    #[test]
    fn test_rate_limited_error() {
        let err = AdminShopifyError::RateLimited(60);
        assert_eq!(err.to_string(), "Rate limited, retry after 60 seconds");
    }

    #[test]
    fn test_unknown_store_error() {
        let err = AdminShopifyError::UnknownStore("other.myshopify.com".to_string());
        assert_eq!(err.to_string(), "Unknown store: other.myshopify.com");
    }
}
