//! Shopify Admin API GraphQL client.
//!
//! This module provides a read-only client for the B2B parts of the
//! Shopify Admin API. Authenticates with an offline access token.

use std::sync::Arc;

use async_trait::async_trait;
use b2b_portal_core::{CustomerId, StoreName};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{debug, instrument};

use crate::config::ShopifyAdminConfig;

use super::{
    AdminShopifyError, CustomerRoleSource, GraphQLError, GraphQLErrorLocation,
    types::CustomerCompanyRoles,
};

mod conversions;
mod queries;

use conversions::convert_customer_company_roles;
use queries::{CUSTOMER_COMPANY_ROLES, CustomerCompanyRolesData, ROLE_ASSIGNMENTS_PAGE_SIZE};

/// Shopify Admin API GraphQL client.
///
/// Cheap to clone; all clones share one HTTP connection pool.
#[derive(Clone)]
pub struct AdminClient {
    inner: Arc<AdminClientInner>,
}

struct AdminClientInner {
    client: reqwest::Client,
    store: StoreName,
    api_version: String,
    access_token: SecretString,
}

/// GraphQL request body.
#[derive(Debug, Serialize)]
struct GraphQLRequest<'a> {
    query: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    variables: Option<serde_json::Value>,
}

/// GraphQL response wrapper.
#[derive(Debug, Deserialize)]
struct GraphQLResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQLErrorResponse>>,
}

#[derive(Debug, Deserialize)]
struct GraphQLErrorResponse {
    message: String,
    #[serde(default)]
    locations: Vec<GraphQLErrorLocationResponse>,
    #[serde(default)]
    path: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct GraphQLErrorLocationResponse {
    line: i64,
    column: i64,
}

impl<T> GraphQLResponse<T> {
    fn into_result(self) -> Result<T, AdminShopifyError> {
        if let Some(errors) = self.errors
            && !errors.is_empty()
        {
            let converted_errors: Vec<GraphQLError> = errors
                .into_iter()
                .map(|e| GraphQLError {
                    message: e.message,
                    locations: e
                        .locations
                        .into_iter()
                        .map(|l| GraphQLErrorLocation {
                            line: l.line,
                            column: l.column,
                        })
                        .collect(),
                    path: e.path,
                })
                .collect();
            return Err(AdminShopifyError::GraphQL(converted_errors));
        }

        self.data
            .ok_or_else(|| AdminShopifyError::graphql_message("No data in response"))
    }
}

impl AdminClient {
    /// Create a new Admin API client.
    #[must_use]
    pub fn new(config: &ShopifyAdminConfig) -> Self {
        Self {
            inner: Arc::new(AdminClientInner {
                client: reqwest::Client::new(),
                store: config.store.clone(),
                api_version: config.api_version.clone(),
                access_token: config.access_token.clone(),
            }),
        }
    }

    /// Get the store this client talks to.
    #[must_use]
    pub fn store(&self) -> &StoreName {
        &self.inner.store
    }

    // =========================================================================
    // GraphQL Execution
    // =========================================================================

    /// Execute a GraphQL document.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // Retry-After is a small positive number
    async fn execute<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: Option<serde_json::Value>,
    ) -> Result<T, AdminShopifyError> {
        let endpoint = format!(
            "https://{}/admin/api/{}/graphql.json",
            self.inner.store, self.inner.api_version
        );

        let response = self
            .inner
            .client
            .post(&endpoint)
            .header(
                "X-Shopify-Access-Token",
                self.inner.access_token.expose_secret(),
            )
            .header("Content-Type", "application/json")
            .json(&GraphQLRequest { query, variables })
            .send()
            .await?;

        // Check for rate limiting
        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<f64>().ok())
                .map_or(60, |secs| secs.ceil() as u64);
            return Err(AdminShopifyError::RateLimited(retry_after));
        }

        // Check for unauthorized
        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(AdminShopifyError::Unauthorized(
                "Invalid or revoked access token".to_string(),
            ));
        }

        let response = response.error_for_status()?;
        let body = response.bytes().await?;
        let graphql_response: GraphQLResponse<T> = serde_json::from_slice(&body)?;
        graphql_response.into_result()
    }

    // =========================================================================
    // B2B methods
    // =========================================================================

    /// Get a customer with their company-contact profiles and role assignments.
    ///
    /// Returns `Ok(None)` when Shopify has no customer with this ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or returns an error response.
    #[instrument(skip(self), fields(customer_id = %customer_id))]
    pub async fn get_customer_company_roles(
        &self,
        customer_id: &CustomerId,
    ) -> Result<Option<CustomerCompanyRoles>, AdminShopifyError> {
        let variables = serde_json::json!({
            "id": customer_id.as_str(),
            "first": ROLE_ASSIGNMENTS_PAGE_SIZE,
        });

        let data: CustomerCompanyRolesData =
            self.execute(CUSTOMER_COMPANY_ROLES, Some(variables)).await?;

        let roles = data.customer.map(convert_customer_company_roles);
        debug!(
            found = roles.is_some(),
            profiles = roles.as_ref().map_or(0, |r| r.profiles.len()),
            "Fetched customer company roles"
        );
        Ok(roles)
    }
}

#[async_trait]
impl CustomerRoleSource for AdminClient {
    async fn fetch_customer_roles(
        &self,
        store: &StoreName,
        customer_id: &CustomerId,
    ) -> Result<Option<CustomerCompanyRoles>, AdminShopifyError> {
        if store != self.store() {
            return Err(AdminShopifyError::UnknownStore(store.to_string()));
        }
        self.get_customer_company_roles(customer_id).await
    }
}
