//! Customer detail route handler.

use axum::{
    Json,
    extract::{Path, State},
};
use b2b_portal_core::{CustomerId, StoreName};
use serde::Deserialize;
use tracing::instrument;

use crate::{
    error::AppError,
    middleware::RequireServiceToken,
    services::{CustomerDetailsResponse, Resolved},
    state::AppState,
};

/// Path parameters of the details route.
#[derive(Debug, Deserialize)]
pub struct DetailsPath {
    pub store: String,
    pub customer_id: String,
}

/// Resolve a customer's company and roles.
///
/// `customer_id` may be a full Shopify GID or the bare numeric ID.
#[instrument(skip(state, _auth))]
pub async fn details(
    State(state): State<AppState>,
    _auth: RequireServiceToken,
    Path(path): Path<DetailsPath>,
) -> Result<Json<Resolved<CustomerDetailsResponse>>, AppError> {
    let store = StoreName::parse(&path.store)
        .map_err(|e| AppError::BadRequest(format!("invalid store: {e}")))?;
    let customer_id = CustomerId::from_input(&path.customer_id)
        .map_err(|e| AppError::BadRequest(format!("invalid customer id: {e}")))?;

    let resolved = state
        .customer_details()
        .get_customer_details(&store, &customer_id)
        .await?;

    Ok(Json(resolved))
}
