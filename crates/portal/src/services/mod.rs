//! Business logic services for the portal.
//!
//! # Services
//!
//! - `customer_details` - Customer, company and role resolution for one store
//! - `role_sync` - Reconciliation of Shopify role assignments into the role cache

pub mod customer_details;
pub mod role_sync;

pub use customer_details::{
    CustomerDetailsError, CustomerDetailsResponse, CustomerDetailsService, Resolved,
    ResolutionWarning, ResolvedRole,
};
pub use role_sync::{RoleSyncError, RoleSyncService, SyncOutcome, SyncScope};
