//! Core types for the B2B portal.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod key;
pub mod role;
pub mod store;

pub use id::*;
pub use key::RoleAssignmentKey;
pub use role::{ExternalRoleAssignment, RoleScope, RoleTier};
pub use store::{StoreName, StoreNameError};
