//! B2B Portal Core - Shared types library.
//!
//! This crate provides the domain types used by the role service:
//! - `portal` - HTTP service, Shopify client and role cache
//! - `cli` - Command-line tools for migrations and operator backfills
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Shopify GID newtypes, store names, role tiers and cache keys

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
