//! HTTP middleware and extractors for the portal.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request tracing)
//! 3. `RequireServiceToken` extractor on `/api` handlers

pub mod auth;

pub use auth::RequireServiceToken;
