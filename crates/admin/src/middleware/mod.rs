//! HTTP middleware and extractors for admin.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request tracing)
//! 3. Security headers
//! 4. `RequireAdmin` extractor on protected handlers

pub mod auth;
pub mod security_headers;

pub use auth::{AdminAuthRejection, RequireAdmin};
pub use security_headers::security_headers;
