//! Website Core - Shared types library.
//!
//! Types shared by the admin backend (`website-admin`), the operator CLI
//! (`website-cli`) and the integration tests.
//!
//! The core crate contains only types - no I/O, no database access, no HTTP
//! clients. The optional `postgres` feature adds `sqlx` encode/decode impls.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for admin IDs, emails and identity-provider IDs

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
