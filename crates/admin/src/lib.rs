//! Personal website admin backend.
//!
//! Admins sign in with Google. Emails on a static allow-list get an admin
//! record on first sign-in; afterwards every request is authenticated from a
//! pair of cookies (the email, and a bcrypt hash of the Google user ID)
//! checked against the stored record. There is no server-side session table:
//! deleting an admin record revokes its sessions.
//!
//! This crate provides the backend as a library, allowing it to be tested
//! and reused by the CLI.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod google;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

pub use config::{AdminConfig, ConfigError};
pub use error::AppError;
pub use state::AppState;
