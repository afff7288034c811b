//! Business logic services for admin.
//!
//! # Services
//!
//! - `auth` - Google sign-in, admin directory, cookie sessions

pub mod auth;

pub use auth::{
    AdminDirectory, AuthError, AuthorizationPolicy, CredentialHasher, DirectoryError, HashError,
    SessionError, SessionManager,
};
