//! Core types for the website backend.

pub mod email;
pub mod id;
pub mod provider;

pub use email::{Email, EmailError};
pub use id::*;
pub use provider::{ProviderUserId, ProviderUserIdError};
