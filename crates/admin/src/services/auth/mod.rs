//! Admin authentication.
//!
//! Login: the provider profile is gated by the [`AuthorizationPolicy`],
//! resolved to a stored admin by the [`AdminDirectory`], and turned into a
//! cookie pair by the [`SessionManager`]. Later requests are authenticated by
//! the session manager re-reading the admin record and verifying the hashed
//! provider ID with the [`CredentialHasher`].

mod directory;
mod error;
mod hasher;
mod policy;
mod session;

pub use directory::{AdminDirectory, DirectoryError};
pub use error::AuthError;
pub use hasher::{CredentialHasher, HashError};
pub use policy::AuthorizationPolicy;
pub use session::{SessionError, SessionManager};
