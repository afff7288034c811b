//! Domain models for admin authentication.

pub mod admin;
pub mod session;

pub use admin::{AdminFilter, AdminRecord, NewAdmin, Profile};
pub use session::{CookieScope, SESSION_LIFETIME, SessionCookiePair, cookie_names};
