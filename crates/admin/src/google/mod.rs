//! Google OAuth2 sign-in.
//!
//! # Flow
//!
//! 1. `/auth/login` generates an [`OAuthState`] and redirects to
//!    [`GoogleClient::authorization_url`]
//! 2. Google redirects back to `/auth/callback` with `state` and `code`
//! 3. [`GoogleClient::exchange_code`] checks the state, trades the code for an
//!    access token, and returns the raw userinfo body
//! 4. The admin directory decodes the body and resolves the admin

mod client;
mod error;
mod types;

pub use client::{GoogleClient, USERINFO_EMAIL_SCOPE};
pub use error::GoogleError;
pub use types::OAuthState;
