//! Admin management commands.
//!
//! # Usage
//!
//! ```bash
//! # List admins
//! site-cli admin list
//!
//! # Revoke an admin
//! site-cli admin revoke -e admin@example.com
//! ```
//!
//! Revoking deletes the record. Sessions are verified against the record on
//! every request, so existing cookies stop working immediately. If the email
//! is still on `ADMIN_EMAILS`, its next Google sign-in creates a new record.
//!
//! # Environment Variables
//!
//! - `ADMIN_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string

use website_admin::db::{PgAdminStore, create_pool};
use website_core::Email;

use super::{CommandError, database_url};

async fn connect() -> Result<PgAdminStore, CommandError> {
    let url = database_url()?;
    tracing::info!("Connecting to admin database...");
    Ok(PgAdminStore::new(create_pool(&url).await?))
}

/// Print every admin.
pub async fn list() -> Result<(), CommandError> {
    let store = connect().await?;
    let admins = store.list_all().await?;

    #[allow(clippy::print_stdout)]
    {
        if admins.is_empty() {
            println!("No admins.");
        }
        for admin in &admins {
            println!(
                "{:>5}  {}  {}",
                admin.id,
                admin.email,
                admin.created_at.format("%Y-%m-%d %H:%M UTC")
            );
        }
    }

    Ok(())
}

/// Delete the admin with `email`.
pub async fn revoke(email: &str) -> Result<(), CommandError> {
    let email = Email::parse(email)?;
    let store = connect().await?;

    if !store.delete_by_email(&email).await? {
        return Err(CommandError::AdminNotFound(email.into_inner()));
    }

    tracing::info!("Revoked admin {email}");
    Ok(())
}
