//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! site-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `ADMIN_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string
//!
//! # Migration Files
//!
//! Admin migrations: `crates/admin/migrations/`

use website_admin::db::create_pool;

use super::{CommandError, database_url};

/// Run the admin database migrations.
pub async fn run() -> Result<(), CommandError> {
    let url = database_url()?;

    tracing::info!("Connecting to admin database...");
    let pool = create_pool(&url).await?;

    tracing::info!("Running admin migrations...");
    sqlx::migrate!("../admin/migrations").run(&pool).await?;

    tracing::info!("Admin migrations complete!");
    Ok(())
}
