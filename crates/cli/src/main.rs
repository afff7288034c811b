//! Website CLI - Database migrations and admin management.
//!
//! # Usage
//!
//! ```bash
//! # Run admin database migrations
//! site-cli migrate
//!
//! # List admins
//! site-cli admin list
//!
//! # Revoke an admin (deletes the record; open sessions stop working)
//! site-cli admin revoke -e admin@example.com
//! ```
//!
//! Admins are never created here: an allow-listed email becomes an admin on
//! its first Google sign-in.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "site-cli")]
#[command(author, version, about = "Website admin backend CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage admins
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// List all admins
    List,
    /// Delete an admin record, revoking all of its sessions
    Revoke {
        /// Admin email address
        #[arg(short, long)]
        email: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Admin { action } => match action {
            AdminAction::List => commands::admin::list().await?,
            AdminAction::Revoke { email } => commands::admin::revoke(&email).await?,
        },
    }
    Ok(())
}
