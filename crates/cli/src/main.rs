//! B2B Portal CLI - Database migrations and operator tools.
//!
//! # Usage
//!
//! ```bash
//! # Run role cache database migrations
//! b2b-cli migrate
//!
//! # Resolve one customer and backfill their cached roles
//! b2b-cli sync-roles --store acme-b2b.myshopify.com --customer 7421
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `sync-roles` - Resolve a customer's roles once and print the result

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "b2b-cli")]
#[command(author, version, about = "B2B portal CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run role cache database migrations
    Migrate,
    /// Resolve a customer's roles, reconciling the role cache
    SyncRoles {
        /// Shopify store domain (e.g., acme-b2b.myshopify.com)
        #[arg(short, long)]
        store: String,

        /// Customer GID or bare numeric ID
        #[arg(short, long)]
        customer: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "b2b_portal=info,b2b_cli=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::portal().await?,
        Commands::SyncRoles { store, customer } => {
            commands::sync_roles::run(&store, &customer).await?;
        }
    }
    Ok(())
}
