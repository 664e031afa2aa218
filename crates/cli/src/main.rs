//! RocketShoes CLI - Drive the cart store from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Show the current cart
//! rocket-cli show
//!
//! # Add one unit of product 1
//! rocket-cli add 1
//!
//! # Set product 1 to 4 units
//! rocket-cli set-amount 1 4
//!
//! # Remove product 1 entirely
//! rocket-cli remove 1
//! ```
//!
//! The catalog endpoint and snapshot location come from `ROCKETSHOES_API_URL`
//! and `ROCKETSHOES_DATA_DIR` (see the cart crate's config module).

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "rocket-cli")]
#[command(author, version, about = "RocketShoes cart CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the current cart
    Show,
    /// Add one unit of a product to the cart
    Add {
        /// Product identifier
        product_id: i64,
    },
    /// Remove a product from the cart entirely
    Remove {
        /// Product identifier
        product_id: i64,
    },
    /// Set the absolute quantity of a product already in the cart
    SetAmount {
        /// Product identifier
        product_id: i64,

        /// Requested quantity (0 leaves the cart unchanged)
        amount: u32,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing; RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rocket_shoes_cart=warn,rocket_shoes_cli=info".into()),
        )
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
        Commands::Show => commands::cart::show().await?,
        Commands::Add { product_id } => commands::cart::add(product_id).await?,
        Commands::Remove { product_id } => commands::cart::remove(product_id).await?,
        Commands::SetAmount { product_id, amount } => {
            commands::cart::set_amount(product_id, amount).await?;
        }
    }
    Ok(())
}
