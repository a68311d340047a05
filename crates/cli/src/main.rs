//! Tidewater CLI - Database migrations and operator tools.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations
//! tw-cli migrate
//!
//! # Mint a bearer token for an account
//! tw-cli token issue --account <uuid>
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

use tidewater_core::AccountId;

mod commands;

#[derive(Parser)]
#[command(name = "tw-cli")]
#[command(author, version, about = "Tidewater CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run storefront database migrations
    Migrate,
    /// Manage bearer tokens
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },
}

#[derive(Subcommand)]
enum TokenAction {
    /// Issue a token for an existing account
    Issue {
        /// Account ID (UUID)
        #[arg(short, long)]
        account: AccountId,

        /// Lifetime in days (default: `STOREFRONT_TOKEN_TTL_DAYS`)
        #[arg(long)]
        ttl_days: Option<i64>,
    },
}

#[tokio::main]
async fn main() {
    // Logs go to stderr so stdout carries only command output
    tracing_subscriber::fmt()
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
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Token { action } => match action {
            TokenAction::Issue { account, ttl_days } => {
                let issued = commands::token::issue(account, ttl_days)?;
                #[allow(clippy::print_stdout)]
                {
                    println!("{}", issued.token);
                }
            }
        },
    }
    Ok(())
}
