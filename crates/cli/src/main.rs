//! Bear Beat CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! bb-cli migrate
//!
//! # Seed the FTP pool from a credentials file (username:password per line)
//! bb-cli ftp-pool seed -f accounts.txt
//!
//! # Show FTP pool occupancy
//! bb-cli ftp-pool status
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `ftp-pool seed` - Add credential pairs to the pool
//! - `ftp-pool status` - Show pool occupancy

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "bb-cli")]
#[command(author, version, about = "Bear Beat CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage the FTP credential pool
    FtpPool {
        #[command(subcommand)]
        action: FtpPoolAction,
    },
}

#[derive(Subcommand)]
enum FtpPoolAction {
    /// Seed the pool from a credentials file (username:password per line)
    Seed {
        /// Path to the credentials file
        #[arg(short, long)]
        file: String,
    },
    /// Show pool occupancy
    Status,
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
        Commands::FtpPool { action } => match action {
            FtpPoolAction::Seed { file } => commands::ftp_pool::seed(&file).await?,
            FtpPoolAction::Status => commands::ftp_pool::status().await?,
        },
    }
    Ok(())
}
