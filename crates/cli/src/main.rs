//! SelempangKu CLI - migrations and maintenance tools.
//!
//! # Usage
//!
//! ```bash
//! # Apply database migrations
//! sk-cli migrate
//!
//! # Create an admin account
//! sk-cli admin create -e admin@example.com -u admin -p 'a-long-password'
//!
//! # Load the starter catalog and bank accounts
//! sk-cli seed
//!
//! # Purge expired OTPs and reset tokens now
//! sk-cli sweep
//! ```
//!
//! All commands read `DATABASE_URL` (a `.env` file is honoured).

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "sk-cli")]
#[command(author, version, about = "SelempangKu CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage admin accounts
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Seed products and bank accounts from a YAML file
    Seed {
        /// Catalog file
        #[arg(short, long, default_value = commands::seed::DEFAULT_CATALOG)]
        file: String,
    },
    /// Delete expired registration codes and reset tokens
    Sweep,
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new admin account
    Create {
        /// Admin email address
        #[arg(short, long)]
        email: String,

        /// Admin username
        #[arg(short, long)]
        username: String,

        /// Admin password (at least 8 characters)
        #[arg(short, long)]
        password: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Admin { action } => match action {
            AdminAction::Create {
                email,
                username,
                password,
            } => {
                commands::admin::create_user(&email, &username, &password).await?;
            }
        },
        Commands::Seed { file } => commands::seed::catalog(&file).await?,
        Commands::Sweep => commands::sweep::run().await?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_admin_create_flags() {
        let cli = Cli::try_parse_from([
            "sk-cli", "admin", "create", "-e", "a@b.co", "-u", "admin", "-p", "password123",
        ]);
        assert!(cli.is_ok());
    }
}
