//! tanklog CLI - Track fuel expenses from receipt photos
//!
//! Upload receipt images for server-side OCR extraction and browse the
//! resulting records from the terminal.

use clap::Parser;

use crate::cli::{Cli, Commands};
use crate::commands::auth_cmd::run_auth;
use crate::commands::completions::run_completions;
use crate::commands::config::run_config;
use crate::commands::records::{run_delete, run_list, run_show, run_upload};
use crate::error::CliError;

mod cli;
mod commands;
mod config_profiles;
mod error;
mod store;
#[cfg(test)]
mod tests;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        if let Some(hint) = retry_hint(&error) {
            eprintln!("{hint}");
        }
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("tanklog=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    let profile = cli.profile.as_deref();

    match cli.command {
        Commands::Auth { command } => run_auth(command, profile).await,
        Commands::Upload {
            image,
            station_name,
            location,
            purchase_date,
        } => run_upload(&image, station_name, location, purchase_date, profile).await,
        Commands::List { page, size, json } => run_list(page, size, json, profile).await,
        Commands::Show { id, json } => run_show(id, json, profile).await,
        Commands::Delete { id } => run_delete(id, profile).await,
        Commands::Config { command } => run_config(command, profile),
        Commands::Completions { shell, output } => run_completions(shell, output.as_deref()),
    }
}

/// Per-category guidance appended after the error message.
fn retry_hint(error: &CliError) -> Option<&'static str> {
    match error {
        CliError::Core(core) if core.is_auth_rejection() => {
            Some("Your session was rejected. Run `tanklog auth login` to sign in again.")
        }
        CliError::Core(tanklog_core::Error::Http(_)) => {
            Some("The backend could not be reached. Check your connection and retry.")
        }
        _ => None,
    }
}
