//! preptrack CLI - interview prep tracking from the command line
//!
//! Usage:
//!   prep log add -m 45 -r leetcode=3 -t LSTM
//!   prep app list
//!   prep sync

use std::path::Path;

use clap::Parser;

mod cli;
mod commands;
mod config_profiles;
mod error;

use cli::{Cli, Commands, SyncCommands};
use commands::app::run_app;
use commands::common::{open_service, resolve_db_path};
use commands::completions::run_completions;
use commands::config::run_config;
use commands::export::run_export;
use commands::log::run_log;
use commands::settings::run_settings;
use commands::stats::run_stats;
use commands::sync::{run_sync, run_sync_conflicts, run_sync_status};
use commands::topic::run_topic;
use config_profiles::resolve_remote_config;
use error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    if let Ok(directive) = "preptrack=info".parse() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let db_path = resolve_db_path(cli.db_path);
    let profile = cli.profile.as_deref();

    match cli.command {
        Some(Commands::Completions { shell, output }) => run_completions(shell, output.as_deref()),
        Some(Commands::Config { command }) => run_config(command, profile),
        command => run_with_service(command, &db_path, profile).await,
    }
}

async fn run_with_service(
    command: Option<Commands>,
    db_path: &Path,
    profile: Option<&str>,
) -> Result<(), CliError> {
    let remote = resolve_remote_config(profile).map_err(CliError::Config)?;
    let service = open_service(db_path, &remote).await?;

    match command {
        Some(Commands::Log { command }) => run_log(command, &service).await,
        Some(Commands::Topic { command }) => run_topic(command, &service).await,
        Some(Commands::App { command }) => run_app(command, &service).await,
        Some(Commands::Settings { command }) => run_settings(command, &service).await,
        Some(Commands::Stats { json }) => run_stats(json, &service).await,
        None => run_stats(false, &service).await,
        Some(Commands::Sync { command: None }) => run_sync(&service).await,
        Some(Commands::Sync {
            command: Some(SyncCommands::Status),
        }) => run_sync_status(&service, remote.configured_user_id()).await,
        Some(Commands::Sync {
            command: Some(SyncCommands::Conflicts { limit, json }),
        }) => run_sync_conflicts(limit, json, &service).await,
        Some(Commands::Export { format, output }) => {
            run_export(format, output.as_deref(), &service).await
        }
        Some(Commands::Completions { .. } | Commands::Config { .. }) => Ok(()),
    }
}
