//! CLI command definitions and dispatch.

pub mod send;
pub mod sweep;
pub mod watch;

use clap::{Parser, Subcommand};

use geliom_core::config::AppConfig;
use geliom_core::error::AppError;
use geliom_database::DatabasePool;

use crate::output::OutputFormat;

/// Geliom notification backend tools
#[derive(Debug, Parser)]
#[command(name = "geliom", version, about, long_about = None)]
pub struct Cli {
    /// Configuration overlay to merge over config/default.toml
    #[arg(short, long, default_value = "development")]
    pub env: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Dispatch one notification through the rate-limit gate
    Send(send::SendArgs),
    /// Process every due pending notification once
    Sweep,
    /// Follow a group dashboard as realtime changes arrive
    Watch(watch::WatchArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        let config = AppConfig::load(&self.env)?;
        match &self.command {
            Commands::Send(args) => send::execute(args, config, self.format).await,
            Commands::Sweep => sweep::execute(config, self.format).await,
            Commands::Watch(args) => watch::execute(args, config, self.format).await,
        }
    }
}

/// Helper: connect to the configured database
pub async fn create_db_pool(config: &AppConfig) -> Result<DatabasePool, AppError> {
    DatabasePool::connect(&config.database).await
}
