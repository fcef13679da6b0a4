//! Geliom server: the notification functions, membership routes and the
//! pending-notification sweep in one process.

use tracing_subscriber::{EnvFilter, fmt};

use geliom_core::config::AppConfig;
use geliom_core::error::AppError;
use geliom_database::DatabasePool;

#[tokio::main]
async fn main() {
    let env = std::env::var("GELIOM_ENV").unwrap_or_else(|_| "development".to_string());
    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config, &env).await {
        tracing::error!(error = %e.details(), "Server error");
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

async fn run(config: AppConfig, env: &str) -> Result<(), AppError> {
    tracing::info!(env, "Starting Geliom v{}", env!("CARGO_PKG_VERSION"));

    tracing::info!("Connecting to database...");
    let db_pool = DatabasePool::connect_with_retry(&config.database).await?;

    geliom_api::run_server(config, db_pool).await
}
