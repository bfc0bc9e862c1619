// Savor HTTP Gateway
// Main entry point for the savor-gateway binary

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use savor_engine::config::Config;
use savor_engine::db::{Database, SqlitePreferenceStore};
use savor_engine::dialog::DialogOrchestrator;
use savor_engine::nlu::HttpRecognizer;
use savor_engine::queue::SqliteQueue;
use savor_engine::telemetry::{init_telemetry, init_telemetry_with_level};
use savor_gateway::{router, AppState};

/// Savor HTTP Gateway
///
/// Serves the dialog engine over REST for channel integrations.
#[derive(Parser, Debug)]
#[command(name = "savor-gateway")]
#[command(version, about, long_about = None)]
struct Args {
    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, value_name = "LEVEL")]
    log: Option<String>,

    /// Specify alternate configuration file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Bind address override (default comes from config)
    #[arg(long, value_name = "ADDR")]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize basic telemetry first (before config is loaded)
    init_telemetry();

    let version = env!("CARGO_PKG_VERSION");
    tracing::info!("Savor Gateway v{}", version);

    // Load configuration (or use custom path if provided)
    let config = if let Some(config_path) = &args.config {
        Config::load_from_path(config_path)?
    } else {
        Config::load_or_create()?
    };

    // Re-initialize telemetry with the CLI override or the config-driven
    // log level (only takes effect if RUST_LOG env var is not set)
    let log_level = args.log.as_deref().unwrap_or(&config.core.log_level);
    init_telemetry_with_level(log_level);

    let database = Database::new(&config.database_path())
        .await
        .context("Failed to open database")?;

    let recognizer = Arc::new(HttpRecognizer::new(config.nlu.clone()));
    let preferences = Arc::new(SqlitePreferenceStore::new(database.pool().clone()));
    let queue = Arc::new(SqliteQueue::new(database.pool().clone()));
    let orchestrator = Arc::new(DialogOrchestrator::new(recognizer, preferences, queue));

    let app = router(AppState { orchestrator });

    let bind_addr = args.bind.unwrap_or_else(|| config.gateway.bind_addr.clone());
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;

    tracing::info!("Gateway listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("Gateway shutting down gracefully");
        })
        .await
        .context("Gateway server error")?;

    database.close().await?;
    Ok(())
}
