// Savor Dining Suggestions Engine
// Main entry point for the savor binary

use clap::Parser;
use savor_engine::cli::{CatalogAction, Cli, Command, ConfigAction};
use savor_engine::config::Config;
use savor_engine::handlers::{
    handle_catalog_import, handle_catalog_list, handle_chat, handle_config_show,
    handle_config_validate, handle_worker, OutputFormat,
};
use savor_engine::telemetry::{init_telemetry, init_telemetry_with_level};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize basic telemetry first (before config is loaded)
    init_telemetry();

    let version = env!("CARGO_PKG_VERSION");
    tracing::info!("Savor Engine v{}", version);

    // Determine output format
    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    // Load configuration (or use custom path if provided)
    let config = if let Some(config_path) = &cli.config {
        Config::load_from_path(config_path)?
    } else {
        Config::load_or_create()?
    };

    // Re-initialize telemetry with the CLI override or the config-driven
    // log level (only takes effect if RUST_LOG env var is not set)
    let log_level = cli.log.as_deref().unwrap_or(&config.core.log_level);
    init_telemetry_with_level(log_level);

    // Handle commands
    match cli.command {
        Command::Chat { session, text } => {
            tracing::debug!("Starting chat turn");
            handle_chat(session, text, &config, format).await
        }

        Command::Worker { once } => {
            tracing::info!("Starting fulfillment worker (once: {})", once);
            handle_worker(once, &config, format).await
        }

        Command::Catalog { action } => match action {
            CatalogAction::Import { file } => {
                tracing::info!("Importing restaurants from {}", file.display());
                handle_catalog_import(&file, &config, format).await
            }
            CatalogAction::List { limit } => handle_catalog_list(limit, &config, format).await,
        },

        Command::Config { action } => match action {
            ConfigAction::Show => handle_config_show(&config, format),
            ConfigAction::Validate => handle_config_validate(&config, format),
        },
    }
}
