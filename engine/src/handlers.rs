//! Command handlers for CLI operations
//!
//! This module implements the handlers for all CLI commands:
//! - chat: Talk to the dining assistant (single turn or interactive loop)
//! - worker: Drain the request queue and send suggestion notifications
//! - catalog import / list: Manage the restaurant catalog
//! - config show / validate: Inspect the active configuration

use anyhow::{Context, Result};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;

use crate::config::Config;
use crate::db::{Database, Restaurant, SqliteCatalogStore, SqlitePreferenceStore};
use crate::dialog::{BotReply, DialogOrchestrator};
use crate::nlu::HttpRecognizer;
use crate::notify::HttpNotifier;
use crate::queue::SqliteQueue;
use crate::search::HttpSearchIndex;
use crate::worker::FulfillmentWorker;

/// Output format for command results
#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for machine consumption
    Json,
}

/// Talk to the dining assistant
///
/// With an inline utterance this runs a single dialog turn and prints the
/// reply. Without one it starts an interactive loop that carries the session
/// id across turns until EOF or "quit".
pub async fn handle_chat(
    session: Option<String>,
    text: Option<String>,
    config: &Config,
    format: OutputFormat,
) -> Result<()> {
    let database = Database::new(&config.database_path())
        .await
        .context("Failed to open database")?;

    let recognizer = Arc::new(HttpRecognizer::new(config.nlu.clone()));
    let preferences = Arc::new(SqlitePreferenceStore::new(database.pool().clone()));
    let queue = Arc::new(SqliteQueue::new(database.pool().clone()));
    let orchestrator = DialogOrchestrator::new(recognizer, preferences, queue);

    match text {
        Some(utterance) => {
            let reply = orchestrator.respond(session.as_deref(), &utterance).await;
            print_reply(&reply, format)?;
        }
        None => {
            interactive_chat(&orchestrator, session, format).await?;
        }
    }

    database.close().await?;
    Ok(())
}

/// Read utterances line by line, threading the session id across turns
async fn interactive_chat(
    orchestrator: &DialogOrchestrator,
    mut session: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    use std::io::{self, Write};

    println!("Savor dining assistant. Press Ctrl-D or type \"quit\" to leave.");

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            break;
        }

        let utterance = line.trim();
        if utterance.eq_ignore_ascii_case("quit") || utterance.eq_ignore_ascii_case("exit") {
            break;
        }

        let reply = orchestrator.respond(session.as_deref(), utterance).await;
        session = Some(reply.session_id.clone());
        print_reply(&reply, format)?;
    }

    Ok(())
}

/// Print a dialog reply in the requested format
fn print_reply(reply: &BotReply, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            println!("[{}] {}", reply.session_id, reply.message);
        }
        OutputFormat::Json => {
            let output = json!({
                "session_id": reply.session_id,
                "message": reply.message,
                "fulfilled_intent": reply.fulfilled.map(|intent| intent.wire_name()),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}

/// Run the fulfillment worker
///
/// With `once` set this drains a single batch and prints the cycle stats.
/// Otherwise it polls the queue until a shutdown signal arrives.
pub async fn handle_worker(once: bool, config: &Config, format: OutputFormat) -> Result<()> {
    let database = Database::new(&config.database_path())
        .await
        .context("Failed to open database")?;

    let queue = Arc::new(SqliteQueue::new(database.pool().clone()));
    let search = Arc::new(HttpSearchIndex::new(config.search.clone()));
    let catalog = Arc::new(SqliteCatalogStore::new(database.pool().clone()));
    let notifier = Arc::new(HttpNotifier::new(config.notify.clone()));
    let worker = FulfillmentWorker::new(queue, search, catalog, notifier, &config.worker);

    if once {
        let stats = worker.run_once().await?;
        match format {
            OutputFormat::Text => {
                println!("Received:  {}", stats.received);
                println!("Delivered: {}", stats.delivered);
                println!("Skipped:   {}", stats.skipped);
                println!("Failed:    {}", stats.failed);
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            }
        }
    } else {
        let poll_interval = std::time::Duration::from_secs(config.worker.poll_interval_secs);
        tokio::select! {
            _ = worker.run(poll_interval) => {}
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown signal received, stopping worker");
            }
        }
    }

    database.close().await?;
    Ok(())
}

/// Import restaurants from a JSON file into the catalog
pub async fn handle_catalog_import(
    file: &Path,
    config: &Config,
    format: OutputFormat,
) -> Result<()> {
    let payload = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let restaurants: Vec<Restaurant> =
        serde_json::from_str(&payload).context("Failed to parse restaurant JSON")?;

    let database = Database::new(&config.database_path())
        .await
        .context("Failed to open database")?;
    let catalog = SqliteCatalogStore::new(database.pool().clone());

    for restaurant in &restaurants {
        catalog
            .insert(restaurant)
            .await
            .with_context(|| format!("Failed to insert restaurant {}", restaurant.id))?;
    }

    let total = catalog.count().await?;

    match format {
        OutputFormat::Text => {
            println!(
                "Imported {} restaurants ({} total in catalog)",
                restaurants.len(),
                total
            );
        }
        OutputFormat::Json => {
            let output = json!({
                "imported": restaurants.len(),
                "total": total
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    database.close().await?;
    Ok(())
}

/// List recently imported restaurants
pub async fn handle_catalog_list(limit: i64, config: &Config, format: OutputFormat) -> Result<()> {
    let database = Database::new(&config.database_path())
        .await
        .context("Failed to open database")?;
    let catalog = SqliteCatalogStore::new(database.pool().clone());

    let restaurants = catalog
        .recent(limit)
        .await
        .context("Failed to fetch restaurants")?;

    match format {
        OutputFormat::Text => {
            if restaurants.is_empty() {
                println!("No restaurants in catalog");
            } else {
                println!("Restaurants (last {} imported):", limit);
                println!();

                for restaurant in &restaurants {
                    println!("{} ({})", restaurant.name, restaurant.cuisine);
                    println!("  ID: {}", restaurant.id);
                    println!("  Address: {}", restaurant.address);
                    if let Some(rating) = restaurant.rating {
                        println!(
                            "  Rating: {:.1} ({} reviews)",
                            rating,
                            restaurant.review_count.unwrap_or(0)
                        );
                    }
                    println!();
                }
            }
        }
        OutputFormat::Json => {
            let output = json!({
                "restaurants": restaurants,
                "count": restaurants.len()
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    database.close().await?;
    Ok(())
}

/// Show the active configuration
pub fn handle_config_show(config: &Config, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            let rendered =
                toml::to_string_pretty(config).context("Failed to render configuration")?;
            print!("{}", rendered);
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(config)?);
        }
    }
    Ok(())
}

/// Report the validation outcome for the loaded configuration
pub fn handle_config_validate(config: &Config, format: OutputFormat) -> Result<()> {
    // Config is already validated when loaded; reaching this point means it
    // passed.
    match format {
        OutputFormat::Text => {
            println!("Configuration is valid");
            println!("  Data dir:  {}", config.core.data_dir.display());
            println!("  NLU:       {}", config.nlu.base_url);
            println!("  Search:    {}", config.search.base_url);
            println!("  Notify:    {}", config.notify.base_url);
            println!("  Gateway:   {}", config.gateway.bind_addr);
        }
        OutputFormat::Json => {
            let output = json!({
                "valid": true,
                "data_dir": config.core.data_dir,
                "nlu_base_url": config.nlu.base_url,
                "search_base_url": config.search.base_url,
                "notify_base_url": config.notify.base_url,
                "gateway_bind_addr": config.gateway.bind_addr
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}
