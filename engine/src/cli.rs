//! CLI interface for Savor
//!
//! This module provides the command-line interface using clap's derive API.
//! It defines all commands and global flags for driving the dialog engine,
//! the fulfillment worker, and the restaurant catalog.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Savor Dining Suggestions Engine
///
/// A conversational intake pipeline that collects dining preferences over a
/// short dialog, queues completed requests, and emails restaurant suggestions.
#[derive(Parser, Debug)]
#[command(name = "savor")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log: Option<String>,

    /// Specify alternate configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Talk to the dining assistant
    Chat {
        /// Session ID to continue (a new one is minted when omitted)
        #[arg(long, value_name = "ID")]
        session: Option<String>,

        /// Single utterance to send; without it an interactive loop starts
        text: Option<String>,
    },

    /// Run the fulfillment worker
    Worker {
        /// Drain one batch and exit instead of polling forever
        #[arg(long)]
        once: bool,
    },

    /// Manage the restaurant catalog
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Restaurant catalog management actions
#[derive(Subcommand, Debug)]
pub enum CatalogAction {
    /// Import restaurants from a JSON file
    Import {
        /// Path to a JSON array of restaurant records
        file: PathBuf,
    },

    /// List recently imported restaurants
    List {
        /// Number of restaurants to show (default: 10)
        #[arg(short, long, default_value = "10")]
        limit: i64,
    },
}

/// Configuration management actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Validate configuration file
    Validate,
}
