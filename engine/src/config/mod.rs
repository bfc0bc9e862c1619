//! Configuration management
//!
//! This module handles loading, validation, and management of the Savor
//! configuration. Configuration is stored in TOML format at
//! ~/.savor/config.toml.
//!
//! # Configuration Sections
//!
//! - **core**: Data directory, log level
//! - **nlu**: Language-understanding engine endpoint
//! - **worker**: Fulfillment worker batch size, poll interval, visibility timeout
//! - **search**: Restaurant search index endpoint
//! - **notify**: Notification relay endpoint and sender address
//! - **gateway**: HTTP gateway bind address
//!
//! # Path Expansion
//!
//! The configuration system automatically:
//! - Expands ~ to the user's home directory
//! - Creates the data directory if it doesn't exist
//!
//! # Examples
//!
//! ```no_run
//! use savor_engine::config::Config;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load configuration from default location
//! let config = Config::load_or_create()?;
//!
//! // Access configuration values
//! println!("Data dir: {:?}", config.core.data_dir);
//! println!("NLU endpoint: {}", config.nlu.base_url);
//! # Ok(())
//! # }
//! ```

use crate::errors::EngineError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure
///
/// This structure represents the complete Savor configuration loaded from
/// ~/.savor/config.toml. Every section falls back to defaults when absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Core engine settings
    #[serde(default)]
    pub core: CoreConfig,

    /// Language-understanding engine settings
    #[serde(default)]
    pub nlu: NluConfig,

    /// Fulfillment worker settings
    #[serde(default)]
    pub worker: WorkerConfig,

    /// Restaurant search index settings
    #[serde(default)]
    pub search: SearchConfig,

    /// Notification relay settings
    #[serde(default)]
    pub notify: NotifyConfig,

    /// HTTP gateway settings
    #[serde(default)]
    pub gateway: GatewayConfig,
}

/// Core engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Data directory path (supports ~ expansion); holds the sqlite database
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Language-understanding engine configuration
///
/// The engine is an external HTTP collaborator; only its endpoint and
/// request shaping live here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NluConfig {
    /// Base URL for the recognition API
    #[serde(default = "default_nlu_base_url")]
    pub base_url: String,

    /// Locale sent with every recognition request
    #[serde(default = "default_locale")]
    pub locale: String,

    /// Request timeout in seconds
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,

    /// Bearer token for the recognition API, if the deployment requires one
    #[serde(default)]
    pub api_key: Option<String>,
}

/// Fulfillment worker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Maximum messages claimed per drain cycle (1-10)
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,

    /// Seconds to sleep between drain cycles
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Seconds a claimed message stays invisible before redelivery
    #[serde(default = "default_visibility_timeout")]
    pub visibility_timeout_secs: u64,
}

/// Restaurant search index configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Base URL for the search cluster
    #[serde(default = "default_search_base_url")]
    pub base_url: String,

    /// Index name queried for restaurant suggestions
    #[serde(default = "default_search_index")]
    pub index: String,

    /// Basic-auth username, if the cluster requires one
    #[serde(default)]
    pub username: Option<String>,

    /// Basic-auth password, if the cluster requires one
    #[serde(default)]
    pub password: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,
}

/// Notification relay configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Base URL for the mail relay API
    #[serde(default = "default_notify_base_url")]
    pub base_url: String,

    /// Sender address stamped on outgoing suggestions
    #[serde(default = "default_sender")]
    pub sender: String,

    /// Bearer token for the relay, if the deployment requires one
    #[serde(default)]
    pub api_key: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,
}

/// HTTP gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Address the gateway binds to
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

// Default value functions
fn default_data_dir() -> PathBuf {
    PathBuf::from("~/.savor")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_nlu_base_url() -> String {
    "http://localhost:8087".to_string()
}

fn default_locale() -> String {
    "en_US".to_string()
}

fn default_http_timeout() -> u64 {
    10
}

fn default_batch_size() -> u32 {
    5
}

fn default_poll_interval() -> u64 {
    60
}

fn default_visibility_timeout() -> u64 {
    30
}

fn default_search_base_url() -> String {
    "http://localhost:9200".to_string()
}

fn default_search_index() -> String {
    "restaurants".to_string()
}

fn default_notify_base_url() -> String {
    "http://localhost:8025".to_string()
}

fn default_sender() -> String {
    "suggestions@savor.local".to_string()
}

fn default_bind_addr() -> String {
    "127.0.0.1:8080".to_string()
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
        }
    }
}

impl Default for NluConfig {
    fn default() -> Self {
        Self {
            base_url: default_nlu_base_url(),
            locale: default_locale(),
            timeout_secs: default_http_timeout(),
            api_key: None,
        }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            poll_interval_secs: default_poll_interval(),
            visibility_timeout_secs: default_visibility_timeout(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: default_search_base_url(),
            index: default_search_index(),
            username: None,
            password: None,
            timeout_secs: default_http_timeout(),
        }
    }
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            base_url: default_notify_base_url(),
            sender: default_sender(),
            api_key: None,
            timeout_secs: default_http_timeout(),
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

impl Config {
    /// Load configuration from the default location (~/.savor/config.toml)
    ///
    /// If the configuration file doesn't exist, creates a default configuration.
    /// Validates the configuration after loading and returns descriptive errors
    /// if validation fails.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration file cannot be read
    /// - TOML parsing fails
    /// - Validation fails (invalid values, unusable paths)
    pub fn load_or_create() -> Result<Self, EngineError> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load_from_path(&config_path)
        } else {
            Self::create_default(&config_path)
        }
    }

    /// Load configuration from a specific path
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    pub fn load_from_path(path: &Path) -> Result<Self, EngineError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("Failed to read config file: {}", e)))?;

        let mut config: Config = toml::from_str(&contents)
            .map_err(|e| EngineError::Config(format!("Failed to parse config: {}", e)))?;

        // Validate and process configuration
        config.validate_and_process()?;

        Ok(config)
    }

    /// Create default configuration and save to path
    ///
    /// Creates the configuration directory if it doesn't exist, generates
    /// a default configuration, and saves it to the specified path.
    fn create_default(path: &Path) -> Result<Self, EngineError> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                EngineError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        // Create default configuration
        let mut config = Self::default_config();

        // Validate and process
        config.validate_and_process()?;

        // Serialize to TOML
        let toml_string = toml::to_string_pretty(&config)
            .map_err(|e| EngineError::Config(format!("Failed to serialize config: {}", e)))?;

        // Write to file
        fs::write(path, toml_string)
            .map_err(|e| EngineError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(config)
    }

    /// Get the default configuration file path (~/.savor/config.toml)
    fn default_config_path() -> Result<PathBuf, EngineError> {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(".savor").join("config.toml"))
    }

    /// Create a default configuration
    pub fn default_config() -> Self {
        Self {
            core: CoreConfig::default(),
            nlu: NluConfig::default(),
            worker: WorkerConfig::default(),
            search: SearchConfig::default(),
            notify: NotifyConfig::default(),
            gateway: GatewayConfig::default(),
        }
    }

    /// Path of the sqlite database inside the data directory
    pub fn database_path(&self) -> PathBuf {
        self.core.data_dir.join("savor.db")
    }

    /// Validate and process configuration
    ///
    /// This method:
    /// - Validates field values and ranges
    /// - Expands ~ in the data directory path
    /// - Creates the data directory if it doesn't exist
    ///
    /// # Errors
    ///
    /// Returns an error if a field is out of range, a URL is empty, or the
    /// data directory cannot be created or resolved.
    pub fn validate_and_process(&mut self) -> Result<(), EngineError> {
        // Validate log level
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.core.log_level.as_str()) {
            return Err(EngineError::Config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.core.log_level,
                valid_log_levels.join(", ")
            )));
        }

        // Validate worker ranges
        if self.worker.batch_size == 0 || self.worker.batch_size > 10 {
            return Err(EngineError::Config(
                "worker.batch_size must be between 1 and 10".to_string(),
            ));
        }
        if self.worker.visibility_timeout_secs == 0 {
            return Err(EngineError::Config(
                "worker.visibility_timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.worker.poll_interval_secs == 0 {
            return Err(EngineError::Config(
                "worker.poll_interval_secs must be at least 1".to_string(),
            ));
        }

        // Validate endpoints
        for (name, url) in [
            ("nlu.base_url", &self.nlu.base_url),
            ("search.base_url", &self.search.base_url),
            ("notify.base_url", &self.notify.base_url),
        ] {
            if url.trim().is_empty() {
                return Err(EngineError::Config(format!("{} must not be empty", name)));
            }
        }
        if self.search.index.trim().is_empty() {
            return Err(EngineError::Config(
                "search.index must not be empty".to_string(),
            ));
        }

        // Validate sender address
        if !self.notify.sender.contains('@') {
            return Err(EngineError::Config(format!(
                "notify.sender '{}' is not a valid address",
                self.notify.sender
            )));
        }

        // Expand and resolve the data directory, creating it if needed
        self.core.data_dir = expand_path(&self.core.data_dir)?;
        self.core.data_dir = canonicalize_or_create(&self.core.data_dir)?;

        Ok(())
    }
}

/// Expand ~ in path to user's home directory
fn expand_path(path: &Path) -> Result<PathBuf, EngineError> {
    let path_str = path
        .to_str()
        .ok_or_else(|| EngineError::Config("Invalid UTF-8 in path".to_string()))?;

    if let Some(rest) = path_str.strip_prefix("~/") {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(rest))
    } else if path_str == "~" {
        dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))
    } else {
        Ok(path.to_path_buf())
    }
}

/// Canonicalize a directory, creating it first if it doesn't exist
fn canonicalize_or_create(path: &Path) -> Result<PathBuf, EngineError> {
    if path.exists() {
        path.canonicalize()
            .map_err(|e| EngineError::PathCanonicalization(path.to_path_buf(), e.to_string()))
    } else {
        fs::create_dir_all(path).map_err(|e| {
            EngineError::Config(format!("Failed to create directory {:?}: {}", path, e))
        })?;

        path.canonicalize()
            .map_err(|e| EngineError::PathCanonicalization(path.to_path_buf(), e.to_string()))
    }
}
