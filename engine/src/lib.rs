//! Savor Engine Library
//!
//! This library provides the core functionality of the Savor engine.
//! It is used by the main binary, the HTTP gateway, and integration tests.

/// Configuration management module
pub mod config;

/// Engine error types
pub mod errors;

/// Database persistence module
pub mod db;

/// Dialog orchestration module
pub mod dialog;

/// Natural language understanding client
pub mod nlu;

/// Notification delivery module
pub mod notify;

/// Durable request queue module
pub mod queue;

/// Restaurant search index client
pub mod search;

/// Fulfillment worker module
pub mod worker;

/// Telemetry and Observability
pub mod telemetry;

/// CLI interface module
pub mod cli;

/// Command handlers module
pub mod handlers;
