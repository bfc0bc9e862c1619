//! Error types and handling
//!
//! Shared error type for engine bootstrap concerns (configuration and
//! filesystem layout). Collaborator clients define their own error enums
//! next to their traits; database and handler plumbing uses `anyhow`.

use thiserror::Error;

/// Main engine error type
///
/// Covers the failures that can occur before the pipeline is wired up:
/// reading and validating configuration, and resolving the data directory.
/// Messages are safe to display to end users.
#[derive(Debug, Error)]
pub enum EngineError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Path canonicalization failed for {0:?}: {1}")]
    PathCanonicalization(std::path::PathBuf, String),
}
