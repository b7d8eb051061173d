//! Error types for CLI operations.

use std::path::PathBuf;

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration could not be loaded or failed validation
    #[error("invalid configuration: {0}")]
    Config(#[from] contracts::ContractError),

    /// Outbound sender could not be built
    #[error("failed to create sender: {0}")]
    Sender(#[from] dispatcher::DispatcherError),

    /// Notification events input could not be opened
    #[error("cannot open events input {path}: {source}")]
    EventsInput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CliError {
    pub fn events_input(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::EventsInput {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
