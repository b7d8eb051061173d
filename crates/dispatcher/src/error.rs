//! Dispatcher error types

use thiserror::Error;

/// Dispatcher-specific errors
///
/// Only construction can fail; dispatch itself reports through outcomes.
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// Target URL rejected
    #[error("invalid dispatch target '{target}': {message}")]
    InvalidTarget { target: String, message: String },

    /// HTTP client could not be built
    #[error("failed to create sender for '{target}': {message}")]
    SenderCreation { target: String, message: String },
}

impl DispatcherError {
    /// Create a sender creation error
    pub fn sender_creation(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SenderCreation {
            target: target.into(),
            message: message.into(),
        }
    }

    /// Create an invalid target error
    pub fn invalid_target(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidTarget {
            target: target.into(),
            message: message.into(),
        }
    }
}
