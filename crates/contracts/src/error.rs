//! Layered error definitions
//!
//! Categorized by source: config / store / delivery

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Object Store Errors =====
    /// Object does not exist
    #[error("object not found: {bucket}/{key}")]
    ObjectNotFound { bucket: String, key: String },

    /// Object exists but could not be read
    #[error("failed to retrieve {bucket}/{key}: {message}")]
    ObjectRetrieval {
        bucket: String,
        key: String,
        message: String,
    },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create object retrieval error
    pub fn object_retrieval(
        bucket: impl Into<String>,
        key: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::ObjectRetrieval {
            bucket: bucket.into(),
            key: key.into(),
            message: message.into(),
        }
    }
}

/// Failure of a single outbound request
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// Request exceeded its timeout
    #[error("request timed out")]
    Timeout,

    /// Could not connect to the target
    #[error("connection failed: {0}")]
    Connect(String),

    /// Any other transport-level failure
    #[error("transport error: {0}")]
    Transport(String),

    /// Target answered with a status other than 200
    #[error("unexpected status code {0}")]
    Status(u16),
}
