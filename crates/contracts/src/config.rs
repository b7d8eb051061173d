//! RelayConfig - Config Loader output
//!
//! Raw configuration as read from file / environment, and the validated form
//! handed to the notification loop.

use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

/// Default per-request timeout in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Default cap on concurrently running batch workers
pub const DEFAULT_MAX_CONCURRENCY: usize = 64;

/// Config version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Full relay configuration (unvalidated)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Config version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Outbound endpoint settings
    #[serde(default)]
    pub target: TargetConfig,

    /// Batching and fan-out settings
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Object store settings
    #[serde(default)]
    pub store: StoreConfig,
}

/// Outbound endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Endpoint receiving one GET per record
    #[serde(default)]
    pub url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Append decoded record fields as query parameters
    #[serde(default)]
    pub enrich: bool,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            timeout_secs: default_timeout_secs(),
            enrich: false,
        }
    }
}

fn default_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

/// Batching and fan-out settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Records per batch; signed so that non-positive input can be reported
    #[serde(default)]
    pub bulk_count: i64,

    /// Maximum batch workers running at once
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            bulk_count: 0,
            max_concurrency: default_max_concurrency(),
        }
    }
}

fn default_max_concurrency() -> usize {
    DEFAULT_MAX_CONCURRENCY
}

/// Object store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Root directory; each bucket is a sub-directory
    #[serde(default = "default_store_root")]
    pub root: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: default_store_root(),
        }
    }
}

fn default_store_root() -> PathBuf {
    PathBuf::from(".")
}

/// Configuration after startup validation
///
/// Only constructible through validation, so holding one proves the batch
/// size and concurrency are positive and the URL is set.
#[derive(Debug, Clone)]
pub struct ValidatedConfig {
    pub target_url: String,
    pub batch_size: NonZeroUsize,
    pub request_timeout: Duration,
    pub max_concurrency: NonZeroUsize,
    pub enrich: bool,
    pub store_root: PathBuf,
}

impl ValidatedConfig {
    /// Assemble from already-checked parts
    pub fn new(
        target_url: String,
        batch_size: NonZeroUsize,
        request_timeout: Duration,
        max_concurrency: NonZeroUsize,
        enrich: bool,
        store_root: PathBuf,
    ) -> Self {
        Self {
            target_url,
            batch_size,
            request_timeout,
            max_concurrency,
            enrich,
            store_root,
        }
    }
}
