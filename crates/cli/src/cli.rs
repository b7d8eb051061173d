//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// line-relay - forward every line of a stored object to an HTTP endpoint
#[derive(Parser, Debug)]
#[command(
    name = "line-relay",
    author,
    version,
    about = "Relay line-delimited objects to an HTTP endpoint",
    long_about = "Reads object-created notifications, fetches each announced object,\n\
                  splits it into line records and sends every record to the target\n\
                  endpoint from concurrently running batch workers."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "LINE_RELAY_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "LINE_RELAY_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Default log level derived from `-v` / `-q`
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            return "warn";
        }
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }

    /// Tracing 配置；指标导出由 `run` 在配置确定后再安装
    pub fn observability_config(&self) -> observability::ObservabilityConfig {
        observability::ObservabilityConfig {
            log_format: self.log_format.into(),
            metrics_port: None,
            default_log_level: self.log_level().to_string(),
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Process notification events and relay every announced object
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON); flags and env override it
    #[arg(short, long, env = "LINE_RELAY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Target endpoint receiving one GET per record
    #[arg(long, env = "URL")]
    pub url: Option<String>,

    /// Records per batch
    #[arg(long, env = "BULK_COUNT", allow_negative_numbers = true)]
    pub bulk_count: Option<i64>,

    /// Per-request timeout in seconds
    #[arg(long, env = "REQUEST_TIMEOUT_SECS")]
    pub timeout: Option<u64>,

    /// Maximum batch workers running at once
    #[arg(long, env = "MAX_CONCURRENCY")]
    pub max_concurrency: Option<usize>,

    /// Append decoded record fields to the URL as query parameters
    #[arg(long, env = "ENRICH")]
    pub enrich: bool,

    /// Object store root directory (one sub-directory per bucket)
    #[arg(long, env = "STORE_ROOT")]
    pub store_root: Option<PathBuf>,

    /// Notification events file, `-` for stdin
    #[arg(short, long, default_value = "-", env = "LINE_RELAY_EVENTS")]
    pub events: String,

    /// Log records instead of sending them
    #[arg(long)]
    pub dry_run: bool,

    /// Channel buffer size for the notification feed
    #[arg(long, default_value = "16", env = "LINE_RELAY_BUFFER_SIZE")]
    pub buffer_size: usize,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "LINE_RELAY_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "relay.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,

    /// Print the configuration with defaults filled in
    #[arg(long)]
    pub show: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}
