//! `run` command implementation.

use anyhow::{Context, Result};
use contracts::{RecordSender, RelayConfig, ValidatedConfig};
use dispatcher::{FanOutConfig, HttpSender, LogSender};
use ingestion::LocalFsObjectStore;
use tokio::io::{AsyncBufRead, BufReader};
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::error::{self, CliError};
use crate::pipeline::{Pipeline, PipelineConfig, PipelineStats};

type EventsInput = Box<dyn AsyncBufRead + Unpin + Send>;

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    // Fatal before any notification is read
    let config = resolve_config(args).context("Configuration rejected")?;

    info!(
        target_url = %config.target_url,
        batch_size = config.batch_size.get(),
        timeout_secs = config.request_timeout.as_secs(),
        max_concurrency = config.max_concurrency.get(),
        enrich = config.enrich,
        store_root = %config.store_root.display(),
        "Configuration loaded"
    );

    if args.metrics_port != 0 {
        observability::init_metrics_only(args.metrics_port)?;
    }

    let input = open_events(&args.events).await?;

    let stats = if args.dry_run {
        info!("Dry run mode - records are logged, not sent");
        relay(&config, args, LogSender::new(config.target_url.clone()), input).await
    } else {
        let sender = HttpSender::new(&config.target_url, config.request_timeout)
            .map_err(CliError::from)?;
        relay(&config, args, sender, input).await
    };

    info!(
        events = stats.events,
        notifications = stats.relay.notifications,
        skipped = stats.relay.skipped_notifications,
        records = stats.relay.records,
        duration_secs = stats.duration.as_secs_f64(),
        "Pipeline completed"
    );
    stats.print_summary();

    info!("line-relay finished");
    Ok(())
}

async fn relay<S>(
    config: &ValidatedConfig,
    args: &RunArgs,
    sender: S,
    input: EventsInput,
) -> PipelineStats
where
    S: RecordSender + Sync + 'static,
{
    let pipeline = Pipeline::new(
        LocalFsObjectStore::new(&config.store_root),
        sender,
        PipelineConfig {
            batch_size: config.batch_size,
            fan_out: FanOutConfig::from(config),
            buffer_size: args.buffer_size,
        },
    );

    pipeline.run(input, shutdown_signal()).await
}

/// Merge the optional config file with flag / env overrides and validate
fn resolve_config(args: &RunArgs) -> error::Result<ValidatedConfig> {
    let mut config = match args.config {
        Some(ref path) => {
            info!(config = %path.display(), "Loading configuration");
            config_loader::ConfigLoader::read_from_path(path)?
        }
        None => RelayConfig::default(),
    };

    apply_overrides(&mut config, args);
    Ok(config_loader::ConfigLoader::validate(&config)?)
}

fn apply_overrides(config: &mut RelayConfig, args: &RunArgs) {
    if let Some(ref url) = args.url {
        config.target.url = url.clone();
    }
    if let Some(bulk_count) = args.bulk_count {
        config.dispatch.bulk_count = bulk_count;
    }
    if let Some(timeout) = args.timeout {
        config.target.timeout_secs = timeout;
    }
    if let Some(max_concurrency) = args.max_concurrency {
        config.dispatch.max_concurrency = max_concurrency;
    }
    if args.enrich {
        config.target.enrich = true;
    }
    if let Some(ref root) = args.store_root {
        config.store.root = root.clone();
    }
}

async fn open_events(events: &str) -> error::Result<EventsInput> {
    if events == "-" {
        info!("Reading notification events from stdin");
        return Ok(Box::new(BufReader::new(tokio::io::stdin())));
    }

    let file = tokio::fs::File::open(events)
        .await
        .map_err(|e| CliError::events_input(events, e))?;
    info!(path = events, "Reading notification events from file");
    Ok(Box::new(BufReader::new(file)))
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    fn run_args(extra: &[&str]) -> RunArgs {
        let mut argv = vec!["run"];
        argv.extend_from_slice(extra);
        RunArgs::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_flags_alone_are_enough() {
        let args = run_args(&["--url", "http://localhost:9/hook", "--bulk-count", "5"]);
        let config = resolve_config(&args).unwrap();

        assert_eq!(config.batch_size.get(), 5);
        assert_eq!(config.request_timeout.as_secs(), 10);
        assert_eq!(config.max_concurrency.get(), 64);
        assert!(!config.enrich);
    }

    #[test]
    fn test_flags_override_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[target]\nurl = \"http://file.example/hook\"\ntimeout_secs = 3\n\n[dispatch]\nbulk_count = 100\n"
        )
        .unwrap();

        let path = file.path().to_str().unwrap().to_string();
        let args = run_args(&["--config", &path, "--bulk-count", "7", "--enrich"]);
        let config = resolve_config(&args).unwrap();

        assert_eq!(config.target_url, "http://file.example/hook");
        assert_eq!(config.request_timeout.as_secs(), 3);
        assert_eq!(config.batch_size.get(), 7);
        assert!(config.enrich);
    }

    #[test]
    fn test_invalid_batch_size_is_fatal() {
        for bulk in ["0", "-1"] {
            let args = run_args(&["--url", "http://localhost:9/hook", "--bulk-count", bulk]);
            assert!(matches!(resolve_config(&args), Err(CliError::Config(_))));
        }

        let args = run_args(&["--url", "http://localhost:9/hook"]);
        assert!(resolve_config(&args).is_err());
    }

    #[tokio::test]
    async fn test_missing_events_file() {
        let result = open_events("/definitely/not/here.jsonl").await;
        assert!(matches!(result, Err(CliError::EventsInput { .. })));
    }
}
