//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{RelayConfig, ValidatedConfig};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
    #[serde(skip)]
    normalized: Option<String>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    target_url: String,
    batch_size: usize,
    timeout_secs: u64,
    max_concurrency: usize,
    enrich: bool,
    store_root: String,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();
    let invalid = |error: String| ValidationResult {
        valid: false,
        config_path: config_path.clone(),
        error: Some(error),
        warnings: None,
        summary: None,
        normalized: None,
    };

    if !args.config.exists() {
        return invalid(format!("File not found: {}", args.config.display()));
    }

    let raw = match config_loader::ConfigLoader::read_from_path(&args.config) {
        Ok(raw) => raw,
        Err(e) => return invalid(e.to_string()),
    };

    let validated = match config_loader::ConfigLoader::validate(&raw) {
        Ok(validated) => validated,
        Err(e) => return invalid(e.to_string()),
    };

    let normalized = if args.show {
        match config_loader::ConfigLoader::to_toml(&raw) {
            Ok(toml) => Some(toml),
            Err(e) => return invalid(e.to_string()),
        }
    } else {
        None
    };

    let warnings = collect_warnings(&raw, &validated);

    ValidationResult {
        valid: true,
        config_path: config_path.clone(),
        error: None,
        warnings: if warnings.is_empty() {
            None
        } else {
            Some(warnings)
        },
        summary: Some(ConfigSummary {
            version: format!("{:?}", raw.version),
            target_url: validated.target_url.clone(),
            batch_size: validated.batch_size.get(),
            timeout_secs: validated.request_timeout.as_secs(),
            max_concurrency: validated.max_concurrency.get(),
            enrich: validated.enrich,
            store_root: validated.store_root.display().to_string(),
        }),
        normalized,
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(raw: &RelayConfig, config: &ValidatedConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.target_url.starts_with("http://") {
        warnings.push("target.url uses plain http".to_string());
    }

    if config.max_concurrency.get() < 2 {
        warnings.push("dispatch.max_concurrency is 1 - batches will run one at a time".to_string());
    }

    if !raw.store.root.exists() {
        warnings.push(format!(
            "store.root '{}' does not exist - every retrieval will fail",
            raw.store.root.display()
        ));
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Target: {}", summary.target_url);
            println!("  Batch size: {}", summary.batch_size);
            println!("  Request timeout: {}s", summary.timeout_secs);
            println!("  Max concurrency: {}", summary.max_concurrency);
            println!("  Enrich: {}", summary.enrich);
            println!("  Store root: {}", summary.store_root);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }

        if let Some(ref normalized) = result.normalized {
            println!("\n{}", normalized);
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
