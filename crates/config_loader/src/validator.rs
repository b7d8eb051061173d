//! 配置校验模块
//!
//! 校验规则：
//! - target.url 必填且为 http/https 绝对地址
//! - target.timeout_secs > 0
//! - dispatch.bulk_count > 0
//! - dispatch.max_concurrency > 0

use std::num::NonZeroUsize;
use std::time::Duration;

use contracts::{ContractError, RelayConfig, ValidatedConfig};

/// 校验 RelayConfig 配置
///
/// 返回第一个遇到的错误，或校验后的配置。
pub fn validate(config: &RelayConfig) -> Result<ValidatedConfig, ContractError> {
    let target_url = validate_target_url(config)?;
    let request_timeout = validate_timeout(config)?;
    let batch_size = validate_bulk_count(config)?;
    let max_concurrency = validate_max_concurrency(config)?;

    Ok(ValidatedConfig::new(
        target_url,
        batch_size,
        request_timeout,
        max_concurrency,
        config.target.enrich,
        config.store.root.clone(),
    ))
}

/// 校验目标地址
fn validate_target_url(config: &RelayConfig) -> Result<String, ContractError> {
    let raw = config.target.url.trim();
    if raw.is_empty() {
        return Err(ContractError::config_validation(
            "target.url",
            "target url cannot be empty",
        ));
    }

    let parsed = url::Url::parse(raw).map_err(|e| {
        ContractError::config_validation("target.url", format!("invalid url '{raw}': {e}"))
    })?;

    match parsed.scheme() {
        "http" | "https" => Ok(raw.to_string()),
        other => Err(ContractError::config_validation(
            "target.url",
            format!("unsupported scheme '{other}', expected http or https"),
        )),
    }
}

/// 校验单请求超时
fn validate_timeout(config: &RelayConfig) -> Result<Duration, ContractError> {
    if config.target.timeout_secs == 0 {
        return Err(ContractError::config_validation(
            "target.timeout_secs",
            "timeout_secs must be > 0",
        ));
    }
    Ok(Duration::from_secs(config.target.timeout_secs))
}

/// 校验批大小
fn validate_bulk_count(config: &RelayConfig) -> Result<NonZeroUsize, ContractError> {
    let bulk_count = config.dispatch.bulk_count;
    usize::try_from(bulk_count)
        .ok()
        .and_then(NonZeroUsize::new)
        .ok_or_else(|| {
            ContractError::config_validation(
                "dispatch.bulk_count",
                format!("bulk_count must be > 0, got {bulk_count}"),
            )
        })
}

/// 校验并发上限
fn validate_max_concurrency(config: &RelayConfig) -> Result<NonZeroUsize, ContractError> {
    NonZeroUsize::new(config.dispatch.max_concurrency).ok_or_else(|| {
        ContractError::config_validation(
            "dispatch.max_concurrency",
            "max_concurrency must be > 0",
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{DispatchConfig, StoreConfig, TargetConfig};

    fn minimal_config() -> RelayConfig {
        RelayConfig {
            target: TargetConfig {
                url: "http://localhost:8080/hook".into(),
                ..Default::default()
            },
            dispatch: DispatchConfig {
                bulk_count: 10,
                ..Default::default()
            },
            store: StoreConfig::default(),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_config() {
        let validated = validate(&minimal_config()).unwrap();
        assert_eq!(validated.batch_size.get(), 10);
        assert_eq!(validated.request_timeout, Duration::from_secs(10));
        assert!(!validated.enrich);
    }

    #[test]
    fn test_missing_url() {
        let mut config = minimal_config();
        config.target.url = "  ".into();
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("cannot be empty"), "got: {err}");
    }

    #[test]
    fn test_invalid_url() {
        let mut config = minimal_config();
        config.target.url = "not a url".into();
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("invalid url"), "got: {err}");

        config.target.url = "ftp://example.com/x".into();
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("unsupported scheme"), "got: {err}");
    }

    #[test]
    fn test_non_positive_bulk_count() {
        for bad in [0, -3] {
            let mut config = minimal_config();
            config.dispatch.bulk_count = bad;
            let err = validate(&config).unwrap_err().to_string();
            assert!(err.contains("bulk_count must be > 0"), "got: {err}");
        }
    }

    #[test]
    fn test_zero_timeout() {
        let mut config = minimal_config();
        config.target.timeout_secs = 0;
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("timeout_secs"), "got: {err}");
    }

    #[test]
    fn test_zero_concurrency() {
        let mut config = minimal_config();
        config.dispatch.max_concurrency = 0;
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("max_concurrency"), "got: {err}");
    }
}
