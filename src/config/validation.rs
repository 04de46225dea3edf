use crate::config::types::{Config, CrawlerConfig, FilterConfig, OutputConfig};
use crate::ConfigError;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_filter_config(&config.filter)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.concurrency < 1 || config.concurrency > 100 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and 100, got {}",
            config.concurrency
        )));
    }

    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max_pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    if config.timeout_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "timeout_ms must be >= 100ms, got {}ms",
            config.timeout_ms
        )));
    }

    if let Some(user_agent) = &config.user_agent {
        if user_agent.trim().is_empty() {
            return Err(ConfigError::Validation(
                "user_agent cannot be empty when set".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validates filter configuration
fn validate_filter_config(config: &FilterConfig) -> Result<(), ConfigError> {
    for pattern in config.include.iter().chain(&config.exclude) {
        validate_glob_pattern(pattern)?;
    }

    for param in &config.allowed_query_params {
        if param.is_empty() {
            return Err(ConfigError::Validation(
                "allowed_query_params cannot contain empty names".to_string(),
            ));
        }
    }

    for prefix in &config.dropped_query_param_prefixes {
        if prefix.is_empty() {
            return Err(ConfigError::Validation(
                "dropped_query_param_prefixes cannot contain empty prefixes".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if matches!(config.summary_path.as_deref(), Some("")) {
        return Err(ConfigError::Validation(
            "summary_path cannot be empty when set".to_string(),
        ));
    }

    if matches!(config.json_path.as_deref(), Some("")) {
        return Err(ConfigError::Validation(
            "json_path cannot be empty when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates an include/exclude glob pattern
///
/// Any non-empty string compiles, so only blank patterns are rejected.
pub fn validate_glob_pattern(pattern: &str) -> Result<(), ConfigError> {
    if pattern.trim().is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Glob pattern cannot be empty".to_string(),
        ));
    }

    Ok(())
}
