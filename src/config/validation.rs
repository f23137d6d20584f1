use crate::config::types::{CatalogConfig, Config, DiscoveryConfig, FetchConfig, OutputConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_catalog_config(&config.catalog)?;
    validate_discovery_config(&config.discovery)?;
    validate_fetch_config(&config.fetch)?;
    validate_output_config(&config.output)?;

    if config.harvest.max_results < 1 {
        return Err(ConfigError::Validation(
            "max_results must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates catalog configuration
fn validate_catalog_config(config: &CatalogConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url '{}' must use http or https",
            config.base_url
        )));
    }

    if config.results_per_page < 1 {
        return Err(ConfigError::Validation(format!(
            "results_per_page must be >= 1, got {}",
            config.results_per_page
        )));
    }

    if config.title_type.is_empty() {
        return Err(ConfigError::Validation(
            "title_type cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates discovery configuration
fn validate_discovery_config(config: &DiscoveryConfig) -> Result<(), ConfigError> {
    if config.render_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "render_timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.load_more_wait_secs > config.render_timeout_secs {
        return Err(ConfigError::Validation(format!(
            "load_more_wait_secs ({}) cannot exceed render_timeout_secs ({})",
            config.load_more_wait_secs, config.render_timeout_secs
        )));
    }

    Ok(())
}

/// Validates fetch configuration
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.concurrency < 1 || config.concurrency > 100 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and 100, got {}",
            config.concurrency
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "request_timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    if config.log_dir.is_empty() {
        return Err(ConfigError::Validation(
            "log_dir cannot be empty".to_string(),
        ));
    }

    Ok(())
}
