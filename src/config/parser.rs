use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration from TOML text
///
/// Missing sections and keys fall back to their defaults.
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let config_content = r#"
[catalog]
base-url = "https://catalog.example.com"
results-per-page = 25

[discovery]
render-timeout-secs = 60
headless = false

[fetch]
delay-ms = 250
concurrency = 4

[harvest]
max-results = 100

[output]
database-path = "./movies.db"
log-dir = "./harvest-logs"
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.catalog.base_url, "https://catalog.example.com");
        assert_eq!(config.catalog.results_per_page, 25);
        assert_eq!(config.catalog.title_type, "feature");
        assert_eq!(config.discovery.render_timeout_secs, 60);
        assert!(!config.discovery.headless);
        assert_eq!(config.fetch.delay_ms, 250);
        assert_eq!(config.fetch.concurrency, 4);
        assert_eq!(config.harvest.max_results, 100);
        assert_eq!(config.output.database_path, "./movies.db");
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse_config("").unwrap();

        assert_eq!(config.catalog.base_url, "https://www.imdb.com");
        assert_eq!(config.catalog.results_per_page, 50);
        assert_eq!(config.fetch.delay_ms, 1000);
        assert_eq!(config.fetch.concurrency, 10);
        assert_eq!(config.harvest.max_results, 50);
        assert_eq!(config.output.log_dir, "./logs");
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/harvest.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let config_content = r#"
[fetch]
concurrency = 0
"#;

        let file = create_temp_config(config_content);
        let result = load_config(file.path());
        assert!(matches!(result.unwrap_err(), ConfigError::Validation(_)));
    }
}
