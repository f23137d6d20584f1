//! Reel-Harvest: a bounded movie catalog harvester
//!
//! This crate discovers item pages on a dynamically paginated catalog listing,
//! fetches them concurrently, extracts movie metadata and stores it in SQLite
//! with duplicate suppression on the movie name.

pub mod config;
pub mod harvest;
pub mod logging;
pub mod search;
pub mod storage;

use thiserror::Error;

/// Main error type for Reel-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch of {url} failed: {message}")]
    Fetch { url: String, message: String },

    #[error("Unexpected HTTP status {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Render error: {0}")]
    Render(#[from] harvest::RenderError),

    #[error("Discovery of {url} timed out after {timeout_secs}s")]
    DiscoveryTimeout { url: String, timeout_secs: u64 },

    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    #[error("Unknown category '{category}'")]
    UnknownCategory { category: String },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Logging setup failed: {0}")]
    Logging(String),

    #[error("Pipeline task failed: {0}")]
    Task(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Reel-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use harvest::{HarvestOutcome, HarvestStats, Harvester, Record};
pub use search::SearchFilter;
