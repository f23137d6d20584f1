//! Configuration module for Reel-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use reel_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Harvesting at most {} items", config.harvest.max_results);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    CatalogConfig, Config, DiscoveryConfig, FetchConfig, HarvestConfig, OutputConfig,
};

// Re-export parser and validation functions
pub use parser::{load_config, parse_config};
pub use validation::validate;
