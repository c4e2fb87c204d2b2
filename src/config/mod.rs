//! Configuration module for Token-Sifter
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every setting has a default, so running without a configuration file crawls
//! the public Etherscan token index with a one-request-at-a-time policy.
//!
//! # Example
//!
//! ```no_run
//! use token_sifter::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("sifter.toml")).unwrap();
//! println!("Writing metadata to: {}", config.output.metadata_path);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, OutputConfig, SelectorConfig, TargetConfig, UserAgentConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
