//! Configuration module for Cite-Ripple
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! A configuration file is optional: `Config::default()` matches the defaults
//! of the command-line tool, and command-line flags override file values.
//!
//! # Example
//!
//! ```no_run
//! use cite_ripple::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("cite-ripple.toml")).unwrap();
//! println!("Crawler will follow citations {} levels deep", config.crawler.depth);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, FetcherConfig, OutputConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::validate;
