//! Cite-Ripple: a citation graph crawler
//!
//! This crate walks the "cited by" pages of a citation index site, extracts
//! bibliographic records from each listing, and assembles them into a directed
//! citation graph that is exported incrementally as the crawl proceeds.

pub mod config;
pub mod crawler;
pub mod graph;
pub mod output;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Cite-Ripple operations
#[derive(Debug, Error)]
pub enum CiteError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Page fetcher is not configured")]
    FetcherNotInitialized,

    #[error("Content region still missing after fetcher reset: {url}")]
    TransportBlock { url: String },

    #[error("Crawl cancelled while retrieving {url}")]
    Cancelled { url: String },

    #[error("Render endpoint refused {url} (status {status}): {message}")]
    Render {
        url: String,
        status: u16,
        message: String,
    },

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CiteError {
    /// Returns true if this error was caused by an external cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
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

/// Result type alias for Cite-Ripple operations
pub type Result<T> = std::result::Result<T, CiteError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CitationPair, CitationRecord, CrawlEngine, PageContext};
pub use graph::CitationGraph;
pub use state::{CrawlSession, RetrievalState};
pub use url::cluster_id_from_url;
