//! Page fetcher implementation
//!
//! This module handles all HTTP traffic for the crawler, including:
//! - The `PageFetcher` seam the retriever drives
//! - Building HTTP clients with a cookie-backed session
//! - Fetching pages directly or through a headless rendering service
//! - Session resets when the site blocks the current session

use crate::config::FetcherConfig;
use crate::CiteError;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Source of rendered page markup
///
/// Implementations return the full markup of a page after any client-side
/// rendering; challenge and block detection happen on that markup.
#[async_trait]
pub trait PageFetcher: Send {
    /// Navigates to `url` and returns its rendered markup
    async fn fetch(&mut self, url: &str) -> Result<String, CiteError>;

    /// Re-reads the current rendering of `url` without starting a new visit
    ///
    /// Used while waiting for a challenge to be cleared. Stateless fetchers
    /// simply fetch again.
    async fn probe(&mut self, url: &str) -> Result<String, CiteError> {
        self.fetch(url).await
    }

    /// Discards the current session and creates a fresh one
    async fn reset(&mut self) -> Result<(), CiteError>;
}

/// Builds an HTTP client with proper configuration
///
/// The client keeps a cookie store, so one client corresponds to one browsing
/// session on the site.
pub fn build_http_client(config: &FetcherConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .cookie_store(true)
        .gzip(true)
        .brotli(true)
        .build()
}

/// reqwest-backed page fetcher
///
/// When a render endpoint is configured, pages are requested through its
/// `/content` endpoint so that client-side rendering runs before the markup
/// is returned. Otherwise the URL is fetched with a plain GET.
pub struct HttpFetcher {
    client: Client,
    config: FetcherConfig,
}

impl HttpFetcher {
    /// Creates a fetcher with a fresh session
    pub fn new(config: FetcherConfig) -> Result<Self, CiteError> {
        let client = build_http_client(&config)?;
        Ok(Self { client, config })
    }

    /// GETs the page directly
    async fn fetch_direct(&self, url: &str) -> Result<String, CiteError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| CiteError::Http {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            // Block pages arrive with 403/429; the body still carries the markers
            tracing::debug!("{} answered HTTP {}", url, status.as_u16());
        }

        response.text().await.map_err(|source| CiteError::Http {
            url: url.to_string(),
            source,
        })
    }

    /// Asks the rendering service for the page's rendered HTML
    async fn fetch_rendered(&self, endpoint: &str, url: &str) -> Result<String, CiteError> {
        let mut content_url = format!("{}/content", endpoint.trim_end_matches('/'));
        if let Some(token) = &self.config.render_token {
            content_url.push_str(&format!("?token={}", token));
        }

        let response = self
            .client
            .post(&content_url)
            .json(&serde_json::json!({ "url": url }))
            .send()
            .await
            .map_err(|source| CiteError::Http {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(CiteError::Render {
                url: url.to_string(),
                status: status.as_u16(),
                message,
            });
        }

        response.text().await.map_err(|source| CiteError::Http {
            url: url.to_string(),
            source,
        })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&mut self, url: &str) -> Result<String, CiteError> {
        match self.config.render_endpoint.clone() {
            Some(endpoint) => self.fetch_rendered(&endpoint, url).await,
            None => self.fetch_direct(url).await,
        }
    }

    async fn reset(&mut self) -> Result<(), CiteError> {
        tracing::debug!("Recreating HTTP session");
        self.client = build_http_client(&self.config)?;
        Ok(())
    }
}
