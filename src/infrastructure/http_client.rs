//! HTTP client for fetching search-result pages
//!
//! Thin reqwest wrapper implementing [`Transport`]. Rate limiting and retries
//! live in the page fetcher, so this client performs a single request per call.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use tracing::debug;

use super::config::ScraperConfig;
use super::transport::{RawResponse, Transport, TransportError};

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub follow_redirects: bool,
}

impl HttpClientConfig {
    pub fn from_scraper_config(config: &ScraperConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            timeout_seconds: config.request_timeout_seconds,
            follow_redirects: true,
        }
    }
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self::from_scraper_config(&ScraperConfig::default())
    }
}

/// reqwest-backed transport
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
}

impl HttpClient {
    /// Create a new HTTP client with the given configuration
    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(&config.user_agent)
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .redirect(if config.follow_redirects {
                reqwest::redirect::Policy::limited(10)
            } else {
                reqwest::redirect::Policy::none()
            })
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, config })
    }

    pub fn from_scraper_config(config: &ScraperConfig) -> Result<Self> {
        Self::with_config(HttpClientConfig::from_scraper_config(config))
    }

    /// Get the configuration
    pub const fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    fn classify(url: &str, error: &reqwest::Error) -> TransportError {
        let message = error.to_string();
        let url = url.to_string();
        if error.is_timeout() {
            TransportError::Timeout { url, message }
        } else if error.is_connect() {
            TransportError::Connect { url, message }
        } else {
            TransportError::Other { url, message }
        }
    }
}

#[async_trait]
impl Transport for HttpClient {
    async fn get(&self, url: &str) -> Result<RawResponse, TransportError> {
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Self::classify(url, &e))?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| Self::classify(url, &e))?;

        debug!("Fetched {} ({}, {} chars)", url, status, body.len());
        Ok(RawResponse { status, body })
    }
}
