//! Raw HTTP transport seam.
//!
//! The page fetcher owns retry and backoff; a transport performs exactly one
//! GET and reports what happened.

use async_trait::async_trait;
use thiserror::Error;

/// Status and body of one HTTP response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The request or the body read timed out
    #[error("Request timed out: {url} - {message}")]
    Timeout { url: String, message: String },

    /// Connection refused, DNS failure, TLS failure
    #[error("Connection failed: {url} - {message}")]
    Connect { url: String, message: String },

    #[error("Request failed: {url} - {message}")]
    Other { url: String, message: String },
}

/// One-shot GET capability used by the page fetcher
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str) -> Result<RawResponse, TransportError>;
}
