//! Result page fetching with fixed-delay retry.
//!
//! Each attempt moves through an explicit state machine:
//!
//! ```text
//! Pending -> Success
//!         -> RetryableFailure -> Pending (next attempt) | FatalFailure (attempts exhausted)
//!         -> FatalFailure
//! ```
//!
//! A timeout and a well-formed page without listing containers are retryable.
//! Connection failures and non-2xx responses are fatal.

#![allow(clippy::uninlined_format_args)]

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::domain::SiteLayout;
use crate::infrastructure::config::{mercado_livre, ScraperConfig};
use crate::infrastructure::parsing::ListingExtractor;
use crate::infrastructure::transport::{RawResponse, Transport, TransportError};

/// Pause and attempt limit applied to every page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Waited before every attempt, the first one included
    pub delay: Duration,
    /// `None` retries until the page loads
    pub max_attempts: Option<u32>,
}

impl RetryPolicy {
    pub const fn new(delay: Duration, max_attempts: Option<u32>) -> Self {
        Self {
            delay,
            max_attempts,
        }
    }

    pub const fn from_scraper_config(config: &ScraperConfig) -> Self {
        Self::new(config.request_delay(), config.max_attempts)
    }

    /// No pause, unlimited attempts
    pub const fn immediate() -> Self {
        Self::new(Duration::ZERO, None)
    }

    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Whether another attempt may follow attempt number `attempt`
    pub fn allows_another(&self, attempt: u32) -> bool {
        self.max_attempts.map_or(true, |max| attempt < max)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_scraper_config(&ScraperConfig::default())
    }
}

/// Why an attempt is worth repeating
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryReason {
    Timeout(String),
    /// 2xx response whose listings had not rendered
    ListingsNotLoaded,
}

impl fmt::Display for RetryReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout(message) => write!(f, "timeout ({})", message),
            Self::ListingsNotLoaded => write!(f, "page loaded without listings"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Network failure fetching {url}: {message}")]
    Network { url: String, message: String },

    #[error("HTTP status {status} for {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Gave up on {url} after {attempts} attempts, last failure: {last_reason}")]
    RetriesExhausted {
        url: String,
        attempts: u32,
        last_reason: RetryReason,
    },
}

impl FetchError {
    pub fn url(&self) -> &str {
        match self {
            Self::Network { url, .. } | Self::HttpStatus { url, .. } | Self::RetriesExhausted { url, .. } => url,
        }
    }
}

/// Body of a result page that passed the listings probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    pub url: String,
    pub body: String,
    pub attempts: u32,
}

#[derive(Debug)]
enum AttemptState {
    Pending { attempt: u32 },
    Success(FetchedPage),
    RetryableFailure { attempt: u32, reason: RetryReason },
    FatalFailure(FetchError),
}

pub struct PageFetcher {
    transport: Arc<dyn Transport>,
    extractor: Arc<ListingExtractor>,
    search_base_url: String,
    layout: SiteLayout,
    policy: RetryPolicy,
}

impl PageFetcher {
    pub fn new(
        transport: Arc<dyn Transport>,
        extractor: Arc<ListingExtractor>,
        search_base_url: impl Into<String>,
        layout: SiteLayout,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            transport,
            extractor,
            search_base_url: search_base_url.into(),
            layout,
            policy,
        }
    }

    pub fn from_scraper_config(
        transport: Arc<dyn Transport>,
        extractor: Arc<ListingExtractor>,
        config: &ScraperConfig,
    ) -> Self {
        Self::new(
            transport,
            extractor,
            config.search_base_url.clone(),
            config.layout,
            RetryPolicy::from_scraper_config(config),
        )
    }

    pub const fn layout(&self) -> SiteLayout {
        self.layout
    }

    pub const fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn search_url(&self, query: &str, offset: u32) -> String {
        build_search_url(&self.search_base_url, query, offset, self.layout)
    }

    /// Fetch the result page starting at listing `offset`.
    ///
    /// Returns only once a page with listing containers arrived, a fatal
    /// failure occurred or the attempt limit ran out.
    pub async fn fetch(&self, query: &str, offset: u32) -> Result<FetchedPage, FetchError> {
        let url = self.search_url(query, offset);
        info!("Fetching result page: {}", url);

        let mut state = AttemptState::Pending { attempt: 1 };
        loop {
            state = match state {
                AttemptState::Pending { attempt } => {
                    if !self.policy.delay.is_zero() {
                        debug!("Waiting {:?} before attempt {}", self.policy.delay, attempt);
                        sleep(self.policy.delay).await;
                    }
                    let outcome = self.transport.get(&url).await;
                    self.classify(&url, attempt, outcome)
                }
                AttemptState::RetryableFailure { attempt, reason } => {
                    if self.policy.allows_another(attempt) {
                        warn!("Attempt {} failed for {}: {}. Trying again...", attempt, url, reason);
                        AttemptState::Pending {
                            attempt: attempt + 1,
                        }
                    } else {
                        AttemptState::FatalFailure(FetchError::RetriesExhausted {
                            url: url.clone(),
                            attempts: attempt,
                            last_reason: reason,
                        })
                    }
                }
                AttemptState::Success(page) => {
                    debug!("Fetched {} on attempt {}", page.url, page.attempts);
                    return Ok(page);
                }
                AttemptState::FatalFailure(e) => {
                    error!("Giving up on {}: {}", url, e);
                    return Err(e);
                }
            };
        }
    }

    fn classify(
        &self,
        url: &str,
        attempt: u32,
        outcome: Result<RawResponse, TransportError>,
    ) -> AttemptState {
        match outcome {
            Ok(response) if response.is_success() => {
                if self.extractor.has_listings(&response.body) {
                    AttemptState::Success(FetchedPage {
                        url: url.to_string(),
                        body: response.body,
                        attempts: attempt,
                    })
                } else {
                    AttemptState::RetryableFailure {
                        attempt,
                        reason: RetryReason::ListingsNotLoaded,
                    }
                }
            }
            Ok(response) => AttemptState::FatalFailure(FetchError::HttpStatus {
                status: response.status,
                url: url.to_string(),
            }),
            Err(TransportError::Timeout { message, .. }) => AttemptState::RetryableFailure {
                attempt,
                reason: RetryReason::Timeout(message),
            },
            Err(TransportError::Connect { message, .. } | TransportError::Other { message, .. }) => {
                AttemptState::FatalFailure(FetchError::Network {
                    url: url.to_string(),
                    message,
                })
            }
        }
    }
}

/// `<base>/<words joined by "-">[_Desde_<offset + 1>]<display suffix>`
///
/// The display suffix is never doubled when the query already ends with it.
pub fn build_search_url(base: &str, query: &str, offset: u32, layout: SiteLayout) -> String {
    let suffix = layout.display_suffix();
    let slug = query
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(mercado_livre::QUERY_WORD_SEPARATOR);
    let slug = slug.strip_suffix(suffix).unwrap_or(&slug);

    let mut url = format!("{}/{}", base.trim_end_matches('/'), slug);
    if offset > 0 {
        url.push_str(mercado_livre::OFFSET_SEGMENT);
        url.push_str(&(offset + 1).to_string());
    }
    url.push_str(suffix);
    url
}
