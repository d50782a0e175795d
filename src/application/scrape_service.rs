//! Multi-page scrape orchestration.
//!
//! A run is split in two so the operator can be asked for a page count once
//! the bound is known:
//!
//! 1. [`ScrapeService::start`] fetches page 1, reads the results counter and
//!    parses the first page's listings.
//! 2. [`ScrapeSession::collect`] clamps the requested page count against the
//!    estimate and fetches pages 2..=N strictly in sequence.
//!
//! [`ScrapeService::scrape`] does both in one call.

#![allow(clippy::uninlined_format_args)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use scraper::Html;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::domain::{PageEstimate, PageRequest, ResultPage, ResultSet, SiteLayout};
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::page_fetcher::{FetchError, PageFetcher};
use crate::infrastructure::parsing::{ListingExtractor, ParsingResult, ResultCounterReader};
use crate::infrastructure::transport::Transport;

/// A fatal fetch failure stopped the run.
///
/// Records gathered from the pages before `page` are kept in `partial`; what
/// to do with them is up to the caller.
#[derive(Error, Debug)]
#[error("Scrape aborted on page {page}: {source}")]
pub struct ScrapeAbort {
    pub page: u32,
    pub source: FetchError,
    pub partial: ResultSet,
}

/// Outcome of a completed run
#[derive(Debug, Clone)]
pub struct ScrapeReport {
    pub query: String,
    /// Advisory bound derived from the results counter
    pub estimate: PageEstimate,
    pub page_request: PageRequest,
    /// Authoritative records, in page then on-page order
    pub result_set: ResultSet,
    /// Time spent fetching and parsing, operator think time excluded
    pub elapsed: Duration,
}

impl ScrapeReport {
    pub const fn requested_pages(&self) -> u32 {
        self.page_request.requested
    }

    pub fn pages_visited(&self) -> usize {
        self.result_set.pages_visited()
    }

    pub fn len(&self) -> usize {
        self.result_set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.result_set.is_empty()
    }
}

/// Drives page fetching and parsing for one search subject at a time
pub struct ScrapeService {
    fetcher: PageFetcher,
    extractor: Arc<ListingExtractor>,
    counter: ResultCounterReader,
}

impl ScrapeService {
    pub fn new(
        fetcher: PageFetcher,
        extractor: Arc<ListingExtractor>,
        counter: ResultCounterReader,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            counter,
        }
    }

    /// Wire fetcher and parsers from the application configuration
    pub fn from_config(transport: Arc<dyn Transport>, config: &AppConfig) -> ParsingResult<Self> {
        let extractor = Arc::new(ListingExtractor::with_config(&config.parsing)?);
        let counter = ResultCounterReader::with_config(&config.parsing)?;
        let fetcher = PageFetcher::from_scraper_config(transport, Arc::clone(&extractor), &config.scraper);
        Ok(Self::new(fetcher, extractor, counter))
    }

    pub const fn layout(&self) -> SiteLayout {
        self.fetcher.layout()
    }

    /// Fetch page 1 and derive the page bound
    pub async fn start(&self, query: &str) -> Result<ScrapeSession<'_>, ScrapeAbort> {
        let started = Instant::now();
        info!("Starting scrape for {:?}", query);

        let page = self.fetcher.fetch(query, 0).await.map_err(|source| {
            error!("First page could not be fetched: {}", source);
            ScrapeAbort {
                page: 1,
                source,
                partial: ResultSet::new(),
            }
        })?;

        // Html is not Send; keep it out of any await
        let (estimate, listings) = {
            let html = Html::parse_document(&page.body);
            let estimate = self.counter.estimate_total_pages(&html, self.layout());
            (estimate, self.extractor.extract_listings(&html, 1))
        };

        info!(
            "Results counter: {:?}, estimated pages: {}",
            estimate.advertised_results, estimate.total_pages
        );

        Ok(ScrapeSession {
            service: self,
            query: query.to_string(),
            estimate,
            first_page: ResultPage::new(1, listings),
            first_page_elapsed: started.elapsed(),
        })
    }

    /// `start` followed by `collect`
    pub async fn scrape(&self, query: &str, requested_pages: u32) -> Result<ScrapeReport, ScrapeAbort> {
        self.start(query).await?.collect(requested_pages).await
    }
}

/// A run whose first page is in hand
pub struct ScrapeSession<'a> {
    service: &'a ScrapeService,
    query: String,
    estimate: PageEstimate,
    first_page: ResultPage,
    first_page_elapsed: Duration,
}

impl ScrapeSession<'_> {
    pub fn query(&self) -> &str {
        &self.query
    }

    pub const fn estimate(&self) -> &PageEstimate {
        &self.estimate
    }

    /// Listings already parsed from page 1
    pub fn first_page_len(&self) -> usize {
        self.first_page.listings.len()
    }

    /// Fetch the remaining pages up to the clamped request.
    ///
    /// A request above the estimate is not an error: the run stops at the
    /// bound and `page_request.exceeded_bound` is set.
    pub async fn collect(self, requested_pages: u32) -> Result<ScrapeReport, ScrapeAbort> {
        let started = Instant::now();
        let service = self.service;
        let layout = service.layout();

        let page_request = self.estimate.clamp_request(requested_pages);
        if page_request.exceeded_bound {
            warn!(
                "Requested {} pages but only {} are available; stopping at {}",
                page_request.requested, self.estimate.total_pages, page_request.effective
            );
        }

        let mut result_set = ResultSet::new();
        info!("Page 1/{}: {} listings", page_request.effective, self.first_page.listings.len());
        result_set.absorb(self.first_page);

        for page_index in 2..=page_request.effective {
            let offset = layout.offset_of(page_index);
            let page = match service.fetcher.fetch(&self.query, offset).await {
                Ok(page) => page,
                Err(source) => {
                    error!(
                        "Page {} failed, {} records collected so far: {}",
                        page_index,
                        result_set.len(),
                        source
                    );
                    return Err(ScrapeAbort {
                        page: page_index,
                        source,
                        partial: result_set,
                    });
                }
            };

            let listings = service.extractor.extract_from_str(&page.body, page_index);
            info!("Page {}/{}: {} listings", page_index, page_request.effective, listings.len());
            result_set.absorb(ResultPage::new(page_index, listings));
        }

        let elapsed = self.first_page_elapsed + started.elapsed();
        info!(
            "Scrape of {:?} finished: {} records from {} pages in {:.1?}",
            self.query,
            result_set.len(),
            result_set.pages_visited(),
            elapsed
        );

        Ok(ScrapeReport {
            query: self.query,
            estimate: self.estimate,
            page_request,
            result_set,
            elapsed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::page_fetcher::RetryPolicy;
    use crate::infrastructure::transport::RawResponse;
    use crate::test_utils::{loading_page, result_page, ScriptedTransport};

    const BASE: &str = "https://lista.mercadolivre.com.br";

    fn service(transport: Arc<ScriptedTransport>) -> ScrapeService {
        let extractor = Arc::new(ListingExtractor::new().unwrap());
        let fetcher = PageFetcher::new(
            transport,
            Arc::clone(&extractor),
            BASE,
            SiteLayout::Current,
            RetryPolicy::immediate(),
        );
        ScrapeService::new(fetcher, extractor, ResultCounterReader::new().unwrap())
    }

    #[tokio::test]
    async fn test_start_reports_estimate_before_collecting() {
        let transport = Arc::new(ScriptedTransport::new(vec![ScriptedTransport::ok(result_page(
            "120 resultados",
            "P1",
            2,
        ))]));
        let service = service(transport.clone());

        let session = service.start("fone de ouvido").await.unwrap();
        assert_eq!(session.estimate().total_pages, 3);
        assert_eq!(session.estimate().advertised_results, Some(120));
        assert_eq!(session.first_page_len(), 2);
        assert_eq!(session.query(), "fone de ouvido");
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_collect_visits_pages_in_order_with_offsets() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            ScriptedTransport::ok(result_page("120 resultados", "P1", 2)),
            ScriptedTransport::ok(result_page("120 resultados", "P2", 3)),
            ScriptedTransport::ok(result_page("120 resultados", "P3", 1)),
        ]));
        let service = service(transport.clone());

        let report = service.scrape("fone de ouvido", 3).await.unwrap();

        assert_eq!(report.len(), 6);
        assert_eq!(report.pages_visited(), 3);
        assert_eq!(report.result_set.page_counts(), &[(1, 2), (2, 3), (3, 1)]);
        assert!(!report.page_request.exceeded_bound);
        let names: Vec<&str> = report.result_set.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["P1 1", "P1 2", "P2 1", "P2 2", "P2 3", "P3 1"]);
        assert_eq!(
            transport.requests(),
            [
                "https://lista.mercadolivre.com.br/fone-de-ouvido_DisplayType_LF",
                "https://lista.mercadolivre.com.br/fone-de-ouvido_Desde_51_DisplayType_LF",
                "https://lista.mercadolivre.com.br/fone-de-ouvido_Desde_101_DisplayType_LF",
            ]
        );
    }

    #[tokio::test]
    async fn test_request_above_bound_is_clamped() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            ScriptedTransport::ok(result_page("60 resultados", "P1", 2)),
            ScriptedTransport::ok(result_page("60 resultados", "P2", 1)),
        ]));
        let report = service(transport.clone()).scrape("celular", 5).await.unwrap();

        assert_eq!(report.requested_pages(), 5);
        assert_eq!(report.page_request.effective, 2);
        assert!(report.page_request.exceeded_bound);
        assert_eq!(report.pages_visited(), 2);
        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_unreadable_counter_still_keeps_first_page() {
        let transport = Arc::new(ScriptedTransport::new(vec![ScriptedTransport::ok(result_page(
            "vários resultados",
            "P1",
            4,
        ))]));
        let report = service(transport).scrape("celular", 3).await.unwrap();

        assert_eq!(report.estimate.total_pages, 0);
        assert_eq!(report.page_request.effective, 1);
        assert_eq!(report.len(), 4);
    }

    #[tokio::test]
    async fn test_fatal_error_mid_run_keeps_partial_records() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            ScriptedTransport::ok(result_page("150 resultados", "P1", 2)),
            ScriptedTransport::timeout(),
            ScriptedTransport::ok(loading_page()),
            ScriptedTransport::ok(result_page("150 resultados", "P2", 2)),
            Ok(RawResponse::new(503, "unavailable")),
        ]));
        let abort = service(transport).scrape("celular", 3).await.unwrap_err();

        assert_eq!(abort.page, 3);
        assert!(matches!(abort.source, FetchError::HttpStatus { status: 503, .. }));
        assert_eq!(abort.partial.len(), 4);
        assert_eq!(abort.partial.pages_visited(), 2);
    }

    #[tokio::test]
    async fn test_first_page_failure_aborts_with_empty_partial() {
        let transport = Arc::new(ScriptedTransport::new(vec![ScriptedTransport::refused()]));
        let abort = service(transport).start("celular").await.err().unwrap();

        assert_eq!(abort.page, 1);
        assert!(abort.partial.is_empty());
        assert!(abort.to_string().contains("page 1"));
    }
}
