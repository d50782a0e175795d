//! Reader for the "N resultados" counter on the first result page.

use scraper::Html;
use tracing::{debug, warn};

use super::config::ParsingConfig;
use super::strategy::SelectorSet;
use super::ParsingResult;
use crate::domain::{PageEstimate, SiteLayout};

pub struct ResultCounterReader {
    counter: SelectorSet,
}

impl ResultCounterReader {
    pub fn new() -> ParsingResult<Self> {
        Self::with_config(&ParsingConfig::default())
    }

    pub fn with_config(config: &ParsingConfig) -> ParsingResult<Self> {
        Ok(Self {
            counter: SelectorSet::compile(
                "results_counter",
                &config.listing_selectors.results_counter,
            )?,
        })
    }

    /// Site-reported result count, `None` when the counter is missing or unreadable
    pub fn advertised_results(&self, html: &Html) -> Option<u64> {
        let root = html.root_element();
        let Some(text) = self.counter.text(&root) else {
            warn!("Results counter not found on first page");
            return None;
        };

        let parsed = parse_counter(&text);
        if parsed.is_none() {
            warn!("Unreadable results counter: {:?}", text);
        }
        parsed
    }

    /// Page bound for the run; never fails, an unreadable counter gives 0 pages
    pub fn estimate_total_pages(&self, html: &Html, layout: SiteLayout) -> PageEstimate {
        let estimate = PageEstimate::from_advertised(self.advertised_results(html), layout);
        debug!(
            "Results counter {:?} -> {} pages of {}",
            estimate.advertised_results, estimate.total_pages, estimate.page_size
        );
        estimate
    }
}

/// First token of the counter text with `.` thousands separators removed
fn parse_counter(text: &str) -> Option<u64> {
    let first = text.split_whitespace().next()?;
    let digits: String = first.chars().filter(|c| *c != '.').collect();
    digits.parse().ok()
}
