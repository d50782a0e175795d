//! ML Data Scraper - Mercado Livre listing scraper
//!
//! Collects product listings (price, installments, seller, shipping) from the
//! paginated search results of Mercado Livre and exports them as CSV or Excel.

// Module declarations
pub mod domain;
pub mod application;
pub mod infrastructure;

#[cfg(test)]
mod test_utils;

// Re-export the pieces the binary and integration tests reach for
pub use application::{ScrapeAbort, ScrapeReport, ScrapeService, ScrapeSession};
pub use domain::{ListingRecord, PageEstimate, ResultSet, SiteLayout};
