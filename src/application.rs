//! Application layer module
//!
//! Orchestrates a scrape run: first page, page bound, then the remaining
//! pages in sequence.

pub mod scrape_service;

pub use scrape_service::{ScrapeAbort, ScrapeReport, ScrapeService, ScrapeSession};
