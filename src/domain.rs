//! Domain module - listing records, result pages and pagination rules
//!
//! Nothing in here touches the network or the markup; the types describe
//! what a scrape produces and the arithmetic that bounds it.

pub mod listing;
pub mod pagination;
pub mod result_set;

// Re-export commonly used items for convenience
pub use listing::{Installments, ListingRecord, Shipping, COLUMN_LABELS, NOT_DISCRIMINATED};
pub use pagination::{PageEstimate, PageRequest, SiteLayout, MAX_PAGES};
pub use result_set::{ResultPage, ResultSet};
