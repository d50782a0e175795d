//! HTML parsing for Mercado Livre search-result pages
//!
//! The same logical page has several historical markup dialects. Every
//! listing field is resolved through an ordered chain of extraction
//! strategies (see [`strategy`]) so one pass tolerates all of them.

pub mod config;
pub mod listing_extractor;
pub mod price;
pub mod result_counter;
pub mod strategy;

// Re-export public types
pub use crate::infrastructure::parsing_error::{ParsingError, ParsingResult};
pub use config::ParsingConfig;
pub use listing_extractor::ListingExtractor;
pub use result_counter::ResultCounterReader;
pub use strategy::{FieldChain, FieldStrategy, ListingView, MarkupDialect, SelectorSet};
