//! Infrastructure layer for HTTP access, parsing, configuration and export
//!
//! Everything that touches the network, the markup or the file system lives
//! here; the application layer only sees the `Transport` seam, the page
//! fetcher and the parsers.

pub mod config; // Configuration file and site constants
pub mod export; // CSV / EXCEL writers
pub mod http_client; // reqwest-backed transport
pub mod logging; // Logging infrastructure
pub mod page_fetcher; // Retry state machine over a transport
pub mod parsing; // Listing and counter parsing
pub mod parsing_error; // Parser error types
pub mod transport; // Single-GET seam

// Re-export commonly used items
pub use config::{AppConfig, ConfigManager, ScraperConfig};
pub use export::{ExportFormat, export, export_file_name};
pub use http_client::{HttpClient, HttpClientConfig};
pub use logging::{get_log_directory, init_logging_with_config, log_system_info};
pub use page_fetcher::{FetchError, FetchedPage, PageFetcher, RetryPolicy, build_search_url};
pub use parsing::{ListingExtractor, ParsingConfig, ParsingError, ParsingResult, ResultCounterReader};
pub use transport::{RawResponse, Transport, TransportError};
