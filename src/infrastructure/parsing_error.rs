//! Parsing error types
//!
//! Field-level gaps inside a listing are not errors (they resolve to a
//! fallback or a placeholder); these variants cover what can really go wrong
//! while building or running the extractors.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParsingError {
    #[error("Required field '{field}' not found in listing")]
    RequiredFieldMissing {
        field: String,
        attempted_strategies: Vec<String>,
    },

    #[error("Invalid CSS selector: {selector} - {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("No valid selector configured for '{field}'. Errors: {errors}")]
    NoValidSelector { field: String, errors: String },

    #[error("URL resolution failed: {url} - {reason}")]
    UrlResolutionFailed { url: String, reason: String },
}

impl ParsingError {
    /// Create a required field missing error with the strategies that were tried
    pub fn required_field_missing(field: &str, attempted_strategies: Vec<String>) -> Self {
        Self::RequiredFieldMissing {
            field: field.to_string(),
            attempted_strategies,
        }
    }

    /// Create an invalid selector error
    pub fn invalid_selector(selector: &str, reason: &str) -> Self {
        Self::InvalidSelector {
            selector: selector.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Whether the extractor can keep going with the rest of the page
    pub const fn is_recoverable(&self) -> bool {
        match self {
            Self::RequiredFieldMissing { .. } | Self::UrlResolutionFailed { .. } => true,
            Self::InvalidSelector { .. } | Self::NoValidSelector { .. } => false,
        }
    }
}

pub type ParsingResult<T> = Result<T, ParsingError>;
