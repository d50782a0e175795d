//! Ordered fallback chains for listing fields.
//!
//! A [`FieldChain`] is a named list of [`FieldStrategy`] values. Resolving a
//! field walks the list and keeps the first value found, so the dialect
//! tolerance of the extractor is a table that can be read and tested one
//! strategy at a time.

#![allow(clippy::uninlined_format_args)]

use scraper::{ElementRef, Selector};
use tracing::{debug, trace, warn};

use super::{ParsingError, ParsingResult};

/// Markup generation a single listing was rendered with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkupDialect {
    /// Title in an `h2` with the seller after a "por" token
    Legacy,
    /// Dedicated title and seller elements
    Current,
}

/// One listing element plus its detected dialect
#[derive(Debug, Clone, Copy)]
pub struct ListingView<'a> {
    pub element: ElementRef<'a>,
    pub dialect: MarkupDialect,
}

/// Compiled fallback selectors for one markup element
#[derive(Debug, Clone)]
pub struct SelectorSet {
    selectors: Vec<Selector>,
}

impl SelectorSet {
    /// Compile selector strings, skipping invalid ones.
    ///
    /// Fails only when none of them compiles.
    pub fn compile(field: &str, selector_strings: &[String]) -> ParsingResult<Self> {
        let mut selectors = Vec::new();
        let mut errors = Vec::new();

        for selector_str in selector_strings {
            match Selector::parse(selector_str) {
                Ok(selector) => selectors.push(selector),
                Err(e) => {
                    let error = ParsingError::invalid_selector(selector_str, &e.to_string());
                    warn!("Failed to compile selector for {}: {}", field, error);
                    errors.push(error.to_string());
                }
            }
        }

        if selectors.is_empty() {
            return Err(ParsingError::NoValidSelector {
                field: field.to_string(),
                errors: errors.join(", "),
            });
        }

        if !errors.is_empty() {
            debug!("Some selectors for {} failed to compile: {}", field, errors.join(", "));
        }

        Ok(Self { selectors })
    }

    /// First descendant matched by any selector, trying selectors in order
    pub fn first<'a>(&self, element: &ElementRef<'a>) -> Option<ElementRef<'a>> {
        self.selectors
            .iter()
            .find_map(|selector| element.select(selector).next())
    }

    /// Normalised text of the first match; `None` if absent or blank
    pub fn text(&self, element: &ElementRef<'_>) -> Option<String> {
        self.first(element)
            .map(|e| element_text(&e))
            .filter(|text| !text.is_empty())
    }

    pub fn is_present(&self, element: &ElementRef<'_>) -> bool {
        self.first(element).is_some()
    }

    /// All matches in the document for the first selector that matches anything
    pub fn select_all<'a>(&self, html: &'a scraper::Html) -> Vec<ElementRef<'a>> {
        for selector in &self.selectors {
            let found: Vec<ElementRef<'a>> = html.select(selector).collect();
            if !found.is_empty() {
                return found;
            }
        }
        Vec::new()
    }
}

/// Text nodes joined by single spaces, whitespace collapsed.
///
/// Nested spans ("R$ <span>83</span><sup>33</sup>") keep their token
/// boundaries this way.
pub fn element_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(|chunk| chunk.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ")
}

/// One way of reading a field out of a listing
pub trait FieldStrategy<T>: Send + Sync {
    /// Short name used in logs and error reports
    fn name(&self) -> &'static str;

    fn extract(&self, listing: &ListingView<'_>) -> Option<T>;
}

/// Ordered strategies for one field; first hit wins
pub struct FieldChain<T> {
    field: &'static str,
    strategies: Vec<Box<dyn FieldStrategy<T>>>,
}

impl<T> FieldChain<T> {
    pub fn new(field: &'static str) -> Self {
        Self {
            field,
            strategies: Vec::new(),
        }
    }

    #[must_use]
    pub fn then(mut self, strategy: impl FieldStrategy<T> + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    pub const fn field(&self) -> &'static str {
        self.field
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Value of the first strategy that finds one
    pub fn resolve(&self, listing: &ListingView<'_>) -> Option<T> {
        for strategy in &self.strategies {
            if let Some(value) = strategy.extract(listing) {
                trace!("{} resolved by {}", self.field, strategy.name());
                return Some(value);
            }
        }
        None
    }

    /// Like [`resolve`](Self::resolve) but a miss is a `RequiredFieldMissing` error
    pub fn require(&self, listing: &ListingView<'_>) -> ParsingResult<T> {
        self.resolve(listing).ok_or_else(|| {
            ParsingError::required_field_missing(
                self.field,
                self.strategy_names().into_iter().map(String::from).collect(),
            )
        })
    }
}
