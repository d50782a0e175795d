//! Pagination rules of the search-result listing.
//!
//! The site reports a "N resultados" counter on the first page. That number
//! is only an estimate and is kept apart from the authoritative record count
//! (`ResultSet::len`); it is used for nothing but bounding how far we page.

use serde::{Deserialize, Serialize};

/// The site never serves more result pages than this, whatever the counter says
pub const MAX_PAGES: u32 = 40;

/// Markup/layout generation of the result pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SiteLayout {
    /// Grid layout, 48 listings per page
    Legacy,
    /// List layout, 50 listings per page
    #[default]
    Current,
}

impl SiteLayout {
    pub const fn page_size(self) -> u32 {
        match self {
            Self::Legacy => 48,
            Self::Current => 50,
        }
    }

    /// Display-mode suffix appended to every search URL
    pub const fn display_suffix(self) -> &'static str {
        match self {
            Self::Legacy => "_DisplayType_G",
            Self::Current => "_DisplayType_LF",
        }
    }

    /// Zero-based item offset of a 1-based page index
    pub const fn offset_of(self, page_index: u32) -> u32 {
        page_index.saturating_sub(1) * self.page_size()
    }
}

/// Advisory page bound derived from the site-reported results counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageEstimate {
    /// Counter as reported by the site; `None` when missing or unparseable
    pub advertised_results: Option<u64>,
    pub page_size: u32,
    /// `ceil(advertised_results / page_size)` clamped to [`MAX_PAGES`]
    pub total_pages: u32,
}

impl PageEstimate {
    pub fn from_advertised(advertised_results: Option<u64>, layout: SiteLayout) -> Self {
        let page_size = layout.page_size();
        let total_pages = advertised_results.map_or(0, |results| {
            let pages = results.div_ceil(u64::from(page_size));
            u32::try_from(pages.min(u64::from(MAX_PAGES))).unwrap_or(MAX_PAGES)
        });

        Self {
            advertised_results,
            page_size,
            total_pages,
        }
    }

    /// True when the counter capped the bound at [`MAX_PAGES`]
    pub fn is_capped(&self) -> bool {
        self.advertised_results
            .is_some_and(|r| r.div_ceil(u64::from(self.page_size)) > u64::from(MAX_PAGES))
    }

    /// Clamp an operator request into `[1, max(total_pages, 1)]`.
    ///
    /// Page 1 has already been fetched with listings on it when an estimate
    /// exists, so at least one page is always visited even if the counter
    /// read zero.
    pub fn clamp_request(&self, requested_pages: u32) -> PageRequest {
        let upper = self.total_pages.max(1);
        let effective = requested_pages.clamp(1, upper);
        PageRequest {
            requested: requested_pages,
            effective,
            exceeded_bound: requested_pages > upper,
        }
    }
}

/// Outcome of clamping a requested page count against the estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub requested: u32,
    pub effective: u32,
    /// The request was above the estimated bound; the caller may re-prompt
    pub exceeded_bound: bool,
}
