//! Parsing configuration for HTML extraction
//!
//! Centralized configuration for CSS selectors and markup phrases. Every
//! selector entry is a list of fallbacks tried in order.

use serde::{Deserialize, Serialize};

use crate::infrastructure::config::mercado_livre;

/// Main parsing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParsingConfig {
    /// Base URL for resolving relative listing links
    pub base_url: String,

    /// Shipping text meaning free freight
    pub free_freight_phrase: String,

    /// Word separating product name from seller in legacy titles
    pub seller_token: String,

    pub listing_selectors: ListingSelectors,
}

impl Default for ParsingConfig {
    fn default() -> Self {
        Self {
            base_url: mercado_livre::SITE_BASE.to_string(),
            free_freight_phrase: mercado_livre::FREE_FREIGHT_PHRASE.to_string(),
            seller_token: mercado_livre::SELLER_TOKEN.to_string(),
            listing_selectors: ListingSelectors::default(),
        }
    }
}

/// CSS selectors for search-result pages
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingSelectors {
    /// One element per listing
    pub listing_container: Vec<String>,

    /// Link to the product page
    pub link: Vec<String>,

    /// Title element of the current layout
    pub main_title: Vec<String>,

    /// Heading of the legacy layout ("Produto por Loja")
    pub heading: Vec<String>,

    pub price_fraction: Vec<String>,
    pub price_decimals: Vec<String>,

    /// Alternate combined price text ("R$ 99,00")
    pub price_options_text: Vec<String>,

    pub installments_multiplier: Vec<String>,
    pub installments_price: Vec<String>,

    /// Present only on interest-free installment offers
    pub installments_interest: Vec<String>,

    /// Seller line of the current layout ("por Loja")
    pub seller_brand: Vec<String>,

    pub shipping_text: Vec<String>,

    /// "N resultados" counter on the first page
    pub results_counter: Vec<String>,
}

fn owned(selectors: &[&str]) -> Vec<String> {
    selectors.iter().map(|s| (*s).to_string()).collect()
}

impl Default for ListingSelectors {
    fn default() -> Self {
        Self {
            listing_container: owned(&["li.results-item"]),
            link: owned(&["a.item__info-link", "a.item-link", "a[href]"]),
            main_title: owned(&["span.main-title"]),
            heading: owned(&["h2.item__title", "h2"]),
            price_fraction: owned(&["span.price__fraction"]),
            price_decimals: owned(&["span.price__decimals"]),
            price_options_text: owned(&["div.pdp_options__text"]),
            installments_multiplier: owned(&["span.item-installments-multiplier"]),
            installments_price: owned(&["span.item-installments-price"]),
            installments_interest: owned(&["span.item-installments-interest"]),
            seller_brand: owned(&["span.item__brand-title-tos"]),
            shipping_text: owned(&["span.text-shipping"]),
            results_counter: owned(&[
                "div.quantity-results",
                ".ui-search-search-result__quantity-results",
            ]),
        }
    }
}
