//! Listing extractor for search-result pages
//!
//! Turns one page document into [`ListingRecord`]s in on-page order. Each
//! field goes through a [`FieldChain`]; a listing that cannot yield a URL,
//! name or price is dropped without affecting the rest of the page.

#![allow(clippy::uninlined_format_args)]

use rust_decimal::Decimal;
use scraper::{ElementRef, Html};
use tracing::{debug, info};
use url::Url;

use super::config::ParsingConfig;
use super::price;
use super::strategy::{FieldChain, FieldStrategy, ListingView, MarkupDialect, SelectorSet};
use super::{ParsingError, ParsingResult};
use crate::domain::{Installments, ListingRecord, Shipping};

/// Parser for extracting listings from search-result pages
pub struct ListingExtractor {
    containers: SelectorSet,
    current_dialect_markers: SelectorSet,
    interest_free_marker: SelectorSet,
    url: FieldChain<String>,
    name: FieldChain<String>,
    price: FieldChain<Decimal>,
    installments: FieldChain<Installments>,
    seller: FieldChain<String>,
    shipping: FieldChain<Shipping>,
}

impl ListingExtractor {
    /// Create an extractor with the default Mercado Livre selectors
    pub fn new() -> ParsingResult<Self> {
        Self::with_config(&ParsingConfig::default())
    }

    /// Create an extractor with custom selector configuration
    pub fn with_config(config: &ParsingConfig) -> ParsingResult<Self> {
        let s = &config.listing_selectors;
        let base = Url::parse(&config.base_url).map_err(|e| ParsingError::UrlResolutionFailed {
            url: config.base_url.clone(),
            reason: format!("Invalid base URL: {}", e),
        })?;

        let heading = SelectorSet::compile("heading", &s.heading)?;
        let main_title = SelectorSet::compile("main_title", &s.main_title)?;
        let shipping_text = SelectorSet::compile("shipping_text", &s.shipping_text)?;
        let seller_token = config.seller_token.clone();

        let mut markers = s.main_title.clone();
        markers.extend(s.seller_brand.iter().cloned());

        Ok(Self {
            containers: SelectorSet::compile("listing_container", &s.listing_container)?,
            current_dialect_markers: SelectorSet::compile("dialect_markers", &markers)?,
            interest_free_marker: SelectorSet::compile(
                "installments_interest",
                &s.installments_interest,
            )?,
            url: FieldChain::new("url").then(LinkHref {
                links: SelectorSet::compile("link", &s.link)?,
                base,
            }),
            name: FieldChain::new("name")
                .then(TitleText { title: main_title })
                .then(HeadingBeforeSeller {
                    heading: heading.clone(),
                    seller_token: seller_token.clone(),
                }),
            price: FieldChain::new("price")
                .then(FractionAndDecimals {
                    fraction: SelectorSet::compile("price_fraction", &s.price_fraction)?,
                    decimals: SelectorSet::compile("price_decimals", &s.price_decimals)?,
                })
                .then(OptionsText {
                    options: SelectorSet::compile("price_options_text", &s.price_options_text)?,
                }),
            installments: FieldChain::new("installments").then(InstallmentSpans {
                multiplier: SelectorSet::compile(
                    "installments_multiplier",
                    &s.installments_multiplier,
                )?,
                amount: SelectorSet::compile("installments_price", &s.installments_price)?,
            }),
            seller: FieldChain::new("seller")
                .then(BrandSecondToken {
                    brand: SelectorSet::compile("seller_brand", &s.seller_brand)?,
                })
                .then(HeadingAfterSeller {
                    heading,
                    seller_token,
                }),
            shipping: FieldChain::new("shipping")
                .then(FreeFreightPhrase {
                    shipping: shipping_text.clone(),
                    phrase: config.free_freight_phrase.clone(),
                })
                .then(LegacyShippingCost {
                    shipping: shipping_text.clone(),
                })
                .then(ShippingMarker {
                    shipping: shipping_text,
                }),
        })
    }

    /// Listing containers on the page
    pub fn containers<'a>(&self, html: &'a Html) -> Vec<ElementRef<'a>> {
        self.containers.select_all(html)
    }

    /// Whether a raw document carries at least one listing container
    pub fn has_listings(&self, body: &str) -> bool {
        let html = Html::parse_document(body);
        !self.containers(&html).is_empty()
    }

    /// Extract every well-formed listing on the page, in document order
    pub fn extract_listings(&self, html: &Html, page_index: u32) -> Vec<ListingRecord> {
        let containers = self.containers(html);
        let mut listings = Vec::with_capacity(containers.len());

        for (index, element) in containers.into_iter().enumerate() {
            match self.extract_listing(element) {
                Ok(listing) => listings.push(listing),
                Err(e) => {
                    debug!(
                        "Dropping listing {} on page {}: {}",
                        index, page_index, e
                    );
                }
            }
        }

        info!(
            "Extracted {} listings from page {}",
            listings.len(),
            page_index
        );
        listings
    }

    /// Parse a raw document and extract its listings
    pub fn extract_from_str(&self, body: &str, page_index: u32) -> Vec<ListingRecord> {
        let html = Html::parse_document(body);
        self.extract_listings(&html, page_index)
    }

    fn detect_dialect(&self, element: &ElementRef<'_>) -> MarkupDialect {
        if self.current_dialect_markers.is_present(element) {
            MarkupDialect::Current
        } else {
            MarkupDialect::Legacy
        }
    }

    /// Extract one listing; URL, name and price are required
    fn extract_listing(&self, element: ElementRef<'_>) -> ParsingResult<ListingRecord> {
        let view = ListingView {
            element,
            dialect: self.detect_dialect(&element),
        };

        let url = self.url.require(&view)?;
        let name = self.name.require(&view)?;
        let price = self.price.require(&view)?;

        Ok(ListingRecord {
            url,
            name,
            price,
            installments: self.installments.resolve(&view),
            interest_free: self.interest_free_marker.is_present(&element),
            seller: self.seller.resolve(&view),
            shipping: self.shipping.resolve(&view).unwrap_or_default(),
        })
    }
}

/// Split a title on a standalone seller token: "Produto X por Loja" -> ("Produto X", "Loja")
fn split_on_seller_token(title: &str, token: &str) -> (String, Option<String>) {
    let words: Vec<&str> = title.split_whitespace().collect();
    match words.iter().position(|w| *w == token) {
        Some(pos) => {
            let seller = words[pos + 1..].join(" ");
            (words[..pos].join(" "), Some(seller).filter(|s| !s.is_empty()))
        }
        None => (words.join(" "), None),
    }
}

struct LinkHref {
    links: SelectorSet,
    base: Url,
}

impl FieldStrategy<String> for LinkHref {
    fn name(&self) -> &'static str {
        "link_href"
    }

    fn extract(&self, listing: &ListingView<'_>) -> Option<String> {
        let href = self.links.first(&listing.element)?.value().attr("href")?.trim();
        if href.is_empty() {
            return None;
        }
        match Url::parse(href) {
            Ok(absolute) => Some(absolute.to_string()),
            Err(_) => self.base.join(href).ok().map(|u| u.to_string()),
        }
    }
}

struct TitleText {
    title: SelectorSet,
}

impl FieldStrategy<String> for TitleText {
    fn name(&self) -> &'static str {
        "main_title"
    }

    fn extract(&self, listing: &ListingView<'_>) -> Option<String> {
        self.title.text(&listing.element)
    }
}

struct HeadingBeforeSeller {
    heading: SelectorSet,
    seller_token: String,
}

impl FieldStrategy<String> for HeadingBeforeSeller {
    fn name(&self) -> &'static str {
        "heading_before_seller"
    }

    fn extract(&self, listing: &ListingView<'_>) -> Option<String> {
        let text = self.heading.text(&listing.element)?;
        let (name, _) = split_on_seller_token(&text, &self.seller_token);
        Some(name).filter(|n| !n.is_empty())
    }
}

struct FractionAndDecimals {
    fraction: SelectorSet,
    decimals: SelectorSet,
}

impl FieldStrategy<Decimal> for FractionAndDecimals {
    fn name(&self) -> &'static str {
        "fraction_and_decimals"
    }

    fn extract(&self, listing: &ListingView<'_>) -> Option<Decimal> {
        let fraction = self.fraction.text(&listing.element)?;
        let decimals = self.decimals.text(&listing.element);
        price::combine(&fraction, decimals.as_deref())
    }
}

struct OptionsText {
    options: SelectorSet,
}

impl FieldStrategy<Decimal> for OptionsText {
    fn name(&self) -> &'static str {
        "options_text"
    }

    fn extract(&self, listing: &ListingView<'_>) -> Option<Decimal> {
        price::parse_combined(&self.options.text(&listing.element)?)
    }
}

struct InstallmentSpans {
    multiplier: SelectorSet,
    amount: SelectorSet,
}

impl FieldStrategy<Installments> for InstallmentSpans {
    fn name(&self) -> &'static str {
        "installment_spans"
    }

    fn extract(&self, listing: &ListingView<'_>) -> Option<Installments> {
        let multiplier = price::parse_multiplier(&self.multiplier.text(&listing.element)?)?;
        let Some(amount) = self
            .amount
            .text(&listing.element)
            .and_then(|text| price::parse_installment_amount(&text))
        else {
            debug!("Installment multiplier {}x without a readable amount", multiplier);
            return None;
        };
        Some(Installments {
            multiplier,
            price: amount,
        })
    }
}

struct BrandSecondToken {
    brand: SelectorSet,
}

impl FieldStrategy<String> for BrandSecondToken {
    fn name(&self) -> &'static str {
        "brand_second_token"
    }

    fn extract(&self, listing: &ListingView<'_>) -> Option<String> {
        let text = self.brand.text(&listing.element)?;
        text.split_whitespace().nth(1).map(str::to_string)
    }
}

/// Legacy listings name the seller in the heading, after the seller token
struct HeadingAfterSeller {
    heading: SelectorSet,
    seller_token: String,
}

impl FieldStrategy<String> for HeadingAfterSeller {
    fn name(&self) -> &'static str {
        "heading_after_seller"
    }

    fn extract(&self, listing: &ListingView<'_>) -> Option<String> {
        if listing.dialect != MarkupDialect::Legacy {
            return None;
        }
        let text = self.heading.text(&listing.element)?;
        split_on_seller_token(&text, &self.seller_token).1
    }
}

struct FreeFreightPhrase {
    shipping: SelectorSet,
    phrase: String,
}

impl FieldStrategy<Shipping> for FreeFreightPhrase {
    fn name(&self) -> &'static str {
        "free_freight_phrase"
    }

    fn extract(&self, listing: &ListingView<'_>) -> Option<Shipping> {
        let text = self.shipping.text(&listing.element)?;
        text.eq_ignore_ascii_case(&self.phrase).then_some(Shipping::Free)
    }
}

/// Legacy listings print the freight cost in the shipping element
struct LegacyShippingCost {
    shipping: SelectorSet,
}

impl FieldStrategy<Shipping> for LegacyShippingCost {
    fn name(&self) -> &'static str {
        "legacy_shipping_cost"
    }

    fn extract(&self, listing: &ListingView<'_>) -> Option<Shipping> {
        if listing.dialect != MarkupDialect::Legacy {
            return None;
        }
        self.shipping.text(&listing.element).map(Shipping::Cost)
    }
}

/// Current listings only render the shipping element for free freight
struct ShippingMarker {
    shipping: SelectorSet,
}

impl FieldStrategy<Shipping> for ShippingMarker {
    fn name(&self) -> &'static str {
        "shipping_marker"
    }

    fn extract(&self, listing: &ListingView<'_>) -> Option<Shipping> {
        if listing.dialect != MarkupDialect::Current {
            return None;
        }
        self.shipping.text(&listing.element).map(|_| Shipping::Free)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn page(items: &[&str]) -> String {
        format!(
            r#"<html><body><div class="quantity-results">10 resultados</div><ol id="searchResults">{}</ol></body></html>"#,
            items.join("\n")
        )
    }

    const CURRENT_ITEM: &str = r#"
        <li class="results-item">
          <a class="item__info-link" href="https://produto.mercadolivre.com.br/MLB-100-cafeteira">
            <h2 class="item__title"><span class="main-title"> Cafeteira Expresso </span></h2>
          </a>
          <span class="item__brand-title-tos">por Arno</span>
          <span class="price__fraction">1.234</span><span class="price__decimals">90</span>
          <span class="item-installments-multiplier">12x</span>
          <span class="item-installments-price">R$ <span>102</span> <sup>90</sup></span>
          <span class="item-installments-interest">sem juros</span>
          <span class="text-shipping">Frete grátis</span>
        </li>"#;

    const LEGACY_ITEM: &str = r#"
        <li class="results-item">
          <a href="/MLB-200-liquidificador">link</a>
          <h2 class="item__title">Liquidificador Turbo por Mondial</h2>
          <span class="price__fraction">99</span>
          <span class="text-shipping">R$ 15,90</span>
        </li>"#;

    fn extract(items: &[&str]) -> Vec<ListingRecord> {
        ListingExtractor::new().unwrap().extract_from_str(&page(items), 1)
    }

    #[test]
    fn test_parser_creation() {
        assert!(ListingExtractor::new().is_ok());
    }

    #[test]
    fn test_current_layout_listing() {
        let listings = extract(&[CURRENT_ITEM]);
        assert_eq!(listings.len(), 1);
        let l = &listings[0];
        assert_eq!(l.url, "https://produto.mercadolivre.com.br/MLB-100-cafeteira");
        assert_eq!(l.name, "Cafeteira Expresso");
        assert_eq!(l.price, dec("1234.90"));
        assert_eq!(
            l.installments,
            Some(Installments {
                multiplier: 12,
                price: dec("102.90"),
            })
        );
        assert!(l.interest_free);
        assert_eq!(l.seller.as_deref(), Some("Arno"));
        assert_eq!(l.shipping, Shipping::Free);
    }

    #[test]
    fn test_legacy_layout_listing() {
        let listings = extract(&[LEGACY_ITEM]);
        let l = &listings[0];
        assert_eq!(l.url, "https://www.mercadolivre.com.br/MLB-200-liquidificador");
        assert_eq!(l.name, "Liquidificador Turbo");
        assert_eq!(l.price, dec("99.00"));
        assert_eq!(l.price.to_string(), "99.00");
        assert!(l.installments.is_none());
        assert!(!l.interest_free);
        assert_eq!(l.seller.as_deref(), Some("Mondial"));
        assert_eq!(l.shipping, Shipping::Cost("R$ 15,90".to_string()));
        assert!(!l.free_shipping());
    }

    #[test]
    fn test_legacy_free_freight_phrase_discards_cost() {
        let item = LEGACY_ITEM.replace("R$ 15,90", "Frete grátis");
        let listings = extract(&[&item]);
        assert_eq!(listings[0].shipping, Shipping::Free);
        assert!(listings[0].free_shipping());
    }

    #[test]
    fn test_missing_shipping_element_is_not_free() {
        let item = LEGACY_ITEM.replace(r#"<span class="text-shipping">R$ 15,90</span>"#, "");
        let listings = extract(&[&item]);
        assert_eq!(listings[0].shipping, Shipping::NotDiscriminated);
        assert!(!listings[0].free_shipping());
    }

    #[test]
    fn test_current_layout_non_empty_shipping_text_means_free() {
        let item = CURRENT_ITEM.replace("Frete grátis", "Envio full");
        assert_eq!(extract(&[&item])[0].shipping, Shipping::Free);

        let item = CURRENT_ITEM.replace("Frete grátis", "  ");
        assert_eq!(extract(&[&item])[0].shipping, Shipping::NotDiscriminated);
    }

    #[test]
    fn test_price_falls_back_to_options_text() {
        let item = r#"
            <li class="results-item">
              <a href="https://produto.mercadolivre.com.br/MLB-300">x</a>
              <span class="main-title">Fone Bluetooth</span>
              <div class="pdp_options__text">R$ 99,00</div>
            </li>"#;
        let listings = extract(&[item]);
        assert_eq!(listings[0].price.to_string(), "99.00");
    }

    #[test]
    fn test_seller_not_discriminated() {
        let item = r#"
            <li class="results-item">
              <a href="https://produto.mercadolivre.com.br/MLB-400">x</a>
              <h2>Mouse sem fio</h2>
              <span class="price__fraction">45</span><span class="price__decimals">50</span>
            </li>"#;
        let listings = extract(&[item]);
        assert_eq!(listings[0].name, "Mouse sem fio");
        assert!(listings[0].seller.is_none());
        assert_eq!(listings[0].seller_or_sentinel(), crate::domain::NOT_DISCRIMINATED);
    }

    #[test]
    fn test_current_title_with_seller_token_keeps_seller_empty() {
        let item = r#"
            <li class="results-item">
              <a class="item__info-link" href="https://produto.mercadolivre.com.br/MLB-450">
                <span class="main-title">Capa Protetora por Encaixe Magnetico</span>
              </a>
              <span class="price__fraction">59</span><span class="price__decimals">90</span>
            </li>"#;
        let listings = extract(&[item]);
        assert_eq!(listings[0].name, "Capa Protetora por Encaixe Magnetico");
        assert!(listings[0].seller.is_none());
        assert_eq!(listings[0].seller_or_sentinel(), crate::domain::NOT_DISCRIMINATED);
    }

    #[test]
    fn test_seller_token_is_matched_as_a_word() {
        let item = r#"
            <li class="results-item">
              <a href="https://produto.mercadolivre.com.br/MLB-500">x</a>
              <h2>Porta retrato portatil</h2>
              <span class="price__fraction">30</span>
            </li>"#;
        let listings = extract(&[item]);
        assert_eq!(listings[0].name, "Porta retrato portatil");
        assert!(listings[0].seller.is_none());
    }

    #[test]
    fn test_installments_need_both_parts() {
        let item = CURRENT_ITEM.replace(
            r#"<span class="item-installments-price">R$ <span>102</span> <sup>90</sup></span>"#,
            "",
        );
        let listings = extract(&[&item]);
        assert!(listings[0].installments.is_none());
        assert!(listings[0].installment_multiplier().is_none());
        assert!(listings[0].installment_price().is_none());
    }

    #[test]
    fn test_integer_installment_amount() {
        let item = CURRENT_ITEM.replace("R$ <span>102</span> <sup>90</sup>", "R$ 100");
        let listings = extract(&[&item]);
        assert_eq!(listings[0].installment_price(), Some(dec("100.00")));
    }

    #[test]
    fn test_listing_without_price_or_url_is_dropped() {
        let no_price = r#"
            <li class="results-item">
              <a href="https://produto.mercadolivre.com.br/MLB-600">x</a>
              <span class="main-title">Sem preco</span>
            </li>"#;
        let no_url = r#"
            <li class="results-item">
              <span class="main-title">Sem link</span>
              <span class="price__fraction">10</span>
            </li>"#;
        let listings = extract(&[CURRENT_ITEM, no_price, no_url, LEGACY_ITEM]);
        let names: Vec<&str> = listings.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, ["Cafeteira Expresso", "Liquidificador Turbo"]);
    }

    #[test]
    fn test_n_fragments_yield_n_records_in_order() {
        let items: Vec<String> = (1..=7)
            .map(|i| {
                format!(
                    r#"<li class="results-item"><a href="https://produto.mercadolivre.com.br/MLB-{i}">x</a>
                       <span class="main-title">Item {i}</span><span class="price__fraction">{i}</span></li>"#
                )
            })
            .collect();
        let refs: Vec<&str> = items.iter().map(String::as_str).collect();

        let listings = extract(&refs);
        assert_eq!(listings.len(), 7);
        for (i, listing) in listings.iter().enumerate() {
            assert_eq!(listing.name, format!("Item {}", i + 1));
            assert_eq!(listing.price, Decimal::from(i as u64 + 1));
        }
    }

    #[test]
    fn test_has_listings() {
        let extractor = ListingExtractor::new().unwrap();
        assert!(extractor.has_listings(&page(&[LEGACY_ITEM])));
        assert!(!extractor.has_listings(&page(&[])));
    }

    #[test]
    fn test_split_on_seller_token() {
        assert_eq!(
            split_on_seller_token("Kit  Panelas por  Tramontina Store", "por"),
            ("Kit Panelas".to_string(), Some("Tramontina Store".to_string()))
        );
        assert_eq!(
            split_on_seller_token("Kit Panelas por", "por"),
            ("Kit Panelas".to_string(), None)
        );
    }
}
