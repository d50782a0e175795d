use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Placeholder written to the table when a listing does not state a value
pub const NOT_DISCRIMINATED: &str = "Not discriminated";

/// One product entry scraped from a search-result page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingRecord {
    pub url: String,
    pub name: String,
    /// Price in BRL, always carried with two decimal places
    pub price: Decimal,
    /// Installment offer; multiplier and per-installment price only exist together
    pub installments: Option<Installments>,
    #[serde(rename = "interestFree")]
    pub interest_free: bool,
    pub seller: Option<String>,
    pub shipping: Shipping,
}

/// Installment offer of a listing ("12x R$ 83,33")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Installments {
    pub multiplier: u32,
    pub price: Decimal,
}

/// Shipping information as stated by the listing
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Shipping {
    Free,
    /// Shipping text reported by the legacy layout when shipping is not free
    Cost(String),
    #[default]
    NotDiscriminated,
}

impl Shipping {
    pub const fn is_free(&self) -> bool {
        matches!(self, Self::Free)
    }
}

impl ListingRecord {
    pub fn installment_multiplier(&self) -> Option<u32> {
        self.installments.map(|i| i.multiplier)
    }

    pub fn installment_price(&self) -> Option<Decimal> {
        self.installments.map(|i| i.price)
    }

    pub const fn free_shipping(&self) -> bool {
        self.shipping.is_free()
    }

    /// Seller name, or the "Not discriminated" placeholder
    pub fn seller_or_sentinel(&self) -> &str {
        self.seller.as_deref().unwrap_or(NOT_DISCRIMINATED)
    }

    /// Row in the fixed export column order
    pub fn to_row(&self) -> [String; 8] {
        [
            self.url.clone(),
            self.name.clone(),
            self.price.to_string(),
            self.installment_multiplier()
                .map_or_else(|| NOT_DISCRIMINATED.to_string(), |m| m.to_string()),
            self.installment_price()
                .map_or_else(|| NOT_DISCRIMINATED.to_string(), |p| p.to_string()),
            self.interest_free.to_string(),
            self.seller_or_sentinel().to_string(),
            self.free_shipping().to_string(),
        ]
    }
}

/// Column labels of the exported table, matching [`ListingRecord::to_row`]
pub const COLUMN_LABELS: [&str; 8] = [
    "URL",
    "Name",
    "Price (BRL)",
    "Installments Multiplier",
    "Installments",
    "Interest-free",
    "Seller",
    "Free shipping",
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn record() -> ListingRecord {
        ListingRecord {
            url: "https://produto.mercadolivre.com.br/MLB-1".to_string(),
            name: "Cafeteira".to_string(),
            price: Decimal::from_str("199.90").unwrap(),
            installments: None,
            interest_free: false,
            seller: None,
            shipping: Shipping::Cost("R$ 19,90".to_string()),
        }
    }

    #[test]
    fn test_row_uses_sentinels_for_missing_values() {
        let row = record().to_row();
        assert_eq!(row[2], "199.90");
        assert_eq!(row[3], NOT_DISCRIMINATED);
        assert_eq!(row[4], NOT_DISCRIMINATED);
        assert_eq!(row[6], NOT_DISCRIMINATED);
        assert_eq!(row[7], "false");
    }

    #[test]
    fn test_row_with_installments_and_seller() {
        let mut r = record();
        r.installments = Some(Installments {
            multiplier: 12,
            price: Decimal::from_str("16.66").unwrap(),
        });
        r.seller = Some("Arno".to_string());
        r.shipping = Shipping::Free;

        let row = r.to_row();
        assert_eq!(row[3], "12");
        assert_eq!(row[4], "16.66");
        assert_eq!(row[6], "Arno");
        assert_eq!(row[7], "true");
        assert_eq!(row.len(), COLUMN_LABELS.len());
    }
}
