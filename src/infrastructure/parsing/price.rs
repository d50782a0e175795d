//! BRL price text handling.
//!
//! Prices arrive as a "fraction" (integer part, `.` thousands separator) and
//! an optional "decimals" part, either from two elements or from one combined
//! string using `,` as the decimal separator.

use std::str::FromStr;

use rust_decimal::Decimal;

/// Minor-unit precision of every parsed amount
pub const PRICE_SCALE: u32 = 2;

/// Combine an integer part and an optional decimals part into a 2-place amount.
///
/// `combine("1.234", Some("90"))` is `1234.90`; missing decimals mean an
/// integer price.
pub fn combine(fraction: &str, decimals: Option<&str>) -> Option<Decimal> {
    let fraction: String = fraction.trim().chars().filter(|c| *c != '.').collect();
    if fraction.is_empty() || !fraction.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let decimals = decimals.map(str::trim).filter(|d| !d.is_empty()).unwrap_or("0");
    if !decimals.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let mut amount = Decimal::from_str(&format!("{fraction}.{decimals}")).ok()?;
    amount.rescale(PRICE_SCALE);
    Some(amount)
}

/// Parse a combined price string such as `"R$ 99,00"` or `"R$ 1.299"`.
///
/// The currency prefix is skipped; the amount is split on the decimal comma.
pub fn parse_combined(text: &str) -> Option<Decimal> {
    let amount = text
        .split_whitespace()
        .map(|token| token.trim_start_matches(|c: char| !c.is_ascii_digit()))
        .find(|token| !token.is_empty())?;

    match amount.split_once(',') {
        Some((fraction, decimals)) => combine(fraction, Some(decimals)),
        None => combine(amount, None),
    }
}

/// Parse the installment amount text, tokenised as `[currency, fraction]`
/// (integer amount) or `[currency, fraction, decimals]`.
///
/// A fraction token carrying its own decimal comma is accepted as well.
pub fn parse_installment_amount(text: &str) -> Option<Decimal> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    match tokens.as_slice() {
        [_currency, fraction] => parse_combined(fraction),
        [_currency, fraction, decimals, ..] => combine(fraction, Some(decimals)),
        _ => None,
    }
}

/// Leading integer of an installment multiplier ("12x" -> 12)
pub fn parse_multiplier(text: &str) -> Option<u32> {
    let digits: String = text
        .trim()
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok().filter(|m| *m > 0)
}
