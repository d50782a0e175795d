use super::listing::ListingRecord;

/// Listings parsed from one fetched page, in on-page order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultPage {
    /// 1-based page index
    pub index: u32,
    pub listings: Vec<ListingRecord>,
}

impl ResultPage {
    pub const fn new(index: u32, listings: Vec<ListingRecord>) -> Self {
        Self { index, listings }
    }
}

/// All listings of a run, concatenated page by page.
///
/// Records are only ever appended; `len() == page_counts().sum()` holds at
/// every point.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultSet {
    records: Vec<ListingRecord>,
    page_counts: Vec<(u32, usize)>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume a page into the set
    pub fn absorb(&mut self, page: ResultPage) {
        self.page_counts.push((page.index, page.listings.len()));
        self.records.extend(page.listings);
    }

    pub fn records(&self) -> &[ListingRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// `(page index, records contributed)` in the order pages were absorbed
    pub fn page_counts(&self) -> &[(u32, usize)] {
        &self.page_counts
    }

    pub fn pages_visited(&self) -> usize {
        self.page_counts.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ListingRecord> {
        self.records.iter()
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a ListingRecord;
    type IntoIter = std::slice::Iter<'a, ListingRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::listing::Shipping;
    use rust_decimal::Decimal;

    fn listing(name: &str) -> ListingRecord {
        ListingRecord {
            url: format!("https://produto.mercadolivre.com.br/{name}"),
            name: name.to_string(),
            price: Decimal::new(1000, 2),
            installments: None,
            interest_free: false,
            seller: None,
            shipping: Shipping::NotDiscriminated,
        }
    }

    #[test]
    fn test_absorb_keeps_page_then_listing_order() {
        let mut set = ResultSet::new();
        set.absorb(ResultPage::new(1, vec![listing("a"), listing("b")]));
        set.absorb(ResultPage::new(2, vec![]));
        set.absorb(ResultPage::new(3, vec![listing("c")]));

        let names: Vec<&str> = set.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["a", "b", "c"]);
        assert_eq!(set.page_counts(), &[(1, 2), (2, 0), (3, 1)]);
        assert_eq!(set.len(), set.page_counts().iter().map(|(_, n)| n).sum::<usize>());
        assert_eq!(set.pages_visited(), 3);
    }
}
