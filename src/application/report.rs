//! Search report: what a finished request hands to its caller

use serde::Serialize;

use super::pagination::StopReason;
use crate::domain::{CleanedRecord, ResultSet, SearchRequest, Statistics, format_price};

/// Why a successful search has nothing to show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EmptyReason {
    /// Items were collected but none had a usable price
    NoValidPrices,
}

/// One display/export row; the price already formatted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRow {
    pub searched_book: String,
    pub title: String,
    pub author: String,
    pub price: String,
    pub link: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchReport {
    pub request: SearchRequest,
    pub items_collected: usize,
    pub pages_visited: usize,
    pub stop_reason: StopReason,
    pub results: ResultSet,
    pub statistics: Statistics,
    pub currency_symbol: String,
    pub top_n: usize,
}

impl SearchReport {
    /// The `top_n` cheapest records, title and link included
    pub fn top_cheapest(&self) -> &[CleanedRecord] {
        self.results.cheapest(self.top_n)
    }

    pub fn empty_reason(&self) -> Option<EmptyReason> {
        self.results.is_empty().then_some(EmptyReason::NoValidPrices)
    }

    pub fn rows(&self) -> Vec<ReportRow> {
        self.results.records().iter().map(|r| self.row(r)).collect()
    }

    pub fn row(&self, record: &CleanedRecord) -> ReportRow {
        ReportRow {
            searched_book: record.searched_book.clone(),
            title: record.title.clone().unwrap_or_default(),
            author: record.author.clone().unwrap_or_default(),
            price: format_price(record.numeric_price, &self.currency_symbol),
            link: record.link.clone().unwrap_or_default(),
        }
    }

    pub fn lowest_price(&self) -> String {
        self.statistics.formatted_lowest(&self.currency_symbol)
    }

    pub fn average_price(&self) -> String {
        self.statistics.formatted_average(&self.currency_symbol)
    }

    /// One-line outcome for the user
    pub fn summary(&self) -> String {
        match self.empty_reason() {
            Some(EmptyReason::NoValidPrices) => "No valid prices found after cleaning".to_string(),
            None => format!(
                "Found {} valid entries for '{}'",
                self.results.len(),
                self.request.book_name()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::normalizer::normalize;
    use crate::domain::RawItemRecord;

    fn report(prices: &[Option<&str>]) -> SearchReport {
        let records = prices
            .iter()
            .enumerate()
            .map(|(i, p)| RawItemRecord {
                title: Some(format!("Book {i}")),
                author: None,
                price_text: p.map(str::to_string),
                link: None,
            })
            .collect::<Vec<_>>();
        let collected = records.len();
        let (results, statistics) = normalize(records, "Dune");

        SearchReport {
            request: SearchRequest::new("Dune", None, "amazon.in", &["amazon.in"]).unwrap(),
            items_collected: collected,
            pages_visited: 1,
            stop_reason: StopReason::NoNextPage,
            results,
            statistics,
            currency_symbol: "₹".to_string(),
            top_n: 3,
        }
    }

    #[test]
    fn test_top_cheapest_carries_titles() {
        let report = report(&[Some("₹40.00"), Some("₹10.00"), Some("₹30.00"), Some("₹20.00")]);
        let titles: Vec<_> = report.top_cheapest().iter().map(|r| r.display_title()).collect();
        assert_eq!(titles, vec!["Book 1", "Book 3", "Book 2"]);
    }

    #[test]
    fn test_top_cheapest_with_fewer_records() {
        let report = report(&[Some("₹40.00")]);
        assert_eq!(report.top_cheapest().len(), 1);
    }

    #[test]
    fn test_no_valid_prices() {
        let report = report(&[None, Some("n/a")]);
        assert_eq!(report.empty_reason(), Some(EmptyReason::NoValidPrices));
        assert_eq!(report.summary(), "No valid prices found after cleaning");
        assert_eq!(report.lowest_price(), "unavailable");
    }

    #[test]
    fn test_rows_format_price() {
        let report = report(&[Some("₹1,234.5")]);
        let rows = report.rows();
        assert_eq!(rows[0].price, "₹1,234.50");
        assert_eq!(rows[0].author, "");
        assert_eq!(report.summary(), "Found 1 valid entries for 'Dune'");
    }
}
