//! Ranked result set and price statistics

use serde::{Deserialize, Serialize};

use super::book_record::CleanedRecord;
use super::price::format_price;

/// Cleaned records in ascending price order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    records: Vec<CleanedRecord>,
}

impl ResultSet {
    /// Wrap records that are already sorted ascending by price
    pub(crate) fn from_sorted(records: Vec<CleanedRecord>) -> Self {
        debug_assert!(
            records
                .windows(2)
                .all(|w| w[0].numeric_price <= w[1].numeric_price)
        );
        Self { records }
    }

    pub fn records(&self) -> &[CleanedRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The `n` cheapest records (fewer when the set is smaller)
    pub fn cheapest(&self, n: usize) -> &[CleanedRecord] {
        &self.records[..n.min(self.records.len())]
    }
}

/// Lowest and average price over strictly positive prices.
///
/// `None` means "unavailable": there was no record priced above zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    #[serde(rename = "lowestPrice")]
    pub lowest_price: Option<f64>,
    #[serde(rename = "averagePrice")]
    pub average_price: Option<f64>,
}

impl Statistics {
    /// Compute over any price sequence; zero-priced entries are ignored
    pub fn compute<I>(prices: I) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        let mut count = 0usize;
        let mut sum = 0.0;
        let mut lowest: Option<f64> = None;

        for price in prices.into_iter().filter(|p| *p > 0.0) {
            count += 1;
            sum += price;
            lowest = Some(lowest.map_or(price, |l| l.min(price)));
        }

        Self {
            lowest_price: lowest,
            average_price: (count > 0).then(|| sum / count as f64),
        }
    }

    pub fn is_available(&self) -> bool {
        self.lowest_price.is_some()
    }

    pub fn formatted_lowest(&self, symbol: &str) -> String {
        format_stat(self.lowest_price, symbol)
    }

    pub fn formatted_average(&self, symbol: &str) -> String {
        format_stat(self.average_price, symbol)
    }
}

fn format_stat(value: Option<f64>, symbol: &str) -> String {
    value.map_or_else(|| "unavailable".to_string(), |v| format_price(v, symbol))
}
