//! Result normalizer
//!
//! Turns raw listings into a price-ranked `ResultSet`: prices are parsed,
//! unusable records dropped, the rest sorted ascending (ties keep their
//! collection order) and tagged with the searched book name.

use tracing::debug;

use crate::domain::{CleanedRecord, RawItemRecord, ResultSet, Statistics, parse_price};

pub fn normalize(records: Vec<RawItemRecord>, searched_book: &str) -> (ResultSet, Statistics) {
    let collected = records.len();

    let mut cleaned: Vec<CleanedRecord> = records
        .into_iter()
        .filter_map(|raw| {
            let numeric_price = raw.price_text.as_deref().and_then(parse_price)?;
            Some(CleanedRecord {
                searched_book: searched_book.to_string(),
                title: raw.title,
                author: raw.author,
                link: raw.link,
                numeric_price,
            })
        })
        .collect();

    // `sort_by` is stable
    cleaned.sort_by(|a, b| a.numeric_price.total_cmp(&b.numeric_price));

    debug!(
        "Normalized {} record(s), dropped {} without a usable price",
        cleaned.len(),
        collected - cleaned.len()
    );

    let statistics = Statistics::compute(cleaned.iter().map(|r| r.numeric_price));
    (ResultSet::from_sorted(cleaned), statistics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn raw(title: &str, price: Option<&str>) -> RawItemRecord {
        RawItemRecord {
            title: Some(title.to_string()),
            author: None,
            price_text: price.map(str::to_string),
            link: Some(format!("https://shop.test/{title}")),
        }
    }

    #[test]
    fn test_drops_unparseable_and_sorts() {
        let records = vec![
            raw("a", Some("₹300.00")),
            raw("b", Some("₹100.00")),
            raw("c", None),
            raw("d", Some("")),
            raw("e", Some("₹1,200.00")),
        ];
        let (results, stats) = normalize(records, "Dune");

        let titles: Vec<_> = results.records().iter().map(CleanedRecord::display_title).collect();
        assert_eq!(titles, vec!["b", "a", "e"]);
        assert!(results.records().iter().all(|r| r.searched_book == "Dune"));
        assert_eq!(stats.lowest_price, Some(100.0));
        assert_eq!(stats.formatted_average("₹"), "₹533.33");
    }

    #[test]
    fn test_zero_priced_records_kept_but_not_counted() {
        let records = vec![raw("free", Some("₹0.00")), raw("paid", Some("₹50.00"))];
        let (results, stats) = normalize(records, "Dune");

        assert_eq!(results.len(), 2);
        assert_eq!(results.records()[0].numeric_price, 0.0);
        assert_eq!(stats.lowest_price, Some(50.0));
        assert_eq!(stats.average_price, Some(50.0));
    }

    #[test]
    fn test_nothing_survives() {
        let (results, stats) = normalize(vec![raw("x", None)], "Dune");
        assert!(results.is_empty());
        assert!(!stats.is_available());
    }

    proptest! {
        #[test]
        fn prop_sorted_and_stable(prices in prop::collection::vec(0u32..20, 0..40)) {
            let records: Vec<_> = prices
                .iter()
                .enumerate()
                .map(|(i, p)| raw(&i.to_string(), Some(&format!("₹{p}.00"))))
                .collect();

            let (results, _) = normalize(records, "Dune");
            prop_assert_eq!(results.len(), prices.len());

            for pair in results.records().windows(2) {
                prop_assert!(pair[0].numeric_price <= pair[1].numeric_price);
                if pair[0].numeric_price == pair[1].numeric_price {
                    let first: usize = pair[0].display_title().parse().unwrap();
                    let second: usize = pair[1].display_title().parse().unwrap();
                    prop_assert!(first < second);
                }
            }
        }
    }
}
