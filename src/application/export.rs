//! CSV export of a search report

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use super::report::SearchReport;

pub const CSV_HEADER: [&str; 5] = ["Searched Book", "Title", "Author", "Price", "Link"];

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Nothing to export")]
    Empty,
}

/// `<book name, spaces as underscores>_book_prices.csv`, filesystem-safe
pub fn export_file_name(book_name: &str) -> String {
    let stem: String = book_name
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let stem = stem.trim_start_matches('.');
    let stem = if stem.is_empty() { "search" } else { stem };

    format!("{stem}_book_prices.csv")
}

/// Write the header and one row per record
pub fn write_csv<W: Write>(report: &SearchReport, writer: W) -> Result<(), ExportError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(CSV_HEADER)?;

    for row in report.rows() {
        csv_writer.write_record([&row.searched_book, &row.title, &row.author, &row.price, &row.link])?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Write the report into `dir`, returning the file path
pub fn export_csv(report: &SearchReport, dir: &Path) -> Result<PathBuf, ExportError> {
    if report.results.is_empty() {
        return Err(ExportError::Empty);
    }

    std::fs::create_dir_all(dir)?;
    let path = dir.join(export_file_name(report.request.book_name()));
    write_csv(report, File::create(&path)?)?;

    info!("Exported {} row(s) to {:?}", report.results.len(), path);
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::normalizer::normalize;
    use crate::application::pagination::StopReason;
    use crate::domain::{RawItemRecord, SearchRequest};
    use rstest::rstest;
    use tempfile::TempDir;

    fn report(book: &str, records: Vec<RawItemRecord>) -> SearchReport {
        let items_collected = records.len();
        let (results, statistics) = normalize(records, book);
        SearchReport {
            request: SearchRequest::new(book, None, "amazon.in", &["amazon.in"]).unwrap(),
            items_collected,
            pages_visited: 1,
            stop_reason: StopReason::NoNextPage,
            results,
            statistics,
            currency_symbol: "₹".to_string(),
            top_n: 3,
        }
    }

    #[rstest]
    #[case("Dune", "Dune_book_prices.csv")]
    #[case("The Hobbit", "The_Hobbit_book_prices.csv")]
    #[case("  Dune Messiah ", "Dune_Messiah_book_prices.csv")]
    #[case("AC/DC: Live?", "AC_DC__Live__book_prices.csv")]
    #[case("../etc", "_etc_book_prices.csv")]
    fn test_export_file_name(#[case] book: &str, #[case] expected: &str) {
        assert_eq!(export_file_name(book), expected);
    }

    #[test]
    fn test_csv_layout() {
        let report = report(
            "Dune",
            vec![RawItemRecord {
                title: Some("Dune, Deluxe".into()),
                author: Some("Frank Herbert".into()),
                price_text: Some("₹1,234.50".into()),
                link: Some("https://www.amazon.in/dp/1".into()),
            }],
        );

        let mut out = Vec::new();
        write_csv(&report, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(
            text,
            "Searched Book,Title,Author,Price,Link\nDune,\"Dune, Deluxe\",Frank Herbert,\"₹1,234.50\",https://www.amazon.in/dp/1\n"
        );
    }

    #[test]
    fn test_export_writes_file() {
        let dir = TempDir::new().unwrap();
        let report = report(
            "Dune Messiah",
            vec![RawItemRecord {
                price_text: Some("₹99.00".into()),
                ..RawItemRecord::default()
            }],
        );

        let path = export_csv(&report, dir.path()).unwrap();
        assert!(path.ends_with("Dune_Messiah_book_prices.csv"));
        assert_eq!(std::fs::read_to_string(path).unwrap().lines().count(), 2);
    }

    #[test]
    fn test_empty_report_is_not_exported() {
        let dir = TempDir::new().unwrap();
        let report = report("Dune", Vec::new());
        assert!(matches!(export_csv(&report, dir.path()), Err(ExportError::Empty)));
    }
}
