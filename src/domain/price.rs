//! Currency text parsing and formatting
//!
//! Listing prices arrive as display strings such as `₹1,234.50`. Parsing
//! strips currency symbols, thousands separators and whitespace and reads the
//! remainder as a decimal. Anything that does not parse to a finite,
//! non-negative number is reported as `None` and never panics.

use once_cell::sync::Lazy;
use regex::Regex;

static PRICE_NOISE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\p{Sc},\s]").expect("static price regex"));

/// Parse a displayed price into a number; `None` when unusable
pub fn parse_price(text: &str) -> Option<f64> {
    let cleaned = PRICE_NOISE.replace_all(text, "");
    if cleaned.is_empty() {
        return None;
    }

    cleaned
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite() && *value >= 0.0)
}

/// Format with currency symbol, thousands separators and two decimals
pub fn format_price(value: f64, symbol: &str) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{sign}{symbol}{grouped}.{frac_part}")
}
