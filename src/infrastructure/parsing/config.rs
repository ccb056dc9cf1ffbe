//! Selector configuration for search result pages
//!
//! Centralized CSS selectors per semantic role. Each role carries an ordered
//! list of candidates; the first candidate that matches wins, so a site that
//! changes its markup can be followed by appending a selector instead of
//! editing code.

use serde::{Deserialize, Serialize};

/// Selectors for the page-level controls and the result items
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteSelectors {
    /// Category dropdown next to the search box
    pub category_selector: Vec<String>,

    /// Search text input
    pub search_box: Vec<String>,

    /// Sort order dropdown on the results page
    pub sort_control: Vec<String>,

    /// One listing on the results page
    pub result_item: Vec<String>,

    /// Enabled "next page" control
    pub next_page: Vec<String>,

    /// Field selectors, relative to a result item
    pub item: ItemSelectors,
}

impl Default for SiteSelectors {
    fn default() -> Self {
        Self {
            category_selector: vec![
                "select#searchDropdownBox".to_string(),
                "select[name='url']".to_string(),
            ],
            search_box: vec![
                "input#twotabsearchtextbox".to_string(),
                "input[name='field-keywords']".to_string(),
            ],
            sort_control: vec![
                "select#s-result-sort-select".to_string(),
                "select[name='s']".to_string(),
            ],
            result_item: vec![
                "[data-component-type='s-search-result']".to_string(),
                "div.s-result-item[data-asin]".to_string(),
            ],
            next_page: vec![
                ".s-pagination-next:not(.s-pagination-disabled)".to_string(),
                "a[rel='next']".to_string(),
            ],
            item: ItemSelectors::default(),
        }
    }
}

/// Per-field selectors inside one result item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemSelectors {
    /// Heading text of the listing
    pub title: Vec<String>,

    /// Blocks that may hold the byline
    pub author_block: Vec<String>,

    /// Marker a byline block must contain, dropped from the author tokens
    pub author_marker: String,

    /// Text-bearing nodes inside the byline block
    pub author_tokens: String,

    /// Price display node; its full text content is read
    pub price: Vec<String>,

    /// Primary listing anchor
    pub link: Vec<String>,
}

impl Default for ItemSelectors {
    fn default() -> Self {
        Self {
            title: vec!["h2 span".to_string(), "h2".to_string()],
            author_block: vec!["div[class^='a-row']".to_string()],
            author_marker: "by".to_string(),
            author_tokens: "a, span".to_string(),
            price: vec![
                ".a-price .a-offscreen".to_string(),
                "span.a-color-price".to_string(),
            ],
            link: vec![
                "a.a-link-normal.s-no-outline".to_string(),
                "h2 a".to_string(),
            ],
        }
    }
}
