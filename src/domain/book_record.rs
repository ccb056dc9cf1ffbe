use serde::{Deserialize, Serialize};

/// Fields scraped from one result item; every field may be missing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawItemRecord {
    pub title: Option<String>,
    pub author: Option<String>,
    #[serde(rename = "priceText")]
    pub price_text: Option<String>,
    pub link: Option<String>,
}

/// A record whose price parsed; tagged with the book name that was searched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanedRecord {
    #[serde(rename = "searchedBook")]
    pub searched_book: String,
    pub title: Option<String>,
    pub author: Option<String>,
    pub link: Option<String>,
    #[serde(rename = "numericPrice")]
    pub numeric_price: f64,
}

impl CleanedRecord {
    /// Title for display, with a placeholder when the listing had none
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("(untitled)")
    }
}
