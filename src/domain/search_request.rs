//! Search request value object
//!
//! A `SearchRequest` is built once per user submission and never mutated.
//! Construction validates the book name and the target site against the
//! configured allow-list, so every request that reaches the orchestrator is
//! known to be issuable.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reasons a submission cannot become a `SearchRequest`
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestValidationError {
    #[error("Please enter a book name")]
    BlankBookName,

    #[error("Unsupported target site '{site}' (allowed: {})", allowed.join(", "))]
    UnknownSite { site: String, allowed: Vec<String> },
}

/// One book search, immutable after construction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    book_name: String,
    language: Option<String>,
    target_site: String,
}

impl SearchRequest {
    /// Validate and build a request.
    ///
    /// `allowed_sites` is the configured allow-list; `target_site` must match
    /// one of its entries exactly.
    pub fn new(
        book_name: impl Into<String>,
        language: Option<String>,
        target_site: impl Into<String>,
        allowed_sites: &[&str],
    ) -> Result<Self, RequestValidationError> {
        let book_name = book_name.into().trim().to_string();
        if book_name.is_empty() {
            return Err(RequestValidationError::BlankBookName);
        }

        let target_site = target_site.into();
        if !allowed_sites.iter().any(|s| *s == target_site) {
            return Err(RequestValidationError::UnknownSite {
                site: target_site,
                allowed: allowed_sites.iter().map(|s| s.to_string()).collect(),
            });
        }

        let language = language
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty());

        Ok(Self {
            book_name,
            language,
            target_site,
        })
    }

    pub fn book_name(&self) -> &str {
        &self.book_name
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    pub fn target_site(&self) -> &str {
        &self.target_site
    }

    /// Text typed into the search box: book name, then language if given
    pub fn effective_query(&self) -> String {
        match &self.language {
            Some(language) => format!("{} {}", self.book_name, language),
            None => self.book_name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SITES: &[&str] = &["amazon.in"];

    #[test]
    fn test_blank_book_name_rejected() {
        let err = SearchRequest::new("   ", None, "amazon.in", SITES).unwrap_err();
        assert_eq!(err, RequestValidationError::BlankBookName);
    }

    #[test]
    fn test_unknown_site_rejected() {
        let err = SearchRequest::new("Dune", None, "ebay.com", SITES).unwrap_err();
        assert!(matches!(err, RequestValidationError::UnknownSite { ref site, .. } if site == "ebay.com"));
        assert!(err.to_string().contains("amazon.in"));
    }

    #[test]
    fn test_effective_query_with_language() {
        let request =
            SearchRequest::new("Dune", Some(" Hindi ".to_string()), "amazon.in", SITES).unwrap();
        assert_eq!(request.effective_query(), "Dune Hindi");
        assert_eq!(request.language(), Some("Hindi"));
    }

    #[test]
    fn test_effective_query_ignores_blank_language() {
        let request = SearchRequest::new(" Dune ", Some(String::new()), "amazon.in", SITES).unwrap();
        assert_eq!(request.effective_query(), "Dune");
        assert_eq!(request.book_name(), "Dune");
        assert!(request.language().is_none());
    }
}
