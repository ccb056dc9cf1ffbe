//! HTML parsing infrastructure for search result pages
//!
//! Selector configuration, the locator resolver that maps semantic roles to
//! elements of the live document, and the per-item field extractor.

pub mod config;
pub mod error;
pub mod item_extractor;
pub mod locator;

pub use config::{ItemSelectors, SiteSelectors};
pub use error::{ParsingError, ParsingResult};
pub use item_extractor::{ItemExtractor, ItemField};
pub use locator::{ElementHandle, ElementRole, LocatorResolver};

use scraper::{ElementRef, Selector};
use tracing::{debug, warn};

/// A parsed selector together with its source text (for logs and session calls)
#[derive(Debug, Clone)]
pub struct CompiledSelector {
    source: String,
    selector: Selector,
}

impl CompiledSelector {
    pub fn parse(source: &str) -> ParsingResult<Self> {
        let selector =
            Selector::parse(source).map_err(|e| ParsingError::invalid_selector(source, e))?;
        Ok(Self {
            source: source.to_string(),
            selector,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn selector(&self) -> &Selector {
        &self.selector
    }
}

/// Compile fallback selectors, skipping invalid ones.
///
/// Fails only when none of the candidates compiles.
pub fn compile_selectors(role: &str, sources: &[String]) -> ParsingResult<Vec<CompiledSelector>> {
    let mut compiled = Vec::with_capacity(sources.len());
    let mut rejected = Vec::new();

    for source in sources {
        match CompiledSelector::parse(source) {
            Ok(selector) => compiled.push(selector),
            Err(e) => {
                warn!("Skipping selector for {}: {}", role, e);
                rejected.push(source.clone());
            }
        }
    }

    if compiled.is_empty() {
        return Err(ParsingError::no_usable_selector(role, rejected));
    }

    if !rejected.is_empty() {
        debug!("{} selector(s) rejected for {}: {}", rejected.len(), role, rejected.join(", "));
    }

    Ok(compiled)
}

/// Whether an element accepts clicks: neither `disabled` nor `aria-disabled="true"`
pub fn is_enabled(element: &ElementRef<'_>) -> bool {
    let value = element.value();
    value.attr("disabled").is_none() && value.attr("aria-disabled") != Some("true")
}

/// All descendant text of an element, trimmed; `None` when blank
pub fn text_content(element: &ElementRef<'_>) -> Option<String> {
    let text = element.text().collect::<String>();
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_selectors_are_skipped() {
        let sources = vec!["h2 span".to_string(), "[[broken".to_string()];
        let compiled = compile_selectors("title", &sources).unwrap();
        assert_eq!(compiled.len(), 1);
        assert_eq!(compiled[0].as_str(), "h2 span");
    }

    #[test]
    fn test_disabled_markers() {
        let document = scraper::Html::parse_fragment(
            r#"<a id="a" href="/1">1</a><a id="b" aria-disabled="true">2</a><button id="c" disabled>3</button><a id="d" aria-disabled="false">4</a>"#,
        );
        let enabled = |id: &str| {
            let selector = Selector::parse(&format!("#{id}")).unwrap();
            is_enabled(&document.select(&selector).next().unwrap())
        };
        assert!(enabled("a"));
        assert!(!enabled("b"));
        assert!(!enabled("c"));
        assert!(enabled("d"));
    }

    #[test]
    fn test_all_invalid_is_an_error() {
        let sources = vec!["[[broken".to_string()];
        let err = compile_selectors("search-box", &sources).unwrap_err();
        assert!(matches!(err, ParsingError::NoUsableSelector { ref role, .. } if role == "search-box"));
    }
}
