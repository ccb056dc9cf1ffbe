//! Result item field extraction
//!
//! Every field of a listing is extracted on its own: a missing heading,
//! byline, price or anchor leaves only that field empty. Nothing in here can
//! fail a whole item, let alone a page.

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, trace};
use url::Url;

use super::config::ItemSelectors;
use super::{CompiledSelector, ParsingResult, compile_selectors, text_content};
use crate::domain::RawItemRecord;

/// The extractable fields of a result item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemField {
    Title,
    Author,
    Price,
    Link,
}

/// Extracts `RawItemRecord`s from result item nodes
#[derive(Debug, Clone)]
pub struct ItemExtractor {
    title: Vec<CompiledSelector>,
    author_block: Vec<CompiledSelector>,
    author_tokens: CompiledSelector,
    author_marker: String,
    price: Vec<CompiledSelector>,
    link: Vec<CompiledSelector>,
}

impl ItemExtractor {
    pub fn new(selectors: &ItemSelectors) -> ParsingResult<Self> {
        Ok(Self {
            title: compile_selectors("title", &selectors.title)?,
            author_block: compile_selectors("author block", &selectors.author_block)?,
            author_tokens: CompiledSelector::parse(&selectors.author_tokens)?,
            author_marker: selectors.author_marker.clone(),
            price: compile_selectors("price", &selectors.price)?,
            link: compile_selectors("link", &selectors.link)?,
        })
    }

    /// Extract all four fields of one item
    pub fn extract(&self, item: ElementRef<'_>, base_url: Option<&Url>) -> RawItemRecord {
        RawItemRecord {
            title: self.extract_field(item, ItemField::Title, base_url),
            author: self.extract_field(item, ItemField::Author, base_url),
            price_text: self.extract_field(item, ItemField::Price, base_url),
            link: self.extract_field(item, ItemField::Link, base_url),
        }
    }

    /// Extract a single field; `None` when the item does not carry it
    pub fn extract_field(
        &self,
        item: ElementRef<'_>,
        field: ItemField,
        base_url: Option<&Url>,
    ) -> Option<String> {
        let value = match field {
            ItemField::Title => first_match(item, &self.title).and_then(|e| text_content(&e)),
            ItemField::Author => self.extract_author(item),
            ItemField::Price => first_match(item, &self.price).and_then(|e| text_content(&e)),
            ItemField::Link => first_match(item, &self.link)
                .and_then(|e| e.value().attr("href"))
                .map(|href| resolve_link(href, base_url)),
        };

        if value.is_none() {
            trace!("Field {:?} absent on item", field);
        }
        value
    }

    /// Extract every item matched by `items` in a page's markup
    pub fn extract_page(&self, markup: &str, items: &Selector, base_url: Option<&Url>) -> Vec<RawItemRecord> {
        let document = Html::parse_document(markup);
        let records: Vec<RawItemRecord> = document
            .select(items)
            .map(|item| self.extract(item, base_url))
            .collect();

        debug!("Extracted {} item(s) from page", records.len());
        records
    }

    fn extract_author(&self, item: ElementRef<'_>) -> Option<String> {
        let block = self.author_block.iter().find_map(|candidate| {
            item.select(candidate.selector())
                .find(|block| block.text().collect::<String>().contains(&self.author_marker))
        })?;

        let names: Vec<String> = block
            .select(self.author_tokens.selector())
            .filter_map(|token| text_content(&token))
            .filter(|token| !token.eq_ignore_ascii_case(&self.author_marker))
            .collect();

        (!names.is_empty()).then(|| names.join(", "))
    }
}

fn first_match<'a>(item: ElementRef<'a>, candidates: &[CompiledSelector]) -> Option<ElementRef<'a>> {
    candidates
        .iter()
        .find_map(|candidate| item.select(candidate.selector()).next())
}

/// Resolve relative hrefs against the page URL; keep the raw href otherwise
fn resolve_link(href: &str, base_url: Option<&Url>) -> String {
    match base_url.map(|base| base.join(href)) {
        Some(Ok(resolved)) => resolved.to_string(),
        _ => href.to_string(),
    }
}
