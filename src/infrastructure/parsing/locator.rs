//! Locator resolver
//!
//! Maps semantic roles (search box, result item, next-page control, ...) to
//! elements of the session's current document. A lookup waits up to a
//! timeout for the element to show up and reports absence as `None`; only
//! `require` turns absence into an error.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use scraper::{Html, Selector};
use tokio::time::{Instant, sleep};
use tracing::{debug, trace};

use super::config::SiteSelectors;
use super::{CompiledSelector, ParsingResult, compile_selectors, is_enabled};
use crate::infrastructure::session::{DocumentSession, SessionError, SessionResult};

/// Semantic element roles on a search surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementRole {
    CategorySelector,
    SearchBox,
    SortControl,
    ResultItem,
    NextPageControl,
}

impl ElementRole {
    pub const ALL: [Self; 5] = [
        Self::CategorySelector,
        Self::SearchBox,
        Self::SortControl,
        Self::ResultItem,
        Self::NextPageControl,
    ];

    /// Optional roles may be missing without failing the surrounding step
    pub fn is_optional(self) -> bool {
        matches!(
            self,
            Self::CategorySelector | Self::SortControl | Self::NextPageControl
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::CategorySelector => "category-selector",
            Self::SearchBox => "search-box",
            Self::SortControl => "sort-control",
            Self::ResultItem => "result-item",
            Self::NextPageControl => "next-page-control",
        }
    }

    fn candidates(self, selectors: &SiteSelectors) -> &[String] {
        match self {
            Self::CategorySelector => &selectors.category_selector,
            Self::SearchBox => &selectors.search_box,
            Self::SortControl => &selectors.sort_control,
            Self::ResultItem => &selectors.result_item,
            Self::NextPageControl => &selectors.next_page,
        }
    }
}

impl fmt::Display for ElementRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved role: the selector that matched and how many elements it hit.
///
/// For clickable lookups only enabled elements are counted; sessions click
/// the first enabled match of `css()`.
#[derive(Debug, Clone)]
pub struct ElementHandle {
    selector: CompiledSelector,
    matches: usize,
}

impl ElementHandle {
    /// Selector text, as passed to session interactions
    pub fn css(&self) -> &str {
        self.selector.as_str()
    }

    pub fn selector(&self) -> &Selector {
        self.selector.selector()
    }

    pub fn matches(&self) -> usize {
        self.matches
    }
}

/// Resolves roles against the current document of a session
#[derive(Debug, Clone)]
pub struct LocatorResolver {
    candidates: HashMap<ElementRole, Vec<CompiledSelector>>,
    poll_interval: Duration,
}

impl LocatorResolver {
    pub fn new(selectors: &SiteSelectors, poll_interval: Duration) -> ParsingResult<Self> {
        let mut candidates = HashMap::new();
        for role in ElementRole::ALL {
            candidates.insert(role, compile_selectors(role.as_str(), role.candidates(selectors))?);
        }

        Ok(Self {
            candidates,
            poll_interval,
        })
    }

    /// Wait up to `timeout` for `role` to be present
    pub async fn find<S>(
        &self,
        session: &S,
        role: ElementRole,
        timeout: Duration,
    ) -> SessionResult<Option<ElementHandle>>
    where
        S: DocumentSession + ?Sized,
    {
        self.wait_for(session, role, timeout, false).await
    }

    /// Like `find`, but elements marked disabled do not count
    pub async fn find_clickable<S>(
        &self,
        session: &S,
        role: ElementRole,
        timeout: Duration,
    ) -> SessionResult<Option<ElementHandle>>
    where
        S: DocumentSession + ?Sized,
    {
        self.wait_for(session, role, timeout, true).await
    }

    /// Like `find`, but absence is an `ElementNotFound` error
    pub async fn require<S>(
        &self,
        session: &S,
        role: ElementRole,
        timeout: Duration,
    ) -> SessionResult<ElementHandle>
    where
        S: DocumentSession + ?Sized,
    {
        self.find(session, role, timeout)
            .await?
            .ok_or_else(|| SessionError::element_not_found(self.describe(role)))
    }

    /// Resolve against an already parsed document, without waiting
    pub fn locate(&self, document: &Html, role: ElementRole, clickable: bool) -> Option<ElementHandle> {
        let candidates = self.candidates.get(&role)?;

        candidates.iter().find_map(|candidate| {
            let matches = document
                .select(candidate.selector())
                .filter(|element| !clickable || is_enabled(element))
                .count();

            (matches > 0).then(|| ElementHandle {
                selector: candidate.clone(),
                matches,
            })
        })
    }

    async fn wait_for<S>(
        &self,
        session: &S,
        role: ElementRole,
        timeout: Duration,
        clickable: bool,
    ) -> SessionResult<Option<ElementHandle>>
    where
        S: DocumentSession + ?Sized,
    {
        let deadline = Instant::now() + timeout;

        loop {
            let markup = session.content().await?;
            if let Some(handle) = self.locate_in_markup(&markup, role, clickable) {
                trace!("Resolved {} via '{}' ({} match(es))", role, handle.css(), handle.matches);
                return Ok(Some(handle));
            }

            let now = Instant::now();
            if !session.renders_asynchronously() || now >= deadline {
                debug!("{} not present within {:?}", role, timeout);
                return Ok(None);
            }

            sleep(self.poll_interval.min(deadline - now)).await;
        }
    }

    fn locate_in_markup(&self, markup: &str, role: ElementRole, clickable: bool) -> Option<ElementHandle> {
        let document = Html::parse_document(markup);
        self.locate(&document, role, clickable)
    }

    fn describe(&self, role: ElementRole) -> String {
        let sources = self
            .candidates
            .get(&role)
            .map(|c| c.iter().map(CompiledSelector::as_str).collect::<Vec<_>>().join(" | "))
            .unwrap_or_default();
        format!("{role} ({sources})")
    }
}
