//! Pagination controller
//!
//! Walks result pages, extracting every visible listing, until the item cap
//! or the page limit is reached or no enabled next-page control remains.
//! The cap is soft: a page is always taken whole.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::context::SessionContext;
use super::search_error::{SearchError, SearchResult};
use crate::domain::RawItemRecord;
use crate::infrastructure::config::SearchConfig;
use crate::infrastructure::parsing::ElementRole;
use crate::infrastructure::session::DocumentSession;

/// Collection budget for one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionLimits {
    pub max_items: usize,
    pub max_pages: usize,
}

impl Default for CollectionLimits {
    fn default() -> Self {
        Self::from(&SearchConfig::default())
    }
}

impl From<&SearchConfig> for CollectionLimits {
    fn from(config: &SearchConfig) -> Self {
        Self {
            max_items: config.max_items,
            max_pages: config.max_pages,
        }
    }
}

/// Why collection ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    CapReached,
    PageLimitReached,
    NoNextPage,
    /// A page after the first never showed any result item
    ResultsTimedOut,
}

/// Records gathered across pages and how the walk ended
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionOutcome {
    pub records: Vec<RawItemRecord>,
    pub pages_visited: usize,
    pub stop_reason: StopReason,
}

pub struct PaginationController {
    limits: CollectionLimits,
}

impl PaginationController {
    pub fn new(limits: CollectionLimits) -> Self {
        Self { limits }
    }

    /// Collect from the current results page onwards.
    ///
    /// Fails with `NoResultsFound` when the first page shows no result item
    /// within the locator timeout.
    pub async fn collect<S: DocumentSession>(
        &self,
        ctx: &mut SessionContext<'_, S>,
    ) -> SearchResult<CollectionOutcome> {
        let mut records = Vec::new();
        let mut page = 1;

        let stop_reason = loop {
            let items = ctx
                .locator()
                .find(ctx.session(), ElementRole::ResultItem, ctx.locator_timeout())
                .await?;

            let Some(items) = items else {
                if page == 1 {
                    return Err(SearchError::NoResultsFound);
                }
                warn!("No result items on page {}; keeping {} collected", page, records.len());
                break StopReason::ResultsTimedOut;
            };

            let markup = ctx.session().content().await?;
            let page_records =
                ctx.extractor()
                    .extract_page(&markup, items.selector(), ctx.page_url().as_ref());
            debug!("Page {}: {} item(s)", page, page_records.len());
            records.extend(page_records);

            if records.len() >= self.limits.max_items {
                break StopReason::CapReached;
            }
            if page >= self.limits.max_pages {
                break StopReason::PageLimitReached;
            }
            if !advance(ctx).await {
                break StopReason::NoNextPage;
            }
            page += 1;
        };

        info!(
            "Collected {} item(s) from {} page(s), stopped: {:?}",
            records.len(),
            page,
            stop_reason
        );

        Ok(CollectionOutcome {
            records,
            pages_visited: page,
            stop_reason,
        })
    }
}

/// Click through to the next page; any failure means there is none
async fn advance<S: DocumentSession>(ctx: &mut SessionContext<'_, S>) -> bool {
    let control = match ctx
        .locator()
        .find_clickable(ctx.session(), ElementRole::NextPageControl, ctx.locator_timeout())
        .await
    {
        Ok(Some(control)) => control,
        Ok(None) => return false,
        Err(e) => {
            debug!("Next page detection failed: {}", e);
            return false;
        }
    };

    if let Err(e) = ctx.session_mut().click(control.css()).await {
        debug!("Next page click failed: {}", e);
        return false;
    }

    ctx.settle().await;
    true
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::infrastructure::config::SiteProfile;
    use crate::infrastructure::parsing::{ItemExtractor, LocatorResolver};
    use crate::test_utils::{ItemFixture, ScriptedSession, numbered_items, paginated_session, results_page};

    struct Fixture {
        site: SiteProfile,
        locator: LocatorResolver,
        extractor: ItemExtractor,
    }

    impl Fixture {
        fn new() -> Self {
            Self::with_site(SiteProfile::default())
        }

        fn with_site(site: SiteProfile) -> Self {
            let locator = LocatorResolver::new(&site.selectors, Duration::from_millis(250)).unwrap();
            let extractor = ItemExtractor::new(&site.selectors.item).unwrap();
            Self {
                site,
                locator,
                extractor,
            }
        }

        fn context(&self, session: ScriptedSession) -> SessionContext<'_, ScriptedSession> {
            SessionContext::new(
                session,
                &self.site,
                &self.locator,
                &self.extractor,
                Duration::from_secs(10),
                Duration::ZERO,
            )
        }
    }

    async fn run(pages: &[Vec<ItemFixture>], limits: CollectionLimits) -> SearchResult<CollectionOutcome> {
        let fixture = Fixture::new();
        let mut ctx = fixture.context(paginated_session("https://shop.test", pages).build());
        let outcome = PaginationController::new(limits).collect(&mut ctx).await;
        ctx.close().await.unwrap();
        outcome
    }

    #[tokio::test]
    async fn test_twelve_per_page_stops_after_third_page() {
        let pages: Vec<_> = (1..=5).map(|p| numbered_items(p, 12)).collect();
        let outcome = run(&pages, CollectionLimits::default()).await.unwrap();

        assert_eq!(outcome.records.len(), 36);
        assert_eq!(outcome.pages_visited, 3);
        assert_eq!(outcome.stop_reason, StopReason::CapReached);
    }

    #[tokio::test]
    async fn test_page_limit_below_cap() {
        let pages: Vec<_> = (1..=5).map(|p| numbered_items(p, 4)).collect();
        let outcome = run(&pages, CollectionLimits::default()).await.unwrap();

        assert_eq!(outcome.records.len(), 12);
        assert_eq!(outcome.pages_visited, 3);
        assert_eq!(outcome.stop_reason, StopReason::PageLimitReached);
    }

    #[tokio::test]
    async fn test_cap_is_soft_and_stops_early() {
        let pages: Vec<_> = (1..=3).map(|p| numbered_items(p, 20)).collect();
        let outcome = run(&pages, CollectionLimits::default()).await.unwrap();

        assert_eq!(outcome.records.len(), 40);
        assert_eq!(outcome.pages_visited, 2);
        assert_eq!(outcome.stop_reason, StopReason::CapReached);
    }

    #[tokio::test]
    async fn test_missing_next_control_ends_collection() {
        let pages = vec![numbered_items(1, 5)];
        let outcome = run(&pages, CollectionLimits::default()).await.unwrap();

        assert_eq!(outcome.records.len(), 5);
        assert_eq!(outcome.pages_visited, 1);
        assert_eq!(outcome.stop_reason, StopReason::NoNextPage);
    }

    #[tokio::test]
    async fn test_empty_first_page_is_no_results() {
        let err = run(&[Vec::new()], CollectionLimits::default()).await.unwrap_err();
        assert_eq!(err, SearchError::NoResultsFound);
    }

    #[tokio::test]
    async fn test_empty_later_page_keeps_collected() {
        let pages = vec![numbered_items(1, 3), Vec::new()];
        let outcome = run(&pages, CollectionLimits::default()).await.unwrap();

        assert_eq!(outcome.records.len(), 3);
        assert_eq!(outcome.pages_visited, 2);
        assert_eq!(outcome.stop_reason, StopReason::ResultsTimedOut);
    }

    #[tokio::test]
    async fn test_broken_next_link_is_no_more_pages() {
        let fixture = Fixture::new();
        let session = ScriptedSession::builder()
            .page("https://shop.test/s", results_page(&numbered_items(1, 2), true))
            .start_at("https://shop.test/s")
            .build();
        let recorder = session.recorder();
        let mut ctx = fixture.context(session);

        let outcome = PaginationController::new(CollectionLimits::default())
            .collect(&mut ctx)
            .await
            .unwrap();
        ctx.close().await.unwrap();

        assert_eq!(outcome.stop_reason, StopReason::NoNextPage);
        assert_eq!(outcome.records.len(), 2);
        assert!(recorder.journal().closed);
    }

    #[tokio::test]
    async fn test_disabled_duplicate_next_control_does_not_stop_collection() {
        let mut site = SiteProfile::default();
        site.selectors.next_page = vec!["a[rel='next']".to_string()];
        let fixture = Fixture::with_site(site);

        let listing: String = numbered_items(1, 3).iter().map(ItemFixture::to_html).collect();
        let first = format!(
            r#"<html><body>{listing}<a rel="next" aria-disabled="true">Previous</a><a rel="next" href="/s?page=2">Next</a></body></html>"#
        );
        let session = ScriptedSession::builder()
            .page("https://shop.test/s?page=1", first)
            .page("https://shop.test/s?page=2", results_page(&numbered_items(2, 3), false))
            .start_at("https://shop.test/s?page=1")
            .on_click("https://shop.test/s?page=1", "a[rel='next']", "https://shop.test/s?page=2")
            .build();
        let mut ctx = fixture.context(session);

        let outcome = PaginationController::new(CollectionLimits::default())
            .collect(&mut ctx)
            .await
            .unwrap();
        ctx.close().await.unwrap();

        assert_eq!(outcome.records.len(), 6);
        assert_eq!(outcome.pages_visited, 2);
        assert_eq!(outcome.stop_reason, StopReason::NoNextPage);
    }

    #[tokio::test]
    async fn test_relative_links_resolve_against_page() {
        let pages = vec![vec![ItemFixture::new("Dune").price("₹10.00").link("/dp/1")]];
        let outcome = run(&pages, CollectionLimits::default()).await.unwrap();
        assert_eq!(outcome.records[0].link.as_deref(), Some("https://shop.test/dp/1"));
    }
}
