//! Search session orchestrator
//!
//! Sequences one search on a site:
//! 1. open the site's start page
//! 2. pick the books category, if the dropdown is there
//! 3. submit the query (mandatory)
//! 4. apply the best-reviewed sort, if the dropdown is there
//! 5. collect result pages and normalize them
//!
//! Steps 2 and 4 are followed by the settle delay whether or not they
//! applied.
//!
//! The session is closed on every exit path.

use std::future::Future;
use std::time::Duration;

use tracing::{info, warn};

use super::context::SessionContext;
use super::normalizer::normalize;
use super::pagination::{CollectionLimits, PaginationController};
use super::report::SearchReport;
use super::search_error::{SearchError, SearchResult};
use crate::domain::SearchRequest;
use crate::infrastructure::config::{AppConfig, SearchConfig, SiteProfile};
use crate::infrastructure::parsing::{ElementRole, ItemExtractor, LocatorResolver};
use crate::infrastructure::session::{DocumentSession, OptionChoice, SessionError, SessionResult};

/// Run an optional step.
///
/// `Ok(true)` when it went through, `Ok(false)` when it failed in a way
/// `SessionError::is_optional_step_failure` accepts (logged and skipped).
/// Any other failure is returned.
pub async fn try_optional_step<F>(name: &str, action: F) -> SearchResult<bool>
where
    F: Future<Output = SessionResult<()>>,
{
    match action.await {
        Ok(()) => Ok(true),
        Err(e) if e.is_optional_step_failure() => {
            warn!("Skipping {}: {}", name, e);
            Ok(false)
        }
        Err(e) => Err(e.into()),
    }
}

/// Budget and timing for one search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchSettings {
    pub limits: CollectionLimits,
    pub top_n: usize,
    pub locator_timeout: Duration,
    pub poll_interval: Duration,
    pub settle_delay: Duration,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self::from(&SearchConfig::default())
    }
}

impl From<&SearchConfig> for SearchSettings {
    fn from(config: &SearchConfig) -> Self {
        Self {
            limits: CollectionLimits::from(config),
            top_n: config.top_n,
            locator_timeout: config.locator_timeout(),
            poll_interval: config.poll_interval(),
            settle_delay: config.settle_delay(),
        }
    }
}

/// Drives searches on one site
pub struct SearchOrchestrator {
    site: SiteProfile,
    settings: SearchSettings,
    locator: LocatorResolver,
    extractor: ItemExtractor,
}

impl SearchOrchestrator {
    /// Compile the site's selectors; fails when a role has no usable selector
    pub fn new(site: SiteProfile, settings: SearchSettings) -> SearchResult<Self> {
        let locator = LocatorResolver::new(&site.selectors, settings.poll_interval)?;
        let extractor = ItemExtractor::new(&site.selectors.item)?;

        Ok(Self {
            site,
            settings,
            locator,
            extractor,
        })
    }

    /// Orchestrator for the configured site named `site_name`
    pub fn from_config(config: &AppConfig, site_name: &str) -> SearchResult<Self> {
        let site = config
            .site(site_name)
            .cloned()
            .ok_or_else(|| SearchError::configuration(format!("No site profile named '{site_name}'")))?;
        Self::new(site, SearchSettings::from(&config.search))
    }

    pub fn site(&self) -> &SiteProfile {
        &self.site
    }

    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    /// Run `request` on `session`, which is closed before returning
    pub async fn search<S: DocumentSession>(
        &self,
        session: S,
        request: &SearchRequest,
    ) -> SearchResult<SearchReport> {
        let mut ctx = SessionContext::new(
            session,
            &self.site,
            &self.locator,
            &self.extractor,
            self.settings.locator_timeout,
            self.settings.settle_delay,
        );

        let outcome = self.run(&mut ctx, request).await;

        if let Err(e) = ctx.close().await {
            warn!("Failed to close session: {}", e);
        }

        match &outcome {
            Ok(report) => info!("{}", report.summary()),
            Err(e) if e.is_empty_result() => warn!("{}", e),
            Err(e) => warn!("Search for '{}' failed: {}", request.book_name(), e),
        }
        outcome
    }

    async fn run<S: DocumentSession>(
        &self,
        ctx: &mut SessionContext<'_, S>,
        request: &SearchRequest,
    ) -> SearchResult<SearchReport> {
        if request.target_site() != self.site.name {
            return Err(SearchError::configuration(format!(
                "Request targets '{}' but this orchestrator drives '{}'",
                request.target_site(),
                self.site.name
            )));
        }

        let query = request.effective_query();
        info!("Searching '{}' on {}", query, self.site.name);

        ctx.session_mut().navigate(&self.site.start_url).await?;

        try_optional_step("category selection", select_category(ctx)).await?;
        ctx.settle().await;

        submit_query(ctx, &query).await?;

        try_optional_step("sort", apply_sort(ctx)).await?;
        ctx.settle().await;

        let collection = PaginationController::new(self.settings.limits)
            .collect(ctx)
            .await?;

        let items_collected = collection.records.len();
        let (results, statistics) = normalize(collection.records, request.book_name());

        Ok(SearchReport {
            request: request.clone(),
            items_collected,
            pages_visited: collection.pages_visited,
            stop_reason: collection.stop_reason,
            results,
            statistics,
            currency_symbol: self.site.currency_symbol.clone(),
            top_n: self.settings.top_n,
        })
    }
}

async fn select_category<S: DocumentSession>(ctx: &mut SessionContext<'_, S>) -> SessionResult<()> {
    let choice = OptionChoice::VisibleText(ctx.site().category_option.clone());
    select_in(ctx, ElementRole::CategorySelector, &choice).await
}

async fn apply_sort<S: DocumentSession>(ctx: &mut SessionContext<'_, S>) -> SessionResult<()> {
    let choice = OptionChoice::Value(ctx.site().sort_option_value.clone());
    select_in(ctx, ElementRole::SortControl, &choice).await
}

async fn select_in<S: DocumentSession>(
    ctx: &mut SessionContext<'_, S>,
    role: ElementRole,
    choice: &OptionChoice,
) -> SessionResult<()> {
    let control = ctx
        .locator()
        .find(ctx.session(), role, ctx.locator_timeout())
        .await?
        .ok_or_else(|| SessionError::element_not_found(role.as_str()))?;

    ctx.session_mut().select_option(control.css(), choice).await
}

async fn submit_query<S: DocumentSession>(ctx: &mut SessionContext<'_, S>, query: &str) -> SearchResult<()> {
    let search_box = ctx
        .locator()
        .require(ctx.session(), ElementRole::SearchBox, ctx.locator_timeout())
        .await
        .map_err(SearchError::submission_failed)?;

    ctx.session_mut()
        .submit_text(search_box.css(), query)
        .await
        .map_err(SearchError::submission_failed)
}
