//! Per-request session context
//!
//! Bundles the exclusively owned document session with the site profile,
//! the resolvers built for that site and the request's timing. It is passed
//! explicitly into every orchestration and pagination call.

use std::time::Duration;

use tracing::{debug, warn};
use url::Url;

use crate::infrastructure::config::SiteProfile;
use crate::infrastructure::parsing::{ItemExtractor, LocatorResolver};
use crate::infrastructure::session::{DocumentSession, SessionResult};

pub struct SessionContext<'a, S> {
    session: S,
    site: &'a SiteProfile,
    locator: &'a LocatorResolver,
    extractor: &'a ItemExtractor,
    locator_timeout: Duration,
    settle_delay: Duration,
    closed: bool,
}

impl<'a, S: DocumentSession> SessionContext<'a, S> {
    pub fn new(
        session: S,
        site: &'a SiteProfile,
        locator: &'a LocatorResolver,
        extractor: &'a ItemExtractor,
        locator_timeout: Duration,
        settle_delay: Duration,
    ) -> Self {
        Self {
            session,
            site,
            locator,
            extractor,
            locator_timeout,
            settle_delay,
            closed: false,
        }
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut S {
        &mut self.session
    }

    pub fn site(&self) -> &'a SiteProfile {
        self.site
    }

    pub fn locator(&self) -> &'a LocatorResolver {
        self.locator
    }

    pub fn extractor(&self) -> &'a ItemExtractor {
        self.extractor
    }

    pub fn locator_timeout(&self) -> Duration {
        self.locator_timeout
    }

    /// URL of the current document, for resolving relative links
    pub fn page_url(&self) -> Option<Url> {
        self.session.current_url().and_then(|u| Url::parse(&u).ok())
    }

    /// Give the document time to settle after an interaction
    pub async fn settle(&self) {
        if !self.settle_delay.is_zero() {
            debug!("Settling for {:?}", self.settle_delay);
            tokio::time::sleep(self.settle_delay).await;
        }
    }

    /// Release the session; safe to call more than once
    pub async fn close(&mut self) -> SessionResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.session.close().await
    }
}

impl<S> Drop for SessionContext<'_, S> {
    fn drop(&mut self) {
        if !self.closed {
            warn!("Session context dropped without closing its session");
        }
    }
}
