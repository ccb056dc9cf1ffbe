//! Scripted in-memory document session
//!
//! Serves canned pages and follows a fixed set of interaction routes, so the
//! search pipeline can be driven end to end without a network. Every call is
//! written to a shared journal that outlives the session, which lets tests
//! check what was done after the session has been handed off and closed.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use scraper::{Html, Selector};
use tracing::debug;

use super::parsing::is_enabled;
use super::session::{DocumentSession, OptionChoice, SessionError, SessionResult};

const BLANK_DOCUMENT: &str = "<html><head></head><body></body></html>";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Interaction {
    Click,
    Submit,
    Select,
}

/// Everything a scripted session was asked to do
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionJournal {
    /// Total `content()` calls
    pub content_reads: usize,
    /// URLs loaded, in order, including route targets
    pub visited: Vec<String>,
    /// One line per interaction, e.g. `click .s-pagination-next`
    pub actions: Vec<String>,
    pub submitted_texts: Vec<String>,
    pub selections: Vec<OptionChoice>,
    pub closed: bool,
}

/// Shared view on a session's journal
#[derive(Debug, Clone, Default)]
pub struct SessionRecorder(Arc<Mutex<SessionJournal>>);

impl SessionRecorder {
    pub fn journal(&self) -> SessionJournal {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn record<R>(&self, f: impl FnOnce(&mut SessionJournal) -> R) -> R {
        f(&mut self.0.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

/// Builder for `ScriptedSession`
#[derive(Debug, Default)]
pub struct ScriptedSessionBuilder {
    pages: HashMap<String, String>,
    routes: HashMap<(Interaction, String, String), String>,
    start: Option<String>,
    render_after_polls: Option<usize>,
}

impl ScriptedSessionBuilder {
    /// Serve `html` at `url`
    pub fn page(mut self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.pages.insert(url.into(), html.into());
        self
    }

    /// Have `url` loaded before the first call
    pub fn start_at(mut self, url: impl Into<String>) -> Self {
        self.start = Some(url.into());
        self
    }

    /// Serve a blank document for the first `polls` reads after each navigation
    pub fn render_after_polls(mut self, polls: usize) -> Self {
        self.render_after_polls = Some(polls);
        self
    }

    /// Clicking `selector` on `from` loads `to`
    pub fn on_click(self, from: &str, selector: &str, to: &str) -> Self {
        self.route(Interaction::Click, from, selector, to)
    }

    /// Submitting text into `selector` on `from` loads `to`
    pub fn on_submit(self, from: &str, selector: &str, to: &str) -> Self {
        self.route(Interaction::Submit, from, selector, to)
    }

    /// Choosing an option in `selector` on `from` loads `to`
    pub fn on_select(self, from: &str, selector: &str, to: &str) -> Self {
        self.route(Interaction::Select, from, selector, to)
    }

    fn route(mut self, kind: Interaction, from: &str, selector: &str, to: &str) -> Self {
        self.routes
            .insert((kind, from.to_string(), selector.to_string()), to.to_string());
        self
    }

    pub fn build(self) -> ScriptedSession {
        ScriptedSession {
            pages: self.pages,
            routes: self.routes,
            render_after_polls: self.render_after_polls,
            current: self.start,
            reads_since_navigation: Arc::new(Mutex::new(0)),
            recorder: SessionRecorder::default(),
            closed: false,
        }
    }
}

/// In-memory `DocumentSession` over canned pages
#[derive(Debug)]
pub struct ScriptedSession {
    pages: HashMap<String, String>,
    routes: HashMap<(Interaction, String, String), String>,
    render_after_polls: Option<usize>,
    current: Option<String>,
    reads_since_navigation: Arc<Mutex<usize>>,
    recorder: SessionRecorder,
    closed: bool,
}

impl ScriptedSession {
    pub fn builder() -> ScriptedSessionBuilder {
        ScriptedSessionBuilder::default()
    }

    pub fn journal(&self) -> SessionJournal {
        self.recorder.journal()
    }

    /// A journal handle that stays valid after the session is moved
    pub fn recorder(&self) -> SessionRecorder {
        self.recorder.clone()
    }

    fn ensure_open(&self) -> SessionResult<()> {
        if self.closed {
            Err(SessionError::Closed)
        } else {
            Ok(())
        }
    }

    fn current_markup(&self) -> SessionResult<(&str, &str)> {
        self.ensure_open()?;
        let url = self.current.as_deref().ok_or(SessionError::NoDocument)?;
        let html = self.pages.get(url).ok_or(SessionError::NoDocument)?;
        Ok((url, html))
    }

    fn load(&mut self, url: &str) -> SessionResult<()> {
        if !self.pages.contains_key(url) {
            return Err(SessionError::Http {
                status: 404,
                url: url.to_string(),
            });
        }
        debug!("Scripted session loading {}", url);
        self.current = Some(url.to_string());
        *self
            .reads_since_navigation
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = 0;
        self.recorder.record(|j| j.visited.push(url.to_string()));
        Ok(())
    }

    fn follow(&self, kind: Interaction, from: &str, selector: &str) -> Option<String> {
        self.routes
            .get(&(kind, from.to_string(), selector.to_string()))
            .cloned()
    }
}

#[async_trait]
impl DocumentSession for ScriptedSession {
    async fn navigate(&mut self, url: &str) -> SessionResult<()> {
        self.ensure_open()?;
        self.recorder.record(|j| j.actions.push(format!("navigate {url}")));
        self.load(url)
    }

    async fn content(&self) -> SessionResult<String> {
        let (_, html) = self.current_markup()?;
        self.recorder.record(|j| j.content_reads += 1);

        let mut reads = self
            .reads_since_navigation
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *reads = reads.saturating_add(1);

        match self.render_after_polls {
            Some(polls) if *reads <= polls => Ok(BLANK_DOCUMENT.to_string()),
            _ => Ok(html.to_string()),
        }
    }

    fn current_url(&self) -> Option<String> {
        if self.closed {
            return None;
        }
        self.current.clone()
    }

    fn renders_asynchronously(&self) -> bool {
        self.render_after_polls.is_some()
    }

    async fn select_option(&mut self, selector: &str, choice: &OptionChoice) -> SessionResult<()> {
        let (url, html) = self.current_markup()?;
        check_option(html, selector, choice)?;
        let from = url.to_string();

        self.recorder.record(|j| {
            j.actions.push(format!("select {selector} {choice}"));
            j.selections.push(choice.clone());
        });

        match self.follow(Interaction::Select, &from, selector) {
            Some(target) => self.load(&target),
            None => Ok(()),
        }
    }

    async fn submit_text(&mut self, selector: &str, text: &str) -> SessionResult<()> {
        let (url, html) = self.current_markup()?;
        check_element(html, selector, false)?;
        let from = url.to_string();

        self.recorder.record(|j| {
            j.actions.push(format!("submit {selector}"));
            j.submitted_texts.push(text.to_string());
        });

        let target = self
            .follow(Interaction::Submit, &from, selector)
            .ok_or_else(|| SessionError::not_interactable(selector, "submission leads nowhere"))?;
        self.load(&target)
    }

    async fn click(&mut self, selector: &str) -> SessionResult<()> {
        let (url, html) = self.current_markup()?;
        check_element(html, selector, true)?;
        let from = url.to_string();

        self.recorder.record(|j| j.actions.push(format!("click {selector}")));

        let target = self
            .follow(Interaction::Click, &from, selector)
            .ok_or_else(|| SessionError::not_interactable(selector, "click leads nowhere"))?;
        self.load(&target)
    }

    async fn close(&mut self) -> SessionResult<()> {
        self.closed = true;
        self.recorder.record(|j| j.closed = true);
        Ok(())
    }
}

fn parse_selector(selector: &str) -> SessionResult<Selector> {
    Selector::parse(selector)
        .map_err(|e| SessionError::not_interactable(selector, format!("invalid selector: {e}")))
}

/// Clickable checks pass when any match is enabled; clicks land on the first enabled match
fn check_element(html: &str, selector: &str, clickable: bool) -> SessionResult<()> {
    let parsed = parse_selector(selector)?;
    let document = Html::parse_document(html);
    let mut matches = document.select(&parsed).peekable();

    if matches.peek().is_none() {
        return Err(SessionError::element_not_found(selector));
    }
    if clickable && !matches.any(|element| is_enabled(&element)) {
        return Err(SessionError::not_interactable(selector, "element is disabled"));
    }
    Ok(())
}

fn check_option(html: &str, selector: &str, choice: &OptionChoice) -> SessionResult<()> {
    let parsed = parse_selector(selector)?;
    let options = parse_selector("option")?;
    let document = Html::parse_document(html);
    let select = document
        .select(&parsed)
        .next()
        .ok_or_else(|| SessionError::element_not_found(selector))?;

    select
        .select(&options)
        .find(|o| choice.matches(&o.text().collect::<String>(), o.value().attr("value")))
        .map(|_| ())
        .ok_or_else(|| SessionError::element_not_found(format!("{selector} option {choice}")))
}
