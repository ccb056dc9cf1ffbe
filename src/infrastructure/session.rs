//! Document session abstraction
//!
//! A `DocumentSession` is the exclusively-owned handle on one rendered
//! document: it can load a page, hand out a snapshot of the current markup
//! and perform the few interactions a search needs (pick a dropdown option,
//! type a query and submit, click a control). Element lookups are by CSS
//! selector; the semantic roles live one layer up in the locator resolver.

use async_trait::async_trait;
use thiserror::Error;

/// Failures raised by a document session
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Element not found: {selector}")]
    ElementNotFound { selector: String },

    #[error("Element '{selector}' is not interactable: {reason}")]
    NotInteractable { selector: String, reason: String },

    #[error("Timed out after {timeout_ms}ms waiting for {what}")]
    Timeout { what: String, timeout_ms: u64 },

    #[error("Navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("HTTP request failed: {status} - {url}")]
    Http { status: u16, url: String },

    #[error("No document loaded")]
    NoDocument,

    #[error("Session already closed")]
    Closed,
}

impl SessionError {
    pub fn element_not_found(selector: impl Into<String>) -> Self {
        Self::ElementNotFound {
            selector: selector.into(),
        }
    }

    pub fn not_interactable(selector: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::NotInteractable {
            selector: selector.into(),
            reason: reason.into(),
        }
    }

    pub fn navigation(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::Navigation {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Failures an optional step may swallow: the control was missing or
    /// unusable, or the page load it triggered failed. Sessions keep the
    /// previous document when a load fails.
    pub fn is_optional_step_failure(&self) -> bool {
        matches!(
            self,
            Self::ElementNotFound { .. }
                | Self::NotInteractable { .. }
                | Self::Timeout { .. }
                | Self::Http { .. }
                | Self::Navigation { .. }
        )
    }
}

pub type SessionResult<T> = Result<T, SessionError>;

/// How a dropdown option is picked
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionChoice {
    /// Match the option's trimmed visible text
    VisibleText(String),
    /// Match the option's `value` attribute
    Value(String),
}

impl OptionChoice {
    pub fn matches(&self, text: &str, value: Option<&str>) -> bool {
        match self {
            Self::VisibleText(wanted) => text.trim() == wanted,
            Self::Value(wanted) => value == Some(wanted.as_str()),
        }
    }
}

impl std::fmt::Display for OptionChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::VisibleText(text) => write!(f, "text '{text}'"),
            Self::Value(value) => write!(f, "value '{value}'"),
        }
    }
}

/// Capability to query and drive one rendered document
#[async_trait]
pub trait DocumentSession: Send + Sync {
    /// Load `url` as the current document
    async fn navigate(&mut self, url: &str) -> SessionResult<()>;

    /// Serialized markup of the current document
    async fn content(&self) -> SessionResult<String>;

    /// URL of the current document, used to resolve relative links
    fn current_url(&self) -> Option<String>;

    /// Whether the document may still change without an interaction.
    /// Static sessions are probed once instead of polled until a deadline.
    fn renders_asynchronously(&self) -> bool {
        true
    }

    /// Choose an option in the `<select>` matched by `selector`
    async fn select_option(&mut self, selector: &str, choice: &OptionChoice) -> SessionResult<()>;

    /// Type `text` into the input matched by `selector` and submit its form
    async fn submit_text(&mut self, selector: &str, text: &str) -> SessionResult<()>;

    /// Click the element matched by `selector`
    async fn click(&mut self, selector: &str) -> SessionResult<()>;

    /// Tear the session down; later calls fail with `SessionError::Closed`
    async fn close(&mut self) -> SessionResult<()>;
}
