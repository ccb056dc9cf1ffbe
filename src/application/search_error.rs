//! Request-level search errors

use thiserror::Error;

use crate::domain::RequestValidationError;
use crate::infrastructure::parsing::ParsingError;
use crate::infrastructure::session::SessionError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SearchError {
    #[error("Invalid search request: {0}")]
    InvalidRequest(#[from] RequestValidationError),

    /// The search box was missing or the query could not be submitted
    #[error("Search failed: {source}")]
    SearchSubmissionFailed { source: SessionError },

    /// No result item showed up on the first results page
    #[error("No books found matching your search")]
    NoResultsFound,

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl SearchError {
    pub fn submission_failed(source: SessionError) -> Self {
        Self::SearchSubmissionFailed { source }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// "Nothing matched" rather than "something broke"
    pub fn is_empty_result(&self) -> bool {
        matches!(self, Self::NoResultsFound)
    }
}

impl From<ParsingError> for SearchError {
    fn from(e: ParsingError) -> Self {
        Self::Configuration(e.to_string())
    }
}

pub type SearchResult<T> = Result<T, SearchError>;
