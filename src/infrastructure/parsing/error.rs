//! Parsing error types for selector configuration and page parsing

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParsingError {
    #[error("Invalid CSS selector: {selector} - {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("No usable selector configured for {role}")]
    NoUsableSelector {
        role: String,
        rejected: Vec<String>,
    },
}

impl ParsingError {
    /// Create an invalid selector error
    pub fn invalid_selector(selector: &str, reason: impl ToString) -> Self {
        Self::InvalidSelector {
            selector: selector.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn no_usable_selector(role: impl Into<String>, rejected: Vec<String>) -> Self {
        Self::NoUsableSelector {
            role: role.into(),
            rejected,
        }
    }
}

pub type ParsingResult<T> = Result<T, ParsingError>;
