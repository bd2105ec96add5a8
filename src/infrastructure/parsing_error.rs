//! Parsing error types
//!
//! Extraction itself never fails: a field that cannot be found is simply
//! absent. These errors cover building the extractors (bad selectors or
//! patterns) and documents that cannot be read at all.

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ParsingError {
    #[error("Invalid CSS selector: {selector} - {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("Invalid extraction pattern '{rule}': {reason}")]
    InvalidPattern { rule: String, reason: String },

    #[error("Malformed {kind} document: {message}")]
    MalformedDocument { kind: &'static str, message: String },
}

impl ParsingError {
    pub fn invalid_selector(selector: &str, reason: impl ToString) -> Self {
        Self::InvalidSelector {
            selector: selector.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn invalid_pattern(rule: &str, reason: impl ToString) -> Self {
        Self::InvalidPattern {
            rule: rule.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn malformed(kind: &'static str, message: impl ToString) -> Self {
        Self::MalformedDocument {
            kind,
            message: message.to_string(),
        }
    }
}

pub type ParsingResult<T> = Result<T, ParsingError>;
