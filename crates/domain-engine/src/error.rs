//! Error types for the filter parser.

use thiserror::Error;

/// A specialized Result type for filter parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Errors that can occur while tokenizing filter text or loading the parser
/// configuration.
///
/// Unknown fields and unconvertible values are never errors: they degrade to
/// a free-text clause or a null value.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    /// A quoted value was still open at the end of the input.
    #[error("no closing quotation (opened at position {position})")]
    NoClosingQuotation {
        /// Character offset of the opening quote.
        position: usize,
    },

    /// The input ended right after an escape character.
    #[error("no escaped character at position {position}")]
    NoEscapedCharacter {
        /// Character offset of the escape character.
        position: usize,
    },

    /// The parser configuration could not be loaded.
    #[error("invalid parser configuration: {message}")]
    InvalidConfig {
        /// What was wrong with the configuration.
        message: String,
    },
}

impl ParseError {
    /// Creates an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        ParseError::InvalidConfig {
            message: message.into(),
        }
    }

    /// Returns true if the parser can recover by retrying the input.
    ///
    /// Only an unterminated quote is recoverable: the parser appends the
    /// missing quote and tries once more.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ParseError::NoClosingQuotation { .. })
    }
}
