//! Error types for the domain model.

use thiserror::Error;

/// A specialized Result type for domain model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors that can occur while decoding domains and values from the wire format.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ModelError {
    /// The nested-array structure is not a valid domain.
    #[error("invalid domain: {reason}")]
    InvalidDomain {
        /// Why the structure was rejected.
        reason: String,
    },

    /// A clause used an operator this engine does not know.
    #[error("unknown operator: {operator}")]
    UnknownOperator {
        /// The unrecognized operator text.
        operator: String,
    },

    /// A value could not be decoded from its wire representation.
    #[error("invalid value: {reason}")]
    InvalidValue {
        /// Why the value was rejected.
        reason: String,
    },
}

impl ModelError {
    /// Creates an invalid domain error.
    pub fn invalid_domain(reason: impl Into<String>) -> Self {
        ModelError::InvalidDomain {
            reason: reason.into(),
        }
    }

    /// Creates an unknown operator error.
    pub fn unknown_operator(operator: impl Into<String>) -> Self {
        ModelError::UnknownOperator {
            operator: operator.into(),
        }
    }

    /// Creates an invalid value error.
    pub fn invalid_value(reason: impl Into<String>) -> Self {
        ModelError::InvalidValue {
            reason: reason.into(),
        }
    }
}
