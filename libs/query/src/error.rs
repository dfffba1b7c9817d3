//! Error types for the query engine

use thiserror::Error;

use crate::sort::SortDirection;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while parsing or compiling a list query.
///
/// Every variant is a client error: a request either compiles completely or
/// fails before any storage access happens.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Syntax error: {message}")]
    Syntax { message: String, position: usize },

    #[error("Unsupported filter field: {0}")]
    UnsupportedField(String),

    #[error("Operator '{operator}' is not supported for field '{field}'")]
    UnsupportedOperator { field: String, operator: String },

    #[error("Invalid {kind} value for field '{field}': {value}")]
    InvalidValue {
        field: String,
        kind: String,
        value: String,
    },

    #[error("Invalid expand options for {entity}: {invalid:?}. Available options: {available:?}")]
    InvalidExpand {
        entity: String,
        invalid: Vec<String>,
        available: Vec<String>,
    },

    #[error("Conflicting sort directions for field '{field}': {first} and {second}")]
    ConflictingSort {
        field: String,
        first: SortDirection,
        second: SortDirection,
    },

    #[error("Duplicate sort for field: {0}")]
    DuplicateSort(String),

    #[error("Invalid order: {0}")]
    InvalidSort(String),

    #[error("Cannot sort by expanded field '{field}' without expanding '{relation}'")]
    UnexpandedSortField { field: String, relation: String },

    #[error("Invalid pagination: {0}")]
    InvalidPagination(String),

    #[error("Invalid facet field: {0}")]
    InvalidFacet(String),
}

impl Error {
    pub(crate) fn syntax(message: impl Into<String>, position: usize) -> Self {
        Error::Syntax {
            message: message.into(),
            position,
        }
    }

    pub(crate) fn invalid_value(field: &str, kind: &str, value: &str) -> Self {
        Error::InvalidValue {
            field: field.to_string(),
            kind: kind.to_string(),
            value: value.to_string(),
        }
    }

    /// Character offset of a syntax error in the raw filter string.
    pub fn position(&self) -> Option<usize> {
        match self {
            Error::Syntax { position, .. } => Some(*position),
            _ => None,
        }
    }
}
