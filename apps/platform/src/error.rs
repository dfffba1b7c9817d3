//! Error types for the platform list service

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Query(#[from] bfg_query::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Unknown entity type: {0}")]
    UnknownEntity(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Errors caused by the request itself; never retried
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::Query(_) | Error::UnknownEntity(_))
    }

    /// HTTP status a transport layer should answer with
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Query(_) => 400,
            Error::UnknownEntity(_) => 404,
            Error::Database(_) | Error::Config(_) | Error::Internal(_) | Error::Other(_) => 500,
        }
    }

    /// Message safe to show to API clients
    pub fn public_message(&self) -> String {
        if self.is_client_error() {
            self.to_string()
        } else {
            tracing::error!("Internal error: {}", self);
            "Internal server error".to_string()
        }
    }
}

impl From<config::ConfigError> for Error {
    fn from(e: config::ConfigError) -> Self {
        Error::Config(e.to_string())
    }
}
