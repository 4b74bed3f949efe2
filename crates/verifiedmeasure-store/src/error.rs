//! Error types for the data-service backends.

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur talking to the data service.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The auth provider rejected the session token.
    #[error("{0}")]
    Unauthorized(String),

    /// The data service answered with an error. The message is its own.
    #[error("{message}")]
    Upstream {
        /// HTTP status returned by the data service.
        status: u16,
        /// Error message, passed through verbatim.
        message: String,
        /// Backend error code (e.g. a Postgres SQLSTATE), if provided.
        code: Option<String>,
    },

    /// The request never produced a usable HTTP response.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body did not have the expected shape.
    #[error("unexpected response: {0}")]
    Decode(String),

    /// Backend misconfiguration.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl StoreError {
    /// Build an upstream error from a status and message.
    #[must_use]
    pub fn upstream(status: u16, message: impl Into<String>) -> Self {
        Self::Upstream {
            status,
            message: message.into(),
            code: None,
        }
    }
}
